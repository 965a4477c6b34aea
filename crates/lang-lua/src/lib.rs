//! Heuristic Lua analysis for completion.
//!
//! No grammar, no AST: the buffer is usually half-typed and invalid. Instead
//! a literal-aware [`lexer`] feeds three small analyses:
//!
//! ```text
//! VariableTableBuilder  →  VariableTable (per document, rebuilt wholesale)
//! segment               →  innermost segment + enclosing call
//! chain                 →  a:b():c walked against table + Catalog
//!                               │
//!                               ▼
//!                    Resolver → ResolutionResult
//! ```
//!
//! [`params`] turns a resolved call site into a parameter highlight and
//! [`matching`] builds the candidate lists shown in menus.

pub mod chain;
pub mod error;
pub mod lexer;
pub mod matching;
pub mod params;
pub mod resolver;
pub mod segment;
pub mod symbols;
pub mod types;

pub use error::{ResolveError, Result};
pub use resolver::{DEFAULT_MIN_REST_TYPED_LEN, Resolver, resolve};
pub use symbols::{BuildStats, MAX_INFERENCE_PASSES, VariableTable, VariableTableBuilder};
