//! Per-document variable tables and the heuristic builder that fills them.

pub mod builder;
pub mod table;

pub use builder::{BuildStats, MAX_INFERENCE_PASSES, VariableTableBuilder};
pub use table::VariableTable;
