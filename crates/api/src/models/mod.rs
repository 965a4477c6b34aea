pub mod document;
pub mod event;
pub mod request;
pub mod resolution;
pub mod variable;

pub use document::*;
pub use event::*;
pub use request::*;
pub use resolution::*;
pub use variable::*;
