pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod worker;

pub use config::{CompletionConfig, ServiceConfig};
pub use error::{LuasenseError, Result};
pub use worker::CompletionService;
