use luasense_api::models::Notification;
use luasense_core::{CompletionService, Result, ServiceConfig};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Bootstraps a completion service from a configuration.
///
/// Loads the configured catalog (an empty one if none is set) and wires it
/// into a fresh [`CompletionService`]. Must run inside a tokio runtime.
pub fn build_default_service(
    config: &ServiceConfig,
) -> Result<(CompletionService, UnboundedReceiver<Notification>)> {
    let catalog = luasense_core::catalog::load_catalog_or_empty(config.catalog_path.as_deref())?;
    tracing::info!(
        "Completion service ready ({} catalog classes, teleport distance {})",
        catalog.len(),
        config.completion.teleport_distance
    );
    Ok(CompletionService::new(
        Arc::new(catalog),
        config.completion.clone(),
    ))
}

/// Reads `path` as a [`ServiceConfig`], or returns the defaults when absent.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    match path {
        Some(path) => ServiceConfig::load(path),
        None => Ok(ServiceConfig::default()),
    }
}

/// Initializes the logging system for a specific component.
/// This delegates to the core logging module.
pub fn init_logging(component: &str, to_stderr: bool) -> tracing_appender::non_blocking::WorkerGuard {
    luasense_core::logging::init_logging(component, to_stderr)
}
