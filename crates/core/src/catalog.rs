use crate::error::Result;
use luasense_api::MemoryCatalog;
use std::path::Path;
use tracing::{info, warn};

/// Reads a JSON catalog file.
pub fn load_catalog(path: &Path) -> Result<MemoryCatalog> {
    let raw = std::fs::read_to_string(path)?;
    let catalog = MemoryCatalog::from_json_str(&raw)?;
    if catalog.is_empty() {
        warn!("Catalog at {} defines no classes", path.display());
    } else {
        info!("Loaded {} catalog classes from {}", catalog.len(), path.display());
    }
    Ok(catalog)
}

/// Like [`load_catalog`], but an absent path yields an empty catalog.
pub fn load_catalog_or_empty(path: Option<&Path>) -> Result<MemoryCatalog> {
    match path {
        Some(path) => load_catalog(path),
        None => {
            warn!("No catalog configured; only local variables will complete");
            Ok(MemoryCatalog::new())
        }
    }
}
