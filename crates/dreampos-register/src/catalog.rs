//! Loads the product catalog file named in the register config.

use std::path::Path;

use dreampos_core::Catalog;
use tracing::info;

use crate::config::RegisterConfig;
use crate::error::{RegisterError, RegisterResult};

/// Reads `[catalog] path`.
///
/// Fails with `CatalogNotConfigured` when no path is set, `CatalogLoadFailed`
/// when the file cannot be read, and `InvalidCatalog` when it does not parse
/// or breaks a catalog rule (duplicate ids, duplicate variation names).
pub fn load_catalog(config: &RegisterConfig) -> RegisterResult<Catalog> {
    let path = config
        .catalog
        .path
        .as_deref()
        .ok_or(RegisterError::CatalogNotConfigured)?;
    load_catalog_file(path)
}

pub fn load_catalog_file(path: &Path) -> RegisterResult<Catalog> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| RegisterError::CatalogLoadFailed(format!("{}: {}", path.display(), e)))?;
    let catalog = Catalog::from_json(&json)?;

    info!(?path, products = catalog.len(), "Catalog loaded");
    Ok(catalog)
}
