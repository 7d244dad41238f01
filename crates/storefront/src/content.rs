//! Catalog loading.
//!
//! The product catalog is a JSON file (an array of products) read once at
//! startup, checked for integrity, and shared read-only through `AppState`.

use std::path::Path;

use koosdoos_core::catalog::{Catalog, CatalogError};

/// Errors loading the catalog file.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid catalog: {0}")]
    Invalid(#[from] CatalogError),
}

/// Load and validate the catalog from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a valid catalog, or
/// breaks catalog invariants (duplicate IDs, empty products, bad prices).
pub fn load_catalog(path: &Path) -> Result<Catalog, ContentError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ContentError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_catalog(&raw)
}

/// Parse and validate catalog JSON.
///
/// # Errors
///
/// See [`load_catalog`].
pub fn parse_catalog(raw: &str) -> Result<Catalog, ContentError> {
    let catalog = Catalog::from_json(raw)?;
    catalog.validate()?;

    let variants: usize = catalog.products().iter().map(|p| p.variants.len()).sum();
    tracing::info!(
        products = catalog.products().len(),
        variants,
        "Loaded catalog"
    );
    Ok(catalog)
}
