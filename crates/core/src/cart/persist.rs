//! Cart snapshot format.
//!
//! Only the line identities and quantities are stored; titles, prices and
//! inventory are re-resolved from the catalog on load so a stale snapshot
//! never resurrects an old price.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::CartLine;
use crate::catalog::Catalog;
use crate::types::{ProductId, VariantId};

/// Storage key of the cart snapshot.
pub const CART_STORAGE_KEY: &str = "koosdoos-cart";

/// One stored cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLine {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: i64,
}

impl From<&CartLine> for PersistedLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product.id.clone(),
            variant_id: line.variant.id.clone(),
            quantity: i64::from(line.quantity),
        }
    }
}

/// Serialize lines to the snapshot JSON.
///
/// # Errors
///
/// Returns a `serde_json` error if serialization fails.
pub fn encode(lines: &[CartLine]) -> Result<String, serde_json::Error> {
    let persisted: Vec<PersistedLine> = lines.iter().map(PersistedLine::from).collect();
    serde_json::to_string(&persisted)
}

/// Rebuild cart lines from a snapshot.
///
/// Never fails: a payload that is not a JSON array yields no lines, and
/// entries that are malformed, have a non-positive quantity or no longer
/// resolve in `catalog` are skipped. Repeated variants are merged.
#[must_use]
pub fn decode(raw: &str, catalog: &Catalog) -> Vec<CartLine> {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "discarding unreadable cart snapshot");
            return Vec::new();
        }
    };

    let mut lines: Vec<CartLine> = Vec::with_capacity(entries.len());
    for entry in entries {
        let Ok(persisted) = serde_json::from_value::<PersistedLine>(entry) else {
            debug!("skipping malformed cart snapshot entry");
            continue;
        };
        let Ok(quantity) = u32::try_from(persisted.quantity) else {
            debug!(variant_id = %persisted.variant_id, "skipping cart entry with invalid quantity");
            continue;
        };
        if quantity == 0 {
            continue;
        }
        let Some((product, variant)) = catalog.resolve(&persisted.product_id, &persisted.variant_id) else {
            debug!(
                product_id = %persisted.product_id,
                variant_id = %persisted.variant_id,
                "skipping cart entry no longer in catalog"
            );
            continue;
        };

        match lines.iter_mut().find(|l| l.variant.id == variant.id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
            None => lines.push(CartLine::new(product, variant, quantity)),
        }
    }

    lines
}
