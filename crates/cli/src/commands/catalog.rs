//! Catalog commands.

use std::path::Path;

use koosdoos_storefront::content::load_catalog;
use serde_json::json;

use super::{CommandError, print_json};

/// Load a catalog file, run the integrity checks and print a summary.
///
/// # Errors
///
/// Returns the load or validation error.
pub fn validate(path: &Path, json: bool) -> Result<(), CommandError> {
    let catalog = load_catalog(path)?;

    if json {
        let products: Vec<_> = catalog
            .products()
            .iter()
            .map(|p| {
                json!({
                    "id": p.id,
                    "title": p.title,
                    "variants": p.variants.iter().map(|v| json!({
                        "id": v.id,
                        "sku": v.sku,
                        "package_size": v.package_size(),
                        "inventory_qty": v.inventory_qty,
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();
        return print_json(&json!({ "valid": true, "products": products }));
    }

    println!("{} is valid", path.display());
    for product in catalog.products() {
        println!("  {} ({})", product.title, product.id);
        for variant in &product.variants {
            println!(
                "    {:<14} {:>8}  {:>3} in stock  {}",
                variant.sku,
                variant.unit_price().display(),
                variant.inventory_qty,
                variant.package_size()
            );
        }
    }
    Ok(())
}
