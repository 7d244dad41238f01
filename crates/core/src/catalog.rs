//! Product catalog.
//!
//! The catalog is the in-memory source the cart resolves product and variant
//! references against. It is loaded once (the storefront reads it from a JSON
//! file) and shared read-only.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shipping::PackageSize;
use crate::types::{Price, ProductId, VariantId};

/// Errors detected while checking a catalog's integrity.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Two products share an ID.
    #[error("duplicate product id: {0}")]
    DuplicateProduct(ProductId),
    /// Two variants (possibly on different products) share an ID.
    #[error("duplicate variant id: {0}")]
    DuplicateVariant(VariantId),
    /// A product has no purchasable variants.
    #[error("product {0} has no variants")]
    NoVariants(ProductId),
    /// A variant has a zero or negative price.
    #[error("variant {0} has a non-positive price")]
    InvalidPrice(VariantId),
}

/// Marketing badge shown on product cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Badge {
    New,
    Sale,
    BestSeller,
    Limited,
}

/// Product image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: String,
    pub url: String,
    pub alt: String,
    #[serde(default)]
    pub sort_order: u32,
}

/// A purchasable SKU of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub sku: String,
    /// Display name, e.g. "Large (Personalised)".
    pub name: String,
    /// Unit price in rand.
    pub price: Decimal,
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    pub inventory_qty: u32,
    /// Shipping weight in kilograms.
    #[serde(default)]
    pub weight_kg: Decimal,
}

impl Variant {
    /// Unit price as a displayable [`Price`].
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::zar(self.price)
    }

    /// Whether the variant is discounted against its compare-at price.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.compare_at_price.is_some_and(|cmp| cmp > self.price)
    }

    /// Flat-pack size class used for shipping estimates.
    #[must_use]
    pub fn package_size(&self) -> PackageSize {
        PackageSize::from_sku(&self.sku)
    }
}

/// A product with its variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub badges: Vec<Badge>,
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

impl Product {
    /// First image by sort order, used as the cart thumbnail.
    #[must_use]
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images.iter().min_by_key(|img| img.sort_order)
    }

    /// Look up a variant of this product.
    #[must_use]
    pub fn variant(&self, variant_id: &VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| &v.id == variant_id)
    }
}

/// The full product catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog from a list of products.
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Parse a catalog from its JSON representation (an array of products).
    ///
    /// # Errors
    ///
    /// Returns a `serde_json` error if the payload is not a valid catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// All products in catalog order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by ID.
    #[must_use]
    pub fn product(&self, product_id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == product_id)
    }

    /// Look up a product by its URL slug.
    #[must_use]
    pub fn product_by_slug(&self, slug: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.slug == slug)
    }

    /// Resolve a product/variant pair.
    ///
    /// Returns `None` if the product is unknown or the variant does not belong
    /// to it.
    #[must_use]
    pub fn resolve(
        &self,
        product_id: &ProductId,
        variant_id: &VariantId,
    ) -> Option<(&Product, &Variant)> {
        let product = self.product(product_id)?;
        let variant = product.variant(variant_id)?;
        Some((product, variant))
    }

    /// Check structural invariants: unique IDs, at least one variant per
    /// product, positive prices.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut product_ids = std::collections::HashSet::new();
        let mut variant_ids = std::collections::HashSet::new();

        for product in &self.products {
            if !product_ids.insert(&product.id) {
                return Err(CatalogError::DuplicateProduct(product.id.clone()));
            }
            if product.variants.is_empty() {
                return Err(CatalogError::NoVariants(product.id.clone()));
            }
            for variant in &product.variants {
                if !variant_ids.insert(&variant.id) {
                    return Err(CatalogError::DuplicateVariant(variant.id.clone()));
                }
                if variant.price <= Decimal::ZERO {
                    return Err(CatalogError::InvalidPrice(variant.id.clone()));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Small catalog mirroring the live fire-pit range.
    pub(crate) fn fixture() -> Catalog {
        let variant = |id: &str, sku: &str, name: &str, price: i64, qty: u32| Variant {
            id: VariantId::new(id),
            sku: sku.to_string(),
            name: name.to_string(),
            price: Decimal::new(price, 0),
            compare_at_price: None,
            inventory_qty: qty,
            weight_kg: Decimal::new(15, 0),
        };

        Catalog::new(vec![
            Product {
                id: ProductId::new("1"),
                slug: "koosdoos-small".to_string(),
                title: "KoosDoos Small".to_string(),
                subtitle: None,
                badges: vec![Badge::New],
                variants: vec![variant("v1", "KDS-SM", "Small", 1299, 25)],
                images: vec![ProductImage {
                    id: "img1".to_string(),
                    url: "/images/products/elephant-fire-1.jpg".to_string(),
                    alt: "KoosDoos Small".to_string(),
                    sort_order: 1,
                }],
            },
            Product {
                id: ProductId::new("2"),
                slug: "koosdoos-medium".to_string(),
                title: "KoosDoos Medium".to_string(),
                subtitle: None,
                badges: vec![Badge::BestSeller],
                variants: vec![Variant {
                    compare_at_price: Some(Decimal::new(2299, 0)),
                    ..variant("v2", "KDS-MD", "Medium", 1999, 18)
                }],
                images: Vec::new(),
            },
            Product {
                id: ProductId::new("5"),
                slug: "koosdoos-personalised".to_string(),
                title: "KoosDoos Personalised".to_string(),
                subtitle: None,
                badges: Vec::new(),
                variants: vec![
                    variant("v5", "KDS-PERS-MD", "Medium (Personalised)", 2999, 99),
                    variant("v7", "KDS-PERS-XL", "XL (Personalised)", 4999, 2),
                ],
                images: Vec::new(),
            },
        ])
    }

    #[test]
    fn test_resolve_requires_matching_product() {
        let catalog = fixture();
        assert!(catalog.resolve(&"1".into(), &"v1".into()).is_some());
        assert!(catalog.resolve(&"2".into(), &"v1".into()).is_none());
        assert!(catalog.resolve(&"9".into(), &"v1".into()).is_none());
    }

    #[test]
    fn test_validate_accepts_fixture() {
        assert_eq!(fixture().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_duplicate_variant() {
        let mut catalog = fixture();
        let dup = catalog.products[0].variants[0].clone();
        catalog.products[1].variants.push(dup);
        assert_eq!(
            catalog.validate(),
            Err(CatalogError::DuplicateVariant("v1".into()))
        );
    }

    #[test]
    fn test_sale_and_package_size() {
        let catalog = fixture();
        let (_, medium) = catalog.resolve(&"2".into(), &"v2".into()).unwrap();
        assert!(medium.is_on_sale());
        assert_eq!(medium.package_size(), PackageSize::Medium);
        let (_, xl) = catalog.resolve(&"5".into(), &"v7".into()).unwrap();
        assert_eq!(xl.package_size(), PackageSize::Xl);
    }

    #[test]
    fn test_from_json() {
        let json = r#"[{
            "id": "1", "slug": "koosdoos-small", "title": "KoosDoos Small",
            "badges": ["best-seller"],
            "variants": [{"id": "v1", "sku": "KDS-SM", "name": "Small", "price": 1299, "inventory_qty": 25}]
        }]"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.products().len(), 1);
        assert_eq!(catalog.products()[0].badges, vec![Badge::BestSeller]);
        assert_eq!(
            catalog.product_by_slug("koosdoos-small").map(|p| p.title.as_str()),
            Some("KoosDoos Small")
        );
    }
}
