//! Checkout hand-off.
//!
//! A checkout combines the cart lines, a validated shipping address and the
//! selected shipping quote into a [`CheckoutRequest`] for the payment
//! gateway. The gateway answers with a hosted payment page URL and the form
//! fields to post to it; [`PaymentHandoff`] releases that form exactly once.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::address::{AddressDraft, FieldErrors, ShippingAddress, sanitize_postal_code, validate};
use crate::cart::{CartLine, CartState};
use crate::catalog::Catalog;
use crate::shipping::ShippingQuote;
use crate::types::{Email, OrderId, ProductId, VariantId};

/// Reasons a checkout cannot be handed to the payment gateway.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("customer name is required")]
    MissingCustomerName,
    #[error("shipping address is incomplete")]
    InvalidAddress(FieldErrors),
    #[error("no shipping option selected")]
    NoShippingSelected,
    /// One or more lines exceed available stock or left the catalog.
    #[error("{}", .0.iter().map(|i| i.message.as_str()).collect::<Vec<_>>().join("; "))]
    Inventory(Vec<InventoryIssue>),
}

/// A cart line that cannot be fulfilled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryIssue {
    pub variant_id: VariantId,
    pub message: String,
}

/// Buyer contact details sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// One cart line as the gateway expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub sku: String,
    pub title: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

impl From<&CartLine> for CheckoutLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product.id.clone(),
            variant_id: line.variant.id.clone(),
            sku: line.variant.sku.clone(),
            title: format!("{} - {}", line.product.title, line.variant.name),
            quantity: line.quantity,
            unit_price: line.variant.price,
        }
    }
}

/// Body of the gateway's checkout call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub cart_lines: Vec<CheckoutLine>,
    pub customer: CustomerDetails,
    pub shipping_address: ShippingAddress,
    pub selected_shipping_quote: ShippingQuote,
}

impl CheckoutRequest {
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.cart_lines
            .iter()
            .map(|l| l.unit_price * Decimal::from(l.quantity))
            .sum()
    }

    /// Subtotal plus shipping.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.subtotal() + self.selected_shipping_quote.price
    }
}

/// Check every line against current stock.
///
/// The cart never clamps quantities; this is where inventory is enforced.
///
/// # Errors
///
/// Returns [`CheckoutError::Inventory`] listing every failing line.
pub fn validate_inventory(lines: &[CartLine], catalog: &Catalog) -> Result<(), CheckoutError> {
    let issues: Vec<InventoryIssue> = lines
        .iter()
        .filter_map(|line| {
            let label = format!("{} ({})", line.product.title, line.variant.sku);
            let message = match catalog.resolve(&line.product.id, &line.variant.id) {
                None => format!("{label}: No longer available"),
                Some((_, variant)) if line.quantity > variant.inventory_qty => format!(
                    "{label}: Only {} available, {} requested",
                    variant.inventory_qty, line.quantity
                ),
                Some(_) => return None,
            };
            Some(InventoryIssue {
                variant_id: line.variant.id.clone(),
                message,
            })
        })
        .collect();

    if issues.is_empty() {
        Ok(())
    } else {
        Err(CheckoutError::Inventory(issues))
    }
}

/// Everything the buyer entered on the checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDraft {
    pub customer: CustomerDetails,
    pub address: AddressDraft,
    pub selected_quote: Option<ShippingQuote>,
}

impl CheckoutDraft {
    /// Gate the hand-off and build the gateway request.
    ///
    /// Checks, in order: the cart has lines, the customer has a name, the
    /// address validates, a shipping quote is selected, and every line is in
    /// stock.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`CheckoutError`].
    pub fn prepare(&self, cart: &CartState, catalog: &Catalog) -> Result<CheckoutRequest, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if self.customer.first_name.trim().is_empty() || self.customer.last_name.trim().is_empty() {
            return Err(CheckoutError::MissingCustomerName);
        }
        let address = AddressDraft {
            postal_code: sanitize_postal_code(&self.address.postal_code),
            ..self.address.clone()
        };
        let shipping_address = validate(&address).map_err(CheckoutError::InvalidAddress)?;
        let quote = self
            .selected_quote
            .clone()
            .ok_or(CheckoutError::NoShippingSelected)?;
        validate_inventory(cart.lines(), catalog)?;

        Ok(CheckoutRequest {
            cart_lines: cart.lines().iter().map(CheckoutLine::from).collect(),
            customer: CustomerDetails {
                first_name: self.customer.first_name.trim().to_string(),
                last_name: self.customer.last_name.trim().to_string(),
                ..self.customer.clone()
            },
            shipping_address,
            selected_shipping_quote: quote,
        })
    }
}

/// Name/value pair posted to the hosted payment page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

/// Gateway answer to a checkout call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffResponse {
    pub order_id: OrderId,
    #[serde(alias = "payfast_url")]
    pub payment_url: String,
    pub form_fields: Vec<FormField>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// The auto-submitting form rendered for the buyer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectForm {
    pub action: String,
    pub fields: Vec<FormField>,
}

/// A pending hand-off that can be submitted once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentHandoff {
    response: HandoffResponse,
    submitted: bool,
}

impl PaymentHandoff {
    #[must_use]
    pub const fn new(response: HandoffResponse) -> Self {
        Self {
            response,
            submitted: false,
        }
    }

    #[must_use]
    pub const fn order_id(&self) -> &OrderId {
        &self.response.order_id
    }

    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.response.total
    }

    #[must_use]
    pub const fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Take the redirect form. Returns `None` on every call after the first.
    pub fn submit(&mut self) -> Option<RedirectForm> {
        if self.submitted {
            return None;
        }
        self.submitted = true;
        Some(RedirectForm {
            action: self.response.payment_url.clone(),
            fields: self.response.form_fields.clone(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cart::{CartOptions, CartStore};
    use crate::catalog::tests::fixture;
    use crate::shipping::ServiceType;
    use crate::storage::MemoryStorage;

    fn customer() -> CustomerDetails {
        CustomerDetails {
            email: Email::parse("thabo@example.co.za").unwrap(),
            first_name: " Thabo ".to_string(),
            last_name: "Nkosi".to_string(),
            phone: None,
        }
    }

    fn address() -> AddressDraft {
        AddressDraft {
            street: "12 Main Rd".into(),
            suburb: "Greenside".into(),
            city: "Johannesburg".into(),
            province: "Gauteng".into(),
            postal_code: "2193".into(),
        }
    }

    fn standard() -> ShippingQuote {
        ShippingQuote {
            service_type: ServiceType::Standard,
            service_name: "Standard Delivery".into(),
            price: Decimal::new(215, 0),
            estimated_days: 2,
        }
    }

    fn draft() -> CheckoutDraft {
        CheckoutDraft {
            customer: customer(),
            address: address(),
            selected_quote: Some(standard()),
        }
    }

    fn cart_with(items: &[(&str, &str, u32)]) -> CartStore<MemoryStorage> {
        let mut cart = CartStore::new(Arc::new(fixture()), MemoryStorage::new(), CartOptions::default());
        for (product, variant, qty) in items {
            cart.add_item(&(*product).into(), &(*variant).into(), *qty).unwrap();
        }
        cart
    }

    #[test]
    fn test_prepare_builds_gateway_request() {
        let cart = cart_with(&[("1", "v1", 2)]);
        let request = draft().prepare(cart.state(), &fixture()).unwrap();

        assert_eq!(request.cart_lines.len(), 1);
        assert_eq!(request.cart_lines[0].title, "KoosDoos Small - Small");
        assert_eq!(request.customer.first_name, "Thabo");
        assert_eq!(request.shipping_address.country, "ZA");
        assert_eq!(request.total(), Decimal::new(1299 * 2 + 215, 0));

        let json = serde_json::to_value(&request).unwrap();
        assert!(json["cart_lines"][0]["unit_price"].is_number());
        assert_eq!(json["selected_shipping_quote"]["service_type"], "standard");
    }

    #[test]
    fn test_prepare_cleans_postal_code_like_the_form() {
        let cart = cart_with(&[("1", "v1", 1)]);
        let mut draft = draft();
        draft.address.postal_code = "21-93".into();

        let request = draft.prepare(cart.state(), &fixture()).unwrap();
        assert_eq!(request.shipping_address.postal_code, "2193");

        draft.address.postal_code = "21a".into();
        assert!(matches!(
            draft.prepare(cart.state(), &fixture()),
            Err(CheckoutError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_prepare_gates_in_order() {
        let catalog = fixture();
        let empty = cart_with(&[]);
        assert_eq!(draft().prepare(empty.state(), &catalog), Err(CheckoutError::EmptyCart));

        let cart = cart_with(&[("1", "v1", 1)]);
        let mut bad_address = draft();
        bad_address.address.postal_code = "219".into();
        assert!(matches!(
            bad_address.prepare(cart.state(), &catalog),
            Err(CheckoutError::InvalidAddress(_))
        ));

        let mut no_quote = draft();
        no_quote.selected_quote = None;
        assert_eq!(
            no_quote.prepare(cart.state(), &catalog),
            Err(CheckoutError::NoShippingSelected)
        );
    }

    #[test]
    fn test_inventory_overrun_rejects_handoff() {
        let cart = cart_with(&[("5", "v7", 3), ("1", "v1", 1)]);
        let err = draft().prepare(cart.state(), &fixture()).unwrap_err();

        let CheckoutError::Inventory(issues) = err else {
            panic!("expected inventory error");
        };
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].message,
            "KoosDoos Personalised (KDS-PERS-XL): Only 2 available, 3 requested"
        );
    }

    #[test]
    fn test_inventory_reports_removed_products() {
        let cart = cart_with(&[("2", "v2", 1)]);
        let shrunk = Catalog::new(vec![fixture().products()[0].clone()]);
        let err = validate_inventory(cart.state().lines(), &shrunk).unwrap_err();
        assert_eq!(err.to_string(), "KoosDoos Medium (KDS-MD): No longer available");
    }

    #[test]
    fn test_handoff_submits_once() {
        let response: HandoffResponse = serde_json::from_str(
            r#"{
                "order_id": "KD-1001",
                "payfast_url": "https://sandbox.payfast.co.za/eng/process",
                "form_fields": [{"name": "merchant_id", "value": "10000100"}],
                "total": 2813.0
            }"#,
        )
        .unwrap();
        let mut handoff = PaymentHandoff::new(response);

        let form = handoff.submit().unwrap();
        assert_eq!(form.action, "https://sandbox.payfast.co.za/eng/process");
        assert_eq!(form.fields[0].name, "merchant_id");
        assert!(handoff.is_submitted());
        assert!(handoff.submit().is_none());
        assert_eq!(handoff.total(), Decimal::new(2813, 0));
    }
}
