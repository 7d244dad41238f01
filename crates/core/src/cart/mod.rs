//! Shopping cart store.
//!
//! [`CartStore`] owns the cart for one buyer. UI layers send intents (either
//! by calling the methods directly or through [`CartStore::dispatch`]); the
//! store applies them synchronously, persists the lines through a
//! [`KeyValueStore`], and notifies subscribers with the new state.
//!
//! Totals are never stored. [`CartState::subtotal`] and
//! [`CartState::item_count`] are computed from the lines on every read.

mod persist;

use core::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{Catalog, Product, Variant};
use crate::shipping::PackageSize;
use crate::storage::KeyValueStore;
use crate::types::{Price, ProductId, VariantId};

pub use persist::{CART_STORAGE_KEY, PersistedLine};

/// Errors returned by cart intents.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The product/variant pair is not in the catalog.
    #[error("product {product_id} has no variant {variant_id}")]
    UnknownVariant {
        product_id: ProductId,
        variant_id: VariantId,
    },
}

/// Product fields a cart line displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    pub image: Option<String>,
}

/// Variant fields a cart line prices and validates with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRef {
    pub id: VariantId,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub inventory_qty: u32,
}

/// One (variant, quantity) entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: ProductRef,
    pub variant: VariantRef,
    pub quantity: u32,
}

impl CartLine {
    fn new(product: &Product, variant: &Variant, quantity: u32) -> Self {
        Self {
            product: ProductRef {
                id: product.id.clone(),
                title: product.title.clone(),
                slug: product.slug.clone(),
                image: product.primary_image().map(|img| img.url.clone()),
            },
            variant: VariantRef {
                id: variant.id.clone(),
                name: variant.name.clone(),
                sku: variant.sku.clone(),
                price: variant.price,
                compare_at_price: variant.compare_at_price,
                inventory_qty: variant.inventory_qty,
            },
            quantity,
        }
    }

    /// Unit price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.variant.price * Decimal::from(self.quantity)
    }

    #[must_use]
    pub fn package_size(&self) -> PackageSize {
        PackageSize::from_sku(&self.variant.sku)
    }
}

/// Cart lines plus the drawer flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    lines: Vec<CartLine>,
    is_open: bool,
}

impl CartState {
    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line for `variant_id`, if present.
    #[must_use]
    pub fn line(&self, variant_id: &VariantId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.variant.id == variant_id)
    }

    /// Σ unit price × quantity.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Subtotal as a displayable [`Price`].
    #[must_use]
    pub fn subtotal_price(&self) -> Price {
        Price::zar(self.subtotal())
    }

    /// Σ quantity.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// The largest package size among the lines, used as the shipping
    /// profile for the whole order.
    #[must_use]
    pub fn package_size(&self) -> Option<PackageSize> {
        self.lines.iter().map(CartLine::package_size).max()
    }
}

/// Store behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartOptions {
    /// Open the drawer after an item is added.
    pub open_on_add: bool,
}

impl Default for CartOptions {
    fn default() -> Self {
        Self { open_on_add: true }
    }
}

/// Cart intents as messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartAction {
    AddItem {
        product_id: ProductId,
        variant_id: VariantId,
        #[serde(default = "default_quantity")]
        quantity: u32,
    },
    RemoveItem {
        variant_id: VariantId,
    },
    UpdateQuantity {
        variant_id: VariantId,
        quantity: i64,
    },
    Increment {
        variant_id: VariantId,
    },
    Decrement {
        variant_id: VariantId,
    },
    ToggleCart,
    OpenCart,
    CloseCart,
    ClearCart,
}

const fn default_quantity() -> u32 {
    1
}

/// Handle returned by [`CartStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&CartState) + Send + Sync>;

/// The cart store.
pub struct CartStore<S: KeyValueStore> {
    catalog: Arc<Catalog>,
    storage: S,
    options: CartOptions,
    state: CartState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<S: KeyValueStore> fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("options", &self.options)
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStore> CartStore<S> {
    /// Create a store, rehydrating lines from `storage`.
    ///
    /// A missing or unreadable snapshot starts an empty cart. The drawer
    /// always starts closed.
    pub fn new(catalog: Arc<Catalog>, storage: S, options: CartOptions) -> Self {
        let lines = storage
            .get(CART_STORAGE_KEY)
            .map(|raw| persist::decode(&raw, &catalog))
            .unwrap_or_default();

        Self {
            catalog,
            storage,
            options,
            state: CartState {
                lines,
                is_open: false,
            },
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Consume the store and return its storage.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Register a listener called with the new state after every change.
    pub fn subscribe(&mut self, listener: impl FnMut(&CartState) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Unknown IDs are ignored.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(sub, _)| *sub != id);
    }

    /// Add `quantity` of a variant (zero counts as one).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownVariant`] without changing state if the
    /// product/variant pair is not in the catalog.
    pub fn add_item(
        &mut self,
        product_id: &ProductId,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<(), CartError> {
        let quantity = quantity.max(1);
        let Some((product, variant)) = self.catalog.resolve(product_id, variant_id) else {
            warn!(%product_id, %variant_id, "add to cart for unknown variant");
            return Err(CartError::UnknownVariant {
                product_id: product_id.clone(),
                variant_id: variant_id.clone(),
            });
        };

        match self.state.lines.iter_mut().find(|l| &l.variant.id == variant_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.state.lines.push(CartLine::new(product, variant, quantity)),
        }
        debug!(%variant_id, quantity, "added to cart");

        if self.options.open_on_add {
            self.state.is_open = true;
        }
        self.persist();
        self.notify();
        Ok(())
    }

    /// Remove a variant's line. Removing an absent line does nothing.
    pub fn remove_item(&mut self, variant_id: &VariantId) {
        let before = self.state.lines.len();
        self.state.lines.retain(|l| &l.variant.id != variant_id);
        if self.state.lines.len() != before {
            self.persist();
            self.notify();
        }
    }

    /// Set a line's quantity. Zero or negative removes the line; unknown
    /// variants are ignored.
    pub fn update_quantity(&mut self, variant_id: &VariantId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(variant_id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let Some(line) = self.state.lines.iter_mut().find(|l| &l.variant.id == variant_id) else {
            return;
        };
        if line.quantity != quantity {
            line.quantity = quantity;
            self.persist();
            self.notify();
        }
    }

    /// Raise a line's quantity by one.
    pub fn increment(&mut self, variant_id: &VariantId) {
        if let Some(current) = self.state.line(variant_id).map(|l| l.quantity) {
            self.update_quantity(variant_id, i64::from(current) + 1);
        }
    }

    /// Lower a line's quantity by one, removing it at zero.
    pub fn decrement(&mut self, variant_id: &VariantId) {
        if let Some(current) = self.state.line(variant_id).map(|l| l.quantity) {
            self.update_quantity(variant_id, i64::from(current) - 1);
        }
    }

    pub fn toggle_cart(&mut self) {
        self.set_open(!self.state.is_open);
    }

    pub fn open_cart(&mut self) {
        self.set_open(true);
    }

    pub fn close_cart(&mut self) {
        self.set_open(false);
    }

    fn set_open(&mut self, open: bool) {
        if self.state.is_open != open {
            self.state.is_open = open;
            self.notify();
        }
    }

    /// Remove every line.
    pub fn clear_cart(&mut self) {
        if !self.state.lines.is_empty() {
            self.state.lines.clear();
            self.persist();
            self.notify();
        }
    }

    /// Apply an intent message.
    ///
    /// # Errors
    ///
    /// Propagates [`CartError`] from [`Self::add_item`].
    pub fn dispatch(&mut self, action: CartAction) -> Result<(), CartError> {
        match action {
            CartAction::AddItem {
                product_id,
                variant_id,
                quantity,
            } => return self.add_item(&product_id, &variant_id, quantity),
            CartAction::RemoveItem { variant_id } => self.remove_item(&variant_id),
            CartAction::UpdateQuantity { variant_id, quantity } => {
                self.update_quantity(&variant_id, quantity);
            }
            CartAction::Increment { variant_id } => self.increment(&variant_id),
            CartAction::Decrement { variant_id } => self.decrement(&variant_id),
            CartAction::ToggleCart => self.toggle_cart(),
            CartAction::OpenCart => self.open_cart(),
            CartAction::CloseCart => self.close_cart(),
            CartAction::ClearCart => self.clear_cart(),
        }
        Ok(())
    }

    fn persist(&mut self) {
        let encoded = match persist::encode(&self.state.lines) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, "failed to encode cart snapshot");
                return;
            }
        };
        if let Err(e) = self.storage.set(CART_STORAGE_KEY, encoded) {
            warn!(error = %e, "failed to persist cart");
        }
    }

    fn notify(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }
}
