//! Cart route handlers.
//!
//! Every request rebuilds a [`CartStore`] from the session snapshot, applies
//! one intent and writes the snapshot back. Requests of one session are
//! serialised by the session lock middleware, so no change is lost. Mutations answer with the cart
//! JSON and an `HX-Trigger: cart-updated` header so badges and drawers on the
//! page can refresh.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::State,
    response::AppendHeaders,
};
use koosdoos_core::cart::{CartAction, CartLine, CartState, CartStore};
use koosdoos_core::storage::MemoryStorage;
use koosdoos_core::types::{ProductId, VariantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::models::{load_storage, session_keys, store_storage};
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub slug: String,
    pub title: String,
    pub variant_name: String,
    pub sku: String,
    pub image: Option<String>,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub compare_at_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub line_total: Decimal,
    pub price: String,
    pub line_price: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        let line_total = line.line_total();
        Self {
            product_id: line.product.id.clone(),
            variant_id: line.variant.id.clone(),
            slug: line.product.slug.clone(),
            title: line.product.title.clone(),
            variant_name: line.variant.name.clone(),
            sku: line.variant.sku.clone(),
            image: line.product.image.clone(),
            quantity: line.quantity,
            unit_price: line.variant.price,
            compare_at_price: line.variant.compare_at_price,
            line_total,
            price: koosdoos_core::Price::zar(line.variant.price).display(),
            line_price: koosdoos_core::Price::zar(line_total).display(),
        }
    }
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    pub subtotal_display: String,
    pub item_count: u64,
    pub is_open: bool,
}

impl From<&CartState> for CartView {
    fn from(state: &CartState) -> Self {
        Self {
            lines: state.lines().iter().map(CartLineView::from).collect(),
            subtotal: state.subtotal(),
            subtotal_display: state.subtotal_price().display(),
            item_count: state.item_count(),
            is_open: state.is_open(),
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Rebuild the visitor's cart from the session.
pub(crate) async fn load_cart(state: &AppState, session: &Session) -> Result<CartStore<MemoryStorage>> {
    let storage = load_storage(session, session_keys::CART).await?;
    let mut cart = CartStore::new(state.catalog(), storage, state.config().cart);
    if session.get::<bool>(session_keys::CART_OPEN).await?.unwrap_or(false) {
        cart.open_cart();
    }
    Ok(cart)
}

/// Write the cart snapshot and drawer flag back to the session.
pub(crate) async fn save_cart(session: &Session, cart: &CartStore<MemoryStorage>) -> Result<()> {
    store_storage(session, cart.storage(), session_keys::CART).await?;
    session
        .insert(session_keys::CART_OPEN, cart.state().is_open())
        .await?;
    Ok(())
}

/// Cart JSON plus the `HX-Trigger` header.
pub type CartResponse = (AppendHeaders<[(&'static str, &'static str); 1]>, Json<CartView>);

/// Apply one intent and persist the result.
async fn apply(state: &AppState, session: &Session, action: CartAction) -> Result<CartResponse> {
    let mut cart = load_cart(state, session).await?;
    cart.dispatch(action)?;
    save_cart(session, &cart).await?;

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        Json(CartView::from(cart.state())),
    ))
}

/// Add to cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: Option<u32>,
}

/// Update quantity request.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub variant_id: VariantId,
    pub quantity: i64,
}

/// Remove from cart request.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub variant_id: VariantId,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Current cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&state, &session).await?;
    Ok(Json(CartView::from(cart.state())))
}

/// Add an item.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<AddToCartRequest>,
) -> Result<CartResponse> {
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("variant_id", body.variant_id.as_str())]),
    );
    apply(
        &state,
        &session,
        CartAction::AddItem {
            product_id: body.product_id,
            variant_id: body.variant_id,
            quantity: body.quantity.unwrap_or(1),
        },
    )
    .await
}

/// Set a line's quantity (zero or less removes it).
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<UpdateCartRequest>,
) -> Result<CartResponse> {
    apply(
        &state,
        &session,
        CartAction::UpdateQuantity {
            variant_id: body.variant_id,
            quantity: body.quantity,
        },
    )
    .await
}

/// Remove a line.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RemoveFromCartRequest>,
) -> Result<CartResponse> {
    apply(
        &state,
        &session,
        CartAction::RemoveItem {
            variant_id: body.variant_id,
        },
    )
    .await
}

/// Empty the cart.
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<CartResponse> {
    add_breadcrumb("cart", "Cleared cart", None);
    apply(&state, &session, CartAction::ClearCart).await
}

#[instrument(skip(state, session))]
pub async fn open(State(state): State<AppState>, session: Session) -> Result<CartResponse> {
    apply(&state, &session, CartAction::OpenCart).await
}

#[instrument(skip(state, session))]
pub async fn close(State(state): State<AppState>, session: Session) -> Result<CartResponse> {
    apply(&state, &session, CartAction::CloseCart).await
}

#[instrument(skip(state, session))]
pub async fn toggle(State(state): State<AppState>, session: Session) -> Result<CartResponse> {
    apply(&state, &session, CartAction::ToggleCart).await
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<CartCountTemplate> {
    let cart = load_cart(&state, &session).await?;
    Ok(CartCountTemplate {
        count: cart.state().item_count(),
    })
}
