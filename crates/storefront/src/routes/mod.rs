//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Cart (JSON, mutations send HX-Trigger: cart-updated)
//! GET  /cart                   - Cart lines and totals
//! POST /cart/add               - Add to cart
//! POST /cart/update            - Set quantity (<= 0 removes)
//! POST /cart/remove            - Remove line
//! POST /cart/clear             - Empty the cart
//! POST /cart/open              - Open drawer
//! POST /cart/close             - Close drawer
//! POST /cart/toggle            - Toggle drawer
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Shipping
//! POST /shipping/quote         - Quotes for a province (courier, else fallback table)
//! POST /shipping/select        - Pick one of the last quotes
//!
//! # Checkout
//! POST /checkout               - Create payment hand-off, 303 to /checkout/redirect
//! POST /checkout/address       - Address validity report
//! GET  /checkout/redirect      - Auto-submitting payment form (once)
//!
//! # Consent
//! GET  /api/consent            - Stored cookie consent or null
//! POST /api/consent            - Record cookie consent
//! ```

pub mod cart;
pub mod checkout;
pub mod consent;
pub mod shipping;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/open", post(cart::open))
        .route("/close", post(cart::close))
        .route("/toggle", post(cart::toggle))
        .route("/count", get(cart::count))
}

/// Create the shipping routes router.
pub fn shipping_routes() -> Router<AppState> {
    Router::new()
        .route("/quote", post(shipping::quote))
        .route("/select", post(shipping::select))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::submit))
        .route("/address", post(checkout::check_address))
        .route("/redirect", get(checkout::redirect))
}

/// Create the API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/consent", get(consent::show).post(consent::save))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .nest("/shipping", shipping_routes())
        .nest("/checkout", checkout_routes())
        .nest("/api", api_routes())
}
