//! Checkout route handlers.
//!
//! `POST /checkout` gates the hand-off, asks the payment gateway for a
//! payment page and parks the answer in the session. The buyer is then sent
//! to `GET /checkout/redirect`, which renders the auto-submitting form once
//! and forgets it.

use std::collections::BTreeSet;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use koosdoos_core::address::{AddressDraft, AddressField, AddressForm, AddressReport};
use koosdoos_core::checkout::{CheckoutDraft, CustomerDetails, FormField, PaymentHandoff};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::cart::{load_cart, save_cart};
use crate::error::{Result, add_breadcrumb};
use crate::models::{ShippingSelection, session_keys};
use crate::state::AppState;

/// Address form round-trip: the raw fields plus which ones the buyer left.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddressCheckRequest {
    #[serde(flatten)]
    pub address: AddressDraft,
    pub touched: BTreeSet<AddressField>,
    /// Show every error, as on submit.
    pub submit: bool,
}

/// Checkout submission.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequestBody {
    pub customer: CustomerDetails,
    pub address: AddressDraft,
}

/// Auto-submitting payment form.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/redirect.html")]
pub struct PaymentRedirectTemplate {
    pub action: String,
    pub fields: Vec<FormField>,
    pub total: String,
}

/// Validate an address draft and report the errors the buyer should see.
#[instrument(skip(body))]
pub async fn check_address(Json(body): Json<AddressCheckRequest>) -> Json<AddressReport> {
    let mut form = AddressForm::new(AddressDraft::default());
    for field in AddressField::ALL {
        let value = match field {
            AddressField::Street => &body.address.street,
            AddressField::Suburb => &body.address.suburb,
            AddressField::City => &body.address.city,
            AddressField::Province => &body.address.province,
            AddressField::PostalCode => &body.address.postal_code,
        };
        form.set_field(field, value);
    }
    if body.submit {
        form.touch_all();
    } else {
        for field in body.touched {
            form.touch(field);
        }
    }
    Json(form.report())
}

/// Submit the order to the payment gateway.
#[instrument(skip(state, session, body))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CheckoutRequestBody>,
) -> Result<Redirect> {
    let mut cart = load_cart(&state, &session).await?;
    let selection = session
        .get::<ShippingSelection>(session_keys::SHIPPING)
        .await?;

    let draft = CheckoutDraft {
        customer: body.customer,
        address: body.address,
        selected_quote: selection.as_ref().and_then(ShippingSelection::selected_quote).cloned(),
    };
    let request = draft.prepare(cart.state(), &state.catalog())?;

    let response = state.payment().create_checkout(&request).await?;
    let order_id = response.order_id.to_string();

    session
        .insert(session_keys::PENDING_HANDOFF, PaymentHandoff::new(response))
        .await?;

    cart.clear_cart();
    save_cart(&session, &cart).await?;
    session.remove::<ShippingSelection>(session_keys::SHIPPING).await?;

    add_breadcrumb(
        "checkout",
        "Redirecting to payment",
        Some(&[("order_id", order_id.as_str())]),
    );

    Ok(Redirect::to("/checkout/redirect"))
}

/// Render the pending payment form. A second visit finds nothing and goes
/// back to the cart.
#[instrument(skip(session))]
pub async fn redirect(session: Session) -> Result<Response> {
    let Some(mut handoff) = session
        .remove::<PaymentHandoff>(session_keys::PENDING_HANDOFF)
        .await?
    else {
        return Ok(Redirect::to("/cart").into_response());
    };

    let total = koosdoos_core::Price::zar(handoff.total()).display();
    let Some(form) = handoff.submit() else {
        return Ok(Redirect::to("/cart").into_response());
    };

    Ok(PaymentRedirectTemplate {
        action: form.action,
        fields: form.fields,
        total,
    }
    .into_response())
}
