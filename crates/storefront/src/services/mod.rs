//! External service clients.
//!
//! - [`courier`] - Courier rate API (live shipping quotes)
//! - [`payment`] - Payment gateway (order creation and hosted payment hand-off)

pub mod courier;
pub mod payment;

pub use courier::{CourierClient, CourierError};
pub use payment::{GatewayError, PaymentGatewayClient};
