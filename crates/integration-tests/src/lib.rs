//! Integration tests for the KoosDoos storefront.
//!
//! Each test spawns the full storefront router on an ephemeral port together
//! with local stand-ins for the courier rate API and the payment gateway,
//! then drives it over HTTP with a cookie-keeping client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p koosdoos-integration-tests
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use koosdoos_core::cart::CartOptions;
use koosdoos_storefront::config::{CourierConfig, PaymentGatewayConfig, StorefrontConfig};
use koosdoos_storefront::content::parse_catalog;
use koosdoos_storefront::state::AppState;
use serde_json::{Value, json};
use url::Url;

/// Bundled catalog, shared with the storefront binary.
const CATALOG: &str = include_str!("../../storefront/content/catalog.json");

/// Payment page URL the fake gateway hands out.
pub const PAYMENT_URL: &str = "https://sandbox.payfast.example/eng/process";

/// Serve `router` on 127.0.0.1 with an ephemeral port.
///
/// # Panics
///
/// Panics if the listener cannot be bound.
pub async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    Url::parse(&format!("http://{addr}")).expect("Invalid test URL")
}

/// What the fake courier answers.
#[derive(Debug, Clone)]
pub enum CourierBehaviour {
    /// 200 with these quotes.
    Quotes(Value),
    /// This status with a plain body.
    Status(u16),
    /// 200 with a body that is not JSON.
    Garbage,
    /// Answer after this delay with a valid quote.
    Slow(Duration),
}

/// A running fake courier.
#[derive(Debug, Clone)]
pub struct FakeCourier {
    pub url: Url,
    hits: Arc<AtomicUsize>,
}

impl FakeCourier {
    /// Start a courier that behaves as `behaviour` on every call.
    pub async fn start(behaviour: CourierBehaviour) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route("/shipping/quote/simple", post(courier_quote))
            .with_state((behaviour, Arc::clone(&hits)));
        Self {
            url: serve(router).await,
            hits,
        }
    }

    /// Number of quote requests received.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn courier_quote(
    State((behaviour, hits)): State<(CourierBehaviour, Arc<AtomicUsize>)>,
) -> axum::response::Response {
    hits.fetch_add(1, Ordering::SeqCst);
    match behaviour {
        CourierBehaviour::Quotes(quotes) => Json(json!({ "quotes": quotes })).into_response(),
        CourierBehaviour::Status(code) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            "courier unavailable",
        )
            .into_response(),
        CourierBehaviour::Garbage => "<html>maintenance</html>".into_response(),
        CourierBehaviour::Slow(delay) => {
            tokio::time::sleep(delay).await;
            Json(json!({ "quotes": [
                { "service_type": "standard", "service_name": "Late", "price": 1.0, "estimated_days": 9 }
            ]}))
            .into_response()
        }
    }
}

/// A running fake payment gateway that records every checkout body.
#[derive(Debug, Clone)]
pub struct FakeGateway {
    pub url: Url,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl FakeGateway {
    pub async fn start() -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("/checkout/payfast", post(gateway_checkout))
            .with_state(Arc::clone(&requests));
        Self {
            url: serve(router).await,
            requests,
        }
    }

    /// Checkout bodies received so far.
    ///
    /// # Panics
    ///
    /// Panics if the request log lock is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().expect("request log poisoned").clone()
    }
}

async fn gateway_checkout(
    State(requests): State<Arc<Mutex<Vec<Value>>>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let total = body["cart_lines"]
        .as_array()
        .map(|lines| {
            lines
                .iter()
                .map(|l| l["unit_price"].as_f64().unwrap_or(0.0) * l["quantity"].as_f64().unwrap_or(0.0))
                .sum::<f64>()
        })
        .unwrap_or(0.0)
        + body["selected_shipping_quote"]["price"].as_f64().unwrap_or(0.0);

    if let Ok(mut log) = requests.lock() {
        log.push(body);
    }

    Json(json!({
        "order_id": "ORD-1001",
        "payfast_url": PAYMENT_URL,
        "form_fields": [
            { "name": "merchant_id", "value": "10000100" },
            { "name": "m_payment_id", "value": "ORD-1001" },
            { "name": "amount", "value": format!("{total:.2}") },
            { "name": "item_name", "value": "KoosDoos order ORD-1001" }
        ],
        "total": total
    }))
}

/// A running storefront and a client bound to it.
#[derive(Debug, Clone)]
pub struct TestApp {
    pub base_url: Url,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Start the storefront against the given collaborators.
    ///
    /// # Panics
    ///
    /// Panics if the catalog or state cannot be built.
    pub async fn spawn(courier: Option<&FakeCourier>, gateway: &FakeGateway) -> Self {
        Self::spawn_with_timeout(courier, gateway, Duration::from_secs(5)).await
    }

    /// Like [`Self::spawn`] with an explicit courier timeout.
    ///
    /// # Panics
    ///
    /// Panics if the catalog or state cannot be built.
    pub async fn spawn_with_timeout(
        courier: Option<&FakeCourier>,
        gateway: &FakeGateway,
        timeout: Duration,
    ) -> Self {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().expect("valid host"),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            catalog_path: PathBuf::from("content/catalog.json"),
            cart: CartOptions::default(),
            courier: courier.map(|c| CourierConfig {
                api_url: c.url.clone(),
                api_key: None,
                timeout,
            }),
            payment: PaymentGatewayConfig {
                url: gateway.url.clone(),
                api_key: None,
            },
            sentry_dsn: None,
            sentry_environment: None,
        };
        let catalog = parse_catalog(CATALOG).expect("bundled catalog is valid");
        let state = AppState::new(config, catalog).expect("Failed to build state");
        let base_url = serve(koosdoos_storefront::app(state)).await;

        Self {
            base_url,
            client: Self::new_client(),
        }
    }

    /// A fresh visitor: own cookie jar, redirects not followed.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn new_client() -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// POST JSON and return the response.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    /// GET and return the response.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("request failed")
    }

    /// Add a variant to the cart, asserting success.
    ///
    /// # Panics
    ///
    /// Panics if the storefront rejects the item.
    pub async fn add_to_cart(&self, product_id: &str, variant_id: &str, quantity: u32) -> Value {
        let resp = self
            .post(
                "/cart/add",
                &json!({ "product_id": product_id, "variant_id": variant_id, "quantity": quantity }),
            )
            .await;
        assert!(resp.status().is_success(), "add to cart failed: {}", resp.status());
        resp.json().await.expect("cart JSON")
    }
}

/// A complete Cape Town address.
#[must_use]
pub fn cape_town_address() -> Value {
    json!({
        "street": "12 Long Street",
        "suburb": "Gardens",
        "city": "Cape Town",
        "province": "Western Cape",
        "postal_code": "8001"
    })
}

/// A customer block for checkout.
#[must_use]
pub fn customer() -> Value {
    json!({
        "email": "thandi@example.co.za",
        "first_name": "Thandi",
        "last_name": "Nkosi",
        "phone": "+27 82 555 0101"
    })
}
