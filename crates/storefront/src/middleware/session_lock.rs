//! Per-session request serialisation.
//!
//! Handlers rebuild the cart from the session record, change it, and the
//! session layer writes the record back after the response. Two requests in
//! one session would both start from the same record and the later save
//! would drop the earlier change. This layer sits outside the session layer
//! and holds a per-session mutex until the record has been saved.
//!
//! Requests without a session cookie get a fresh session and run unlocked.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::header::COOKIE,
    middleware::Next,
    response::Response,
};
use moka::future::Cache;
use tokio::sync::Mutex;
use tower_sessions::cookie::Cookie;

use super::SESSION_COOKIE_NAME;
use crate::state::AppState;

/// Locks for sessions idle this long are dropped.
const LOCK_IDLE: Duration = Duration::from_secs(60 * 60);

const MAX_LOCKS: u64 = 100_000;

/// One mutex per session ID.
#[derive(Clone)]
pub struct SessionLocks {
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl SessionLocks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Cache::builder()
                .max_capacity(MAX_LOCKS)
                .time_to_idle(LOCK_IDLE)
                .build(),
        }
    }

    /// The lock for `session_id`, created on first use.
    pub async fn lock_for(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .get_with(session_id.to_owned(), async { Arc::new(Mutex::new(())) })
            .await
    }
}

impl Default for SessionLocks {
    fn default() -> Self {
        Self::new()
    }
}

/// Session ID from the request's cookies, if the visitor has one.
fn session_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
}

/// Run requests of the same session one at a time.
pub async fn session_lock_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(id) = session_id(&request) else {
        return next.run(request).await;
    };

    let lock = state.session_locks().lock_for(&id).await;
    let _guard = lock.lock().await;
    next.run(request).await
}
