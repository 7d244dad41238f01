//! Cookie consent route handlers.

use axum::Json;
use chrono::Utc;
use koosdoos_core::consent::CookieConsent;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::{load_storage, session_keys, store_storage};

/// One-click choices offered by the banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentPreset {
    AcceptAll,
    EssentialOnly,
}

/// Consent submission: either a preset or the individual toggles.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConsentRequest {
    pub preset: Option<ConsentPreset>,
    pub functional: bool,
    pub analytics: bool,
    pub marketing: bool,
}

impl ConsentRequest {
    fn into_consent(self) -> CookieConsent {
        let now = Utc::now();
        match self.preset {
            Some(ConsentPreset::AcceptAll) => CookieConsent::accept_all(now),
            Some(ConsentPreset::EssentialOnly) => CookieConsent::essential_only(now),
            None => CookieConsent::custom(self.functional, self.analytics, self.marketing, now),
        }
    }
}

/// The stored choice, or `null` if the banner should be shown.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<Option<CookieConsent>>> {
    let storage = load_storage(&session, session_keys::CONSENT).await?;
    Ok(Json(CookieConsent::load(&storage)))
}

/// Record the visitor's choice.
#[instrument(skip(session))]
pub async fn save(session: Session, Json(body): Json<ConsentRequest>) -> Result<Json<CookieConsent>> {
    let consent = body.into_consent();

    let mut storage = load_storage(&session, session_keys::CONSENT).await?;
    consent
        .save(&mut storage)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    store_storage(&session, &storage, session_keys::CONSENT).await?;

    Ok(Json(consent))
}
