//! Shipping quotes.
//!
//! A quote lookup maps (province, package size, quantity) to a list of
//! courier service options. The lookup is a two-stage pipeline: a remote
//! [`QuoteSource`] is tried first and the static [`FallbackRates`] table is
//! used whenever it fails, so estimating shipping never blocks checkout.
//!
//! - [`rates`] - static per-province fallback table and parcel maths
//! - [`lookup`] - the remote-then-fallback pipeline and auto-selection
//! - [`calculator`] - stateful calculator with stale-result protection

pub mod calculator;
pub mod lookup;
pub mod rates;

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, Province};

pub use calculator::{QuoteTicket, ShippingCalculator};
pub use lookup::{QuoteOrigin, QuoteSet, QuoteSource, QuoteSourceError, auto_select, lookup};
pub use rates::FallbackRates;

/// Message shown when a quote is requested without a province.
pub const SELECT_PROVINCE_MESSAGE: &str = "Please select a province";

/// Errors surfaced by the shipping flow.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ShippingError {
    /// No destination province chosen.
    #[error("Please select a province")]
    MissingProvince,
    /// A selection was attempted for a service not in the current quotes.
    #[error("shipping service {0} is not available for this destination")]
    UnavailableService(ServiceType),
}

/// Flat-pack package size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageSize {
    Small,
    #[default]
    Medium,
    Large,
    Xl,
}

impl PackageSize {
    /// Wire name (`small`, `medium`, `large`, `xl`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Xl => "xl",
        }
    }

    /// Infer a size class from a variant SKU such as `KDS-PERS-LG`.
    ///
    /// Checks for the largest size first so `XL` is never mistaken for `L`.
    /// Unrecognised SKUs are treated as small.
    #[must_use]
    pub fn from_sku(sku: &str) -> Self {
        let upper = sku.to_ascii_uppercase();
        let has_token = |tokens: &[&str]| {
            upper
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|part| tokens.contains(&part))
        };

        if has_token(&["XL"]) {
            Self::Xl
        } else if has_token(&["LG", "LARGE"]) {
            Self::Large
        } else if has_token(&["MD", "MED", "MEDIUM"]) {
            Self::Medium
        } else {
            Self::Small
        }
    }

    /// Parcel dimensions for one flat-packed unit of this size.
    #[must_use]
    pub const fn parcel(&self) -> Parcel {
        match self {
            Self::Small => Parcel::new(60, 60, 15, 15),
            Self::Medium => Parcel::new(70, 70, 15, 22),
            Self::Large => Parcel::new(80, 80, 18, 30),
            Self::Xl => Parcel::new(90, 90, 20, 40),
        }
    }
}

impl fmt::Display for PackageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            "xl" => Ok(Self::Xl),
            other => Err(format!("unknown package size: {other}")),
        }
    }
}

/// Parcel dimensions in centimetres and weight in kilograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parcel {
    pub length_cm: u32,
    pub width_cm: u32,
    pub height_cm: u32,
    pub weight_kg: u32,
}

impl Parcel {
    /// Volumetric divisor used by the courier.
    pub const VOLUMETRIC_DIVISOR: u32 = 5000;

    #[must_use]
    pub const fn new(length_cm: u32, width_cm: u32, height_cm: u32, weight_kg: u32) -> Self {
        Self {
            length_cm,
            width_cm,
            height_cm,
            weight_kg,
        }
    }

    /// Greater of actual weight and volumetric weight (L×W×H / 5000).
    #[must_use]
    pub fn chargeable_weight(&self) -> Decimal {
        let volume = Decimal::from(self.length_cm)
            * Decimal::from(self.width_cm)
            * Decimal::from(self.height_cm);
        let volumetric = volume / Decimal::from(Self::VOLUMETRIC_DIVISOR);
        volumetric.max(Decimal::from(self.weight_kg))
    }
}

/// Courier service level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Standard,
    Express,
    Overnight,
    /// Any service the remote courier offers that the storefront has no
    /// special handling for.
    #[serde(other)]
    Other,
}

impl ServiceType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Express => "express",
            Self::Overnight => "overnight",
            Self::Other => "other",
        }
    }

    /// Default display name for quotes produced locally.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Standard => "Standard Delivery",
            Self::Express => "Express Delivery",
            Self::Overnight => "Overnight Delivery",
            Self::Other => "Courier Delivery",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One priced courier option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub service_type: ServiceType,
    pub service_name: String,
    /// Price in rand. Sent and received as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub estimated_days: u32,
}

impl ShippingQuote {
    /// Price as a displayable [`Price`].
    #[must_use]
    pub const fn display_price(&self) -> Price {
        Price::zar(self.price)
    }

    /// Human-readable delivery window.
    #[must_use]
    pub fn delivery_estimate(&self) -> String {
        if self.estimated_days <= 1 {
            "Next business day".to_string()
        } else {
            format!("{} business days", self.estimated_days)
        }
    }
}

/// Inputs of a quote lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub province: Province,
    pub package_size: PackageSize,
    pub quantity: u32,
}

impl QuoteRequest {
    /// Build a request. A quantity of zero is raised to one.
    #[must_use]
    pub fn new(province: Province, package_size: PackageSize, quantity: u32) -> Self {
        Self {
            province,
            package_size,
            quantity: quantity.max(1),
        }
    }
}
