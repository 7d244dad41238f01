//! South African provinces.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a string is not one of the nine provinces.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown province: {0:?}")]
pub struct UnknownProvince(pub String);

/// One of the nine provinces of South Africa.
///
/// Serialized using the display name (e.g. `"KwaZulu-Natal"`), which is also
/// what address forms and the courier API exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Province {
    #[serde(rename = "Eastern Cape")]
    EasternCape,
    #[serde(rename = "Free State")]
    FreeState,
    #[serde(rename = "Gauteng")]
    Gauteng,
    #[serde(rename = "KwaZulu-Natal")]
    KwaZuluNatal,
    #[serde(rename = "Limpopo")]
    Limpopo,
    #[serde(rename = "Mpumalanga")]
    Mpumalanga,
    #[serde(rename = "Northern Cape")]
    NorthernCape,
    #[serde(rename = "North West")]
    NorthWest,
    #[serde(rename = "Western Cape")]
    WesternCape,
}

impl Province {
    /// All provinces, in the order they appear in a select box.
    pub const ALL: [Self; 9] = [
        Self::EasternCape,
        Self::FreeState,
        Self::Gauteng,
        Self::KwaZuluNatal,
        Self::Limpopo,
        Self::Mpumalanga,
        Self::NorthernCape,
        Self::NorthWest,
        Self::WesternCape,
    ];

    /// Display name of the province.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EasternCape => "Eastern Cape",
            Self::FreeState => "Free State",
            Self::Gauteng => "Gauteng",
            Self::KwaZuluNatal => "KwaZulu-Natal",
            Self::Limpopo => "Limpopo",
            Self::Mpumalanga => "Mpumalanga",
            Self::NorthernCape => "Northern Cape",
            Self::NorthWest => "North West",
            Self::WesternCape => "Western Cape",
        }
    }
}

impl fmt::Display for Province {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Province {
    type Err = UnknownProvince;

    /// Parses a display name. Matching ignores ASCII case and surrounding
    /// whitespace, so `"gauteng "` is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownProvince(s.to_owned()))
    }
}
