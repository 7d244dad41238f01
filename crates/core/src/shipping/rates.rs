//! Static per-province fallback rate table.
//!
//! Used when the courier's rate service cannot be reached. Prices are base
//! rates from the Gauteng warehouse plus a weight surcharge, so the estimate
//! still tracks package size and quantity.

use rust_decimal::Decimal;

use super::{QuoteRequest, ServiceType, ShippingQuote};
use crate::types::Province;

/// Surcharge in rand per chargeable kilogram above [`SURCHARGE_FREE_KG`].
const SURCHARGE_PER_KG: i64 = 10;

/// Chargeable weight included in the base rate.
const SURCHARGE_FREE_KG: i64 = 10;

/// Base rand price and delivery days for one service level.
#[derive(Debug, Clone, Copy)]
struct ServiceRate {
    base: i64,
    days: u32,
}

/// Standard, express and overnight rates for one province.
#[derive(Debug, Clone, Copy)]
struct ProvinceRates {
    standard: ServiceRate,
    express: ServiceRate,
    overnight: ServiceRate,
}

const fn rates(standard: (i64, u32), express: (i64, u32), overnight: (i64, u32)) -> ProvinceRates {
    ProvinceRates {
        standard: ServiceRate {
            base: standard.0,
            days: standard.1,
        },
        express: ServiceRate {
            base: express.0,
            days: express.1,
        },
        overnight: ServiceRate {
            base: overnight.0,
            days: overnight.1,
        },
    }
}

const fn province_rates(province: Province) -> ProvinceRates {
    match province {
        Province::Gauteng => rates((95, 2), (150, 1), (250, 1)),
        Province::WesternCape => rates((150, 4), (220, 2), (350, 1)),
        Province::KwaZuluNatal => rates((140, 3), (200, 2), (320, 1)),
        Province::EasternCape => rates((160, 4), (230, 2), (380, 1)),
        Province::FreeState => rates((130, 3), (190, 2), (300, 1)),
        Province::Mpumalanga => rates((120, 2), (180, 1), (280, 1)),
        Province::Limpopo => rates((150, 3), (220, 2), (350, 1)),
        Province::NorthWest => rates((130, 3), (190, 2), (300, 1)),
        Province::NorthernCape => rates((180, 5), (260, 3), (420, 2)),
    }
}

/// Local quote producer backed by the static rate table.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackRates;

impl FallbackRates {
    /// Weight surcharge for `quantity` parcels of the requested size.
    #[must_use]
    pub fn surcharge(request: &QuoteRequest) -> Decimal {
        let per_parcel = request.package_size.parcel().chargeable_weight();
        let total = per_parcel * Decimal::from(request.quantity);
        let excess = total - Decimal::from(SURCHARGE_FREE_KG);
        (excess * Decimal::from(SURCHARGE_PER_KG)).max(Decimal::ZERO)
    }

    /// Compute quotes for every service level, cheapest first.
    #[must_use]
    pub fn quotes(&self, request: &QuoteRequest) -> Vec<ShippingQuote> {
        let table = province_rates(request.province);
        let surcharge = Self::surcharge(request);

        let mut quotes: Vec<ShippingQuote> = [
            (ServiceType::Standard, table.standard),
            (ServiceType::Express, table.express),
            (ServiceType::Overnight, table.overnight),
        ]
        .into_iter()
        .map(|(service_type, rate)| ShippingQuote {
            service_type,
            service_name: service_type.display_name().to_string(),
            price: Decimal::from(rate.base) + surcharge,
            estimated_days: rate.days,
        })
        .collect();

        quotes.sort_by(|a, b| a.price.cmp(&b.price));
        quotes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipping::PackageSize;

    #[test]
    fn test_gauteng_medium_single() {
        let request = QuoteRequest::new(Province::Gauteng, PackageSize::Medium, 1);
        let quotes = FallbackRates.quotes(&request);

        assert_eq!(quotes.len(), 3);
        // 22kg chargeable -> (22 - 10) * 10 = R120 surcharge
        let standard = quotes
            .iter()
            .find(|q| q.service_type == ServiceType::Standard);
        assert_eq!(standard.map(|q| q.price), Some(Decimal::new(215, 0)));
        assert_eq!(standard.map(|q| q.estimated_days), Some(2));
    }

    #[test]
    fn test_quotes_sorted_by_price() {
        for province in Province::ALL {
            let quotes = FallbackRates.quotes(&QuoteRequest::new(province, PackageSize::Small, 2));
            assert!(quotes.windows(2).all(|w| w[0].price <= w[1].price));
        }
    }

    #[test]
    fn test_surcharge_scales_with_quantity() {
        let one = FallbackRates::surcharge(&QuoteRequest::new(Province::Limpopo, PackageSize::Xl, 1));
        let three = FallbackRates::surcharge(&QuoteRequest::new(Province::Limpopo, PackageSize::Xl, 3));
        // 40kg -> 300, 120kg -> 1100
        assert_eq!(one, Decimal::new(300, 0));
        assert_eq!(three, Decimal::new(1100, 0));
    }

    #[test]
    fn test_identical_inputs_identical_quotes() {
        let request = QuoteRequest::new(Province::NorthernCape, PackageSize::Large, 2);
        assert_eq!(FallbackRates.quotes(&request), FallbackRates.quotes(&request));
    }
}
