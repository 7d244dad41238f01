//! Stateful shipping calculator.
//!
//! Holds the destination, package profile, the last quotes and the buyer's
//! selection. Lookups are split into [`ShippingCalculator::begin`] and
//! [`ShippingCalculator::apply`] so a result that arrives after the inputs
//! changed, after a newer lookup started, or after the calculator was
//! unmounted is discarded instead of overwriting current state.

use tracing::debug;

use super::lookup::{QuoteOrigin, QuoteSet, QuoteSource, auto_select, lookup};
use super::{PackageSize, QuoteRequest, ServiceType, ShippingError, ShippingQuote};
use crate::types::Province;

/// Identifies one in-flight lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a ticket must be passed back to `apply`"]
pub struct QuoteTicket {
    generation: u64,
    request: QuoteRequest,
}

impl QuoteTicket {
    /// The request this ticket was issued for.
    #[must_use]
    pub const fn request(&self) -> &QuoteRequest {
        &self.request
    }
}

/// Shipping calculator state.
#[derive(Debug, Clone)]
pub struct ShippingCalculator {
    province: Option<Province>,
    package_size: PackageSize,
    quantity: u32,
    quotes: Vec<ShippingQuote>,
    origin: Option<QuoteOrigin>,
    selected: Option<ServiceType>,
    error: Option<ShippingError>,
    calculated: bool,
    loading: bool,
    generation: u64,
    mounted: bool,
}

impl Default for ShippingCalculator {
    fn default() -> Self {
        Self::new(PackageSize::default(), 1)
    }
}

impl ShippingCalculator {
    /// Create a calculator for a package profile.
    #[must_use]
    pub fn new(package_size: PackageSize, quantity: u32) -> Self {
        Self {
            province: None,
            package_size,
            quantity: quantity.max(1),
            quotes: Vec::new(),
            origin: None,
            selected: None,
            error: None,
            calculated: false,
            loading: false,
            generation: 0,
            mounted: true,
        }
    }

    /// Seed the calculator with a selection the parent flow already holds.
    #[must_use]
    pub const fn with_selection(mut self, selected: Option<ServiceType>) -> Self {
        self.selected = selected;
        self
    }

    /// Change the destination province.
    ///
    /// Invalidates current quotes and any lookup in flight; the next
    /// calculation is a "recalculate".
    pub fn set_province(&mut self, province: Option<Province>) {
        if self.province != province {
            self.province = province;
            self.invalidate();
        }
    }

    /// Change the package profile. Invalidates like [`Self::set_province`].
    pub fn set_package(&mut self, package_size: PackageSize, quantity: u32) {
        let quantity = quantity.max(1);
        if self.package_size != package_size || self.quantity != quantity {
            self.package_size = package_size;
            self.quantity = quantity;
            self.invalidate();
        }
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.calculated = false;
        self.loading = false;
        self.quotes.clear();
        self.origin = None;
    }

    /// Start a lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ShippingError::MissingProvince`] (and records it as the
    /// visible error) when no province is set.
    pub fn begin(&mut self) -> Result<QuoteTicket, ShippingError> {
        let Some(province) = self.province else {
            self.error = Some(ShippingError::MissingProvince);
            return Err(ShippingError::MissingProvince);
        };

        self.generation += 1;
        self.loading = true;
        self.error = None;

        Ok(QuoteTicket {
            generation: self.generation,
            request: QuoteRequest::new(province, self.package_size, self.quantity),
        })
    }

    /// Apply a lookup result. Returns `false` if the result was discarded.
    pub fn apply(&mut self, ticket: QuoteTicket, set: QuoteSet) -> bool {
        if !self.mounted {
            debug!("discarding shipping quotes for unmounted calculator");
            return false;
        }
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale shipping quotes"
            );
            return false;
        }

        self.selected = auto_select(&set.quotes, self.selected);
        self.quotes = set.quotes;
        self.origin = Some(set.origin);
        self.calculated = true;
        self.loading = false;
        true
    }

    /// Run a full lookup against `remote` (with fallback) and apply it.
    ///
    /// # Errors
    ///
    /// Returns [`ShippingError::MissingProvince`] when no province is set.
    pub async fn calculate<S: QuoteSource>(&mut self, remote: &S) -> Result<&[ShippingQuote], ShippingError> {
        let ticket = self.begin()?;
        let set = lookup(remote, ticket.request()).await;
        self.apply(ticket, set);
        Ok(&self.quotes)
    }

    /// Select one of the current quotes.
    ///
    /// # Errors
    ///
    /// Returns [`ShippingError::UnavailableService`] if `service` is not among
    /// the current quotes.
    pub fn select(&mut self, service: ServiceType) -> Result<&ShippingQuote, ShippingError> {
        let quote = self
            .quotes
            .iter()
            .find(|q| q.service_type == service)
            .ok_or(ShippingError::UnavailableService(service))?;
        self.selected = Some(service);
        Ok(quote)
    }

    /// Tear the calculator down; results of in-flight lookups are ignored.
    pub const fn unmount(&mut self) {
        self.mounted = false;
        self.loading = false;
    }

    #[must_use]
    pub const fn province(&self) -> Option<Province> {
        self.province
    }

    #[must_use]
    pub fn quotes(&self) -> &[ShippingQuote] {
        &self.quotes
    }

    #[must_use]
    pub const fn origin(&self) -> Option<QuoteOrigin> {
        self.origin
    }

    #[must_use]
    pub const fn selected(&self) -> Option<ServiceType> {
        self.selected
    }

    /// The selected quote, if it is among the current quotes.
    #[must_use]
    pub fn selected_quote(&self) -> Option<&ShippingQuote> {
        let selected = self.selected?;
        self.quotes.iter().find(|q| q.service_type == selected)
    }

    #[must_use]
    pub const fn error(&self) -> Option<&ShippingError> {
        self.error.as_ref()
    }

    /// Whether the current quotes match the current inputs.
    #[must_use]
    pub const fn has_calculated(&self) -> bool {
        self.calculated
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shipping::FallbackRates;
    use crate::shipping::lookup::QuoteSourceError;
    use crate::shipping::lookup::tests::{Canned, express_only};

    fn fallback_set(request: &QuoteRequest) -> QuoteSet {
        QuoteSet {
            request: *request,
            quotes: FallbackRates.quotes(request),
            origin: QuoteOrigin::Fallback,
        }
    }

    #[test]
    fn test_begin_without_province_reports_error() {
        let mut calc = ShippingCalculator::default();
        assert_eq!(calc.begin(), Err(ShippingError::MissingProvince));
        assert_eq!(
            calc.error().map(ToString::to_string).as_deref(),
            Some("Please select a province")
        );
    }

    #[tokio::test]
    async fn test_calculate_with_failing_remote_auto_selects_standard() {
        let mut calc = ShippingCalculator::new(PackageSize::Medium, 1);
        calc.set_province(Some(Province::Gauteng));
        let remote = Canned(Err(QuoteSourceError::Timeout));

        let quotes = calc.calculate(&remote).await.unwrap();
        assert!(!quotes.is_empty());
        assert_eq!(calc.origin(), Some(QuoteOrigin::Fallback));
        assert_eq!(calc.selected(), Some(ServiceType::Standard));
        assert!(calc.has_calculated());
        assert!(!calc.is_loading());
    }

    #[tokio::test]
    async fn test_existing_selection_survives_recalculate() {
        let mut calc = ShippingCalculator::new(PackageSize::Small, 1)
            .with_selection(Some(ServiceType::Express));
        calc.set_province(Some(Province::WesternCape));
        calc.calculate(&Canned(Err(QuoteSourceError::Timeout))).await.unwrap();
        assert_eq!(calc.selected(), Some(ServiceType::Express));
        assert_eq!(calc.selected_quote().map(|q| q.service_type), Some(ServiceType::Express));
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let mut calc = ShippingCalculator::default();
        calc.set_province(Some(Province::Gauteng));
        let first = calc.begin().unwrap();
        let second = calc.begin().unwrap();

        assert!(!calc.apply(first, fallback_set(first.request())));
        assert!(calc.quotes().is_empty());
        assert!(calc.apply(second, fallback_set(second.request())));
        assert_eq!(calc.quotes().len(), 3);
    }

    #[test]
    fn test_province_change_invalidates_in_flight_lookup() {
        let mut calc = ShippingCalculator::default();
        calc.set_province(Some(Province::Gauteng));
        let ticket = calc.begin().unwrap();
        calc.set_province(Some(Province::Limpopo));

        assert!(!calc.apply(ticket, fallback_set(ticket.request())));
        assert!(!calc.has_calculated());
    }

    #[test]
    fn test_unmounted_calculator_ignores_results() {
        let mut calc = ShippingCalculator::default();
        calc.set_province(Some(Province::Gauteng));
        let ticket = calc.begin().unwrap();
        calc.unmount();

        assert!(!calc.apply(ticket, fallback_set(ticket.request())));
        assert!(calc.quotes().is_empty());
        assert_eq!(calc.selected(), None);
    }

    #[tokio::test]
    async fn test_select_only_accepts_offered_services() {
        let mut calc = ShippingCalculator::default();
        calc.set_province(Some(Province::Gauteng));
        calc.calculate(&Canned(Ok(express_only()))).await.unwrap();

        assert_eq!(calc.selected(), None);
        assert_eq!(
            calc.select(ServiceType::Overnight).err(),
            Some(ShippingError::UnavailableService(ServiceType::Overnight))
        );
        assert!(calc.select(ServiceType::Express).is_ok());
        assert_eq!(calc.selected(), Some(ServiceType::Express));
    }
}
