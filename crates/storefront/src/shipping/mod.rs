//! Shipping estimator: address validation and simulated freight quotes.
//!
//! Freight pricing is a deterministic simulation, not a carrier
//! integration: the resolved region picks one of two fixed tier tables.
//! The postal lookup only resolves the address; it never prices anything.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use mangaba_core::{Money, PostalCode, PostalCodeError};

use crate::models::address::NewAddress;
use crate::services::postal::{PostalError, PostalLookup};

/// Region codes that qualify for the lower "near" freight table.
pub const NEAR_REGIONS: &[&str] = &["SP", "RJ", "MG", "ES"];

/// Errors from freight computation and option selection.
#[derive(Debug, Error)]
pub enum ShippingError {
    /// The postal code does not normalize to exactly 8 digits.
    #[error("invalid postal code: {0}")]
    InvalidPostalCode(#[from] PostalCodeError),

    /// The lookup service has no record of the postal code.
    #[error("postal code not found: {0}")]
    PostalCodeNotFound(String),

    /// The lookup service failed.
    #[error("postal lookup failed: {0}")]
    Lookup(PostalError),

    /// The address is missing required fields.
    #[error("address is incomplete")]
    IncompleteAddress(BTreeMap<&'static str, String>),

    /// The selected freight option index does not exist.
    #[error("no such freight option: {0}")]
    NoSuchOption(usize),
}

/// A named shipping tier with price and delivery estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreightOption {
    /// Carrier/tier name shown to the shopper.
    pub carrier: String,
    /// Price in minor currency units.
    pub price: Money,
    /// Estimated delivery time in days.
    pub delivery_days: u32,
}

/// The three simulated freight tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FreightTier {
    Standard,
    Express,
    Priority,
}

impl FreightTier {
    const ALL: [Self; 3] = [Self::Standard, Self::Express, Self::Priority];

    const fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Express => "Express",
            Self::Priority => "Priority",
        }
    }

    /// `(price in cents, delivery days)` for the tier.
    const fn rate(self, near: bool) -> (i64, u32) {
        match (self, near) {
            (Self::Standard, true) => (1490, 5),
            (Self::Express, true) => (2290, 2),
            (Self::Priority, true) => (3290, 1),
            (Self::Standard, false) => (1990, 8),
            (Self::Express, false) => (2990, 4),
            (Self::Priority, false) => (3990, 2),
        }
    }
}

/// Build the three-tier freight table for a region.
#[must_use]
pub fn freight_table(region: &str) -> Vec<FreightOption> {
    let near = NEAR_REGIONS.contains(&region.to_uppercase().as_str());
    FreightTier::ALL
        .into_iter()
        .map(|tier| {
            let (price, delivery_days) = tier.rate(near);
            FreightOption {
                carrier: tier.label().to_owned(),
                price: Money::from_minor_units(price),
                delivery_days,
            }
        })
        .collect()
}

// =============================================================================
// Address form
// =============================================================================

/// The checkout address as entered by the shopper.
///
/// `complement` is the only optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressForm {
    pub postal_code: String,
    pub street: String,
    pub number: String,
    pub neighborhood: String,
    pub city: String,
    pub region: String,
    pub complement: Option<String>,
}

impl AddressForm {
    /// Validate required fields.
    ///
    /// Returns a per-field error map; an empty map means the address is
    /// valid. Re-run whenever any field changes, not only on submit.
    #[must_use]
    pub fn validate(&self) -> BTreeMap<&'static str, String> {
        let mut errors = BTreeMap::new();

        let required: [(&'static str, &str); 5] = [
            ("street", &self.street),
            ("number", &self.number),
            ("neighborhood", &self.neighborhood),
            ("city", &self.city),
            ("region", &self.region),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.insert(field, format!("{field} is required"));
            }
        }

        if let Err(e) = PostalCode::parse(&self.postal_code) {
            errors.insert("postal_code", e.to_string());
        }

        errors
    }

    /// Whether all required fields are present.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Convert into the persistence input type.
    ///
    /// Callers must validate first; this does not re-check fields.
    #[must_use]
    pub fn to_new_address(&self) -> NewAddress {
        NewAddress {
            postal_code: self.postal_code.clone(),
            street: self.street.clone(),
            number: self.number.clone(),
            neighborhood: self.neighborhood.clone(),
            city: self.city.clone(),
            region: self.region.clone(),
            complement: self
                .complement
                .as_ref()
                .filter(|c| !c.trim().is_empty())
                .cloned(),
        }
    }
}

// =============================================================================
// Estimator
// =============================================================================

/// Computes freight options for an address.
pub struct ShippingEstimator<L: PostalLookup> {
    lookup: L,
}

impl<L: PostalLookup> ShippingEstimator<L> {
    /// Create an estimator over a postal lookup source.
    #[must_use]
    pub const fn new(lookup: L) -> Self {
        Self { lookup }
    }

    /// Compute freight options for the form's postal code.
    ///
    /// Normalizes the postal code in place and backfills blank address
    /// fields from the lookup result - fields the shopper already filled in
    /// always win over the lookup's suggestion.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::InvalidPostalCode` if the code does not have
    /// exactly 8 digits, `ShippingError::PostalCodeNotFound` if the lookup
    /// has no match, or `ShippingError::Lookup` for transport failures.
    #[instrument(skip(self, form), fields(postal_code = %form.postal_code))]
    pub async fn compute_freight(
        &self,
        form: &mut AddressForm,
    ) -> Result<Vec<FreightOption>, ShippingError> {
        let code = PostalCode::parse(&form.postal_code)?;
        form.postal_code = code.as_str().to_owned();

        let resolved = self.lookup.lookup(&code).await.map_err(|e| match e {
            PostalError::NotFound(code) => ShippingError::PostalCodeNotFound(code),
            other => ShippingError::Lookup(other),
        })?;

        backfill(&mut form.street, &resolved.street);
        backfill(&mut form.neighborhood, &resolved.neighborhood);
        backfill(&mut form.city, &resolved.city);
        backfill(&mut form.region, &resolved.region);

        Ok(freight_table(&form.region))
    }
}

/// Fill `field` from the lookup suggestion only when the shopper left it blank.
fn backfill(field: &mut String, suggestion: &str) {
    if field.trim().is_empty() && !suggestion.is_empty() {
        *field = suggestion.to_owned();
    }
}

// =============================================================================
// Quote state
// =============================================================================

/// Session-held quote state: the address snapshot, the quoted options, and
/// the shopper's selection.
///
/// Editing the address after a quote invalidates both the options and the
/// selection; only a fresh successful computation repopulates them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteState {
    pub address: AddressForm,
    pub options: Vec<FreightOption>,
    selected: Option<usize>,
}

impl QuoteState {
    /// Replace the address, invalidating the quote if anything changed.
    pub fn set_address(&mut self, address: AddressForm) {
        if address != self.address {
            self.address = address;
            self.invalidate();
        }
    }

    /// Drop the current options and selection.
    pub fn invalidate(&mut self) {
        self.options.clear();
        self.selected = None;
    }

    /// Store a fresh quote; any previous selection is discarded.
    pub fn record_options(&mut self, options: Vec<FreightOption>) {
        self.options = options;
        self.selected = None;
    }

    /// Select one of the quoted options by index.
    ///
    /// Re-validates the address first: an invalid address clears any
    /// selection and fails.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::IncompleteAddress` if the address is no
    /// longer valid, or `ShippingError::NoSuchOption` for a bad index.
    pub fn select(&mut self, index: usize) -> Result<&FreightOption, ShippingError> {
        let errors = self.address.validate();
        if !errors.is_empty() {
            self.selected = None;
            return Err(ShippingError::IncompleteAddress(errors));
        }

        let option = self
            .options
            .get(index)
            .ok_or(ShippingError::NoSuchOption(index))?;
        self.selected = Some(index);
        Ok(option)
    }

    /// The currently selected option, if any.
    #[must_use]
    pub fn selected_option(&self) -> Option<&FreightOption> {
        self.selected.and_then(|i| self.options.get(i))
    }

    /// Whether a quote is currently held.
    #[must_use]
    pub fn has_quote(&self) -> bool {
        !self.options.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::postal::PostalAddress;

    /// Stub lookup returning a fixed resolution or a not-found error.
    struct StubLookup(Option<PostalAddress>);

    impl PostalLookup for StubLookup {
        async fn lookup(&self, code: &PostalCode) -> Result<PostalAddress, PostalError> {
            self.0
                .clone()
                .ok_or_else(|| PostalError::NotFound(code.as_str().to_owned()))
        }
    }

    fn sp_address() -> PostalAddress {
        PostalAddress {
            street: "Praça da Sé".to_owned(),
            neighborhood: "Sé".to_owned(),
            city: "São Paulo".to_owned(),
            region: "SP".to_owned(),
        }
    }

    fn filled_form() -> AddressForm {
        AddressForm {
            postal_code: "01001000".to_owned(),
            street: "Praça da Sé".to_owned(),
            number: "100".to_owned(),
            neighborhood: "Sé".to_owned(),
            city: "São Paulo".to_owned(),
            region: "SP".to_owned(),
            complement: None,
        }
    }

    #[test]
    fn test_near_freight_table() {
        let options = freight_table("SP");
        assert_eq!(options.len(), 3);

        let prices: Vec<i64> = options.iter().map(|o| o.price.minor_units()).collect();
        let days: Vec<u32> = options.iter().map(|o| o.delivery_days).collect();
        assert_eq!(prices, vec![1490, 2290, 3290]);
        assert_eq!(days, vec![5, 2, 1]);
    }

    #[test]
    fn test_far_freight_table() {
        let options = freight_table("AM");
        assert_eq!(options.len(), 3);

        let prices: Vec<i64> = options.iter().map(|o| o.price.minor_units()).collect();
        let days: Vec<u32> = options.iter().map(|o| o.delivery_days).collect();
        assert_eq!(prices, vec![1990, 2990, 3990]);
        assert_eq!(days, vec![8, 4, 2]);
    }

    #[test]
    fn test_freight_table_region_case_insensitive() {
        assert_eq!(freight_table("sp"), freight_table("SP"));
    }

    #[test]
    fn test_validate_required_fields() {
        let form = AddressForm {
            postal_code: "01001000".to_owned(),
            number: "42".to_owned(),
            ..AddressForm::default()
        };
        let errors = form.validate();

        assert!(errors.contains_key("street"));
        assert!(errors.contains_key("neighborhood"));
        assert!(errors.contains_key("city"));
        assert!(errors.contains_key("region"));
        assert!(!errors.contains_key("number"));
        assert!(!errors.contains_key("postal_code"));
    }

    #[test]
    fn test_validate_postal_code() {
        let mut form = filled_form();
        form.postal_code = "0100100".to_owned();
        assert!(form.validate().contains_key("postal_code"));
    }

    #[test]
    fn test_complement_is_optional() {
        assert!(filled_form().is_valid());
    }

    #[tokio::test]
    async fn test_compute_freight_rejects_short_code() {
        let estimator = ShippingEstimator::new(StubLookup(Some(sp_address())));
        let mut form = AddressForm {
            postal_code: "0100100".to_owned(),
            ..AddressForm::default()
        };

        let result = estimator.compute_freight(&mut form).await;
        assert!(matches!(result, Err(ShippingError::InvalidPostalCode(_))));
    }

    #[tokio::test]
    async fn test_compute_freight_unknown_code() {
        let estimator = ShippingEstimator::new(StubLookup(None));
        let mut form = AddressForm {
            postal_code: "99999999".to_owned(),
            ..AddressForm::default()
        };

        let result = estimator.compute_freight(&mut form).await;
        assert!(matches!(result, Err(ShippingError::PostalCodeNotFound(_))));
    }

    #[tokio::test]
    async fn test_compute_freight_backfills_only_blank_fields() {
        let estimator = ShippingEstimator::new(StubLookup(Some(sp_address())));
        let mut form = AddressForm {
            postal_code: "01001-000".to_owned(),
            street: "Rua do Shopper".to_owned(), // user input wins
            ..AddressForm::default()
        };

        let options = estimator.compute_freight(&mut form).await.unwrap();

        assert_eq!(form.postal_code, "01001000"); // normalized in place
        assert_eq!(form.street, "Rua do Shopper");
        assert_eq!(form.neighborhood, "Sé");
        assert_eq!(form.city, "São Paulo");
        assert_eq!(form.region, "SP");
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].price.minor_units(), 1490);
    }

    #[tokio::test]
    async fn test_compute_freight_far_region() {
        let estimator = ShippingEstimator::new(StubLookup(Some(PostalAddress {
            region: "BA".to_owned(),
            ..PostalAddress::default()
        })));
        let mut form = AddressForm {
            postal_code: "40020000".to_owned(),
            ..AddressForm::default()
        };

        let options = estimator.compute_freight(&mut form).await.unwrap();
        assert_eq!(options[0].price.minor_units(), 1990);
        assert_eq!(options[2].delivery_days, 2);
    }

    #[test]
    fn test_address_edit_invalidates_quote_and_selection() {
        let mut state = QuoteState::default();
        state.set_address(filled_form());
        state.record_options(freight_table("SP"));
        state.select(1).unwrap();
        assert!(state.selected_option().is_some());

        let mut edited = filled_form();
        edited.number = "101".to_owned();
        state.set_address(edited);

        assert!(!state.has_quote());
        assert!(state.selected_option().is_none());
    }

    #[test]
    fn test_unchanged_address_keeps_quote() {
        let mut state = QuoteState::default();
        state.set_address(filled_form());
        state.record_options(freight_table("SP"));
        state.select(0).unwrap();

        state.set_address(filled_form());
        assert!(state.has_quote());
        assert!(state.selected_option().is_some());
    }

    #[test]
    fn test_select_revalidates_address() {
        let mut state = QuoteState::default();
        state.set_address(filled_form());
        state.record_options(freight_table("SP"));
        state.select(0).unwrap();

        // Blank out a required field behind the quote's back.
        state.address.city = String::new();

        let result = state.select(0);
        assert!(matches!(result, Err(ShippingError::IncompleteAddress(_))));
        assert!(state.selected_option().is_none());
    }

    #[test]
    fn test_select_out_of_range() {
        let mut state = QuoteState::default();
        state.set_address(filled_form());
        state.record_options(freight_table("SP"));

        assert!(matches!(
            state.select(5),
            Err(ShippingError::NoSuchOption(5))
        ));
    }

    #[test]
    fn test_fresh_quote_discards_previous_selection() {
        let mut state = QuoteState::default();
        state.set_address(filled_form());
        state.record_options(freight_table("SP"));
        state.select(2).unwrap();

        state.record_options(freight_table("SP"));
        assert!(state.selected_option().is_none());
    }
}
