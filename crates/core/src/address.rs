//! South African shipping address form.
//!
//! [`validate`] is a pure function from a raw [`AddressDraft`] to either a
//! [`ShippingAddress`] or per-field messages. [`AddressForm`] wraps it with the
//! interactive behaviour: postal code sanitising, touched-field tracking so
//! errors only show after a field is left, and a change listener that is told
//! whether the address is currently valid.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::Province;

/// Country code of every shipping address.
pub const SOUTH_AFRICA: &str = "ZA";

/// Length of a South African postal code.
pub const POSTAL_CODE_LEN: usize = 4;

/// An editable address field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressField {
    Street,
    Suburb,
    City,
    Province,
    PostalCode,
}

impl AddressField {
    pub const ALL: [Self; 5] = [
        Self::Street,
        Self::Suburb,
        Self::City,
        Self::Province,
        Self::PostalCode,
    ];

    /// Message shown when the field fails validation.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Street => "Street address is required",
            Self::Suburb => "Suburb is required",
            Self::City => "City is required",
            Self::Province => "Province is required",
            Self::PostalCode => "Valid postal code is required",
        }
    }
}

/// Raw form input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressDraft {
    pub street: String,
    pub suburb: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
}

impl AddressDraft {
    fn field_mut(&mut self, field: AddressField) -> &mut String {
        match field {
            AddressField::Street => &mut self.street,
            AddressField::Suburb => &mut self.suburb,
            AddressField::City => &mut self.city,
            AddressField::Province => &mut self.province,
            AddressField::PostalCode => &mut self.postal_code,
        }
    }
}

impl From<&ShippingAddress> for AddressDraft {
    fn from(address: &ShippingAddress) -> Self {
        Self {
            street: address.street.clone(),
            suburb: address.suburb.clone(),
            city: address.city.clone(),
            province: address.province.to_string(),
            postal_code: address.postal_code.clone(),
        }
    }
}

/// A validated delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub street: String,
    pub suburb: String,
    pub city: String,
    pub province: Province,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    SOUTH_AFRICA.to_string()
}

/// Validation messages keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<AddressField, &'static str>);

impl FieldErrors {
    #[must_use]
    pub fn get(&self, field: AddressField) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AddressField, &'static str)> + '_ {
        self.0.iter().map(|(field, msg)| (*field, *msg))
    }

    /// Only the errors for fields in `touched`.
    #[must_use]
    pub fn visible(&self, touched: &BTreeSet<AddressField>) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(field, _)| touched.contains(field))
                .map(|(field, msg)| (*field, *msg))
                .collect(),
        )
    }
}

/// Strip non-digits and truncate to [`POSTAL_CODE_LEN`].
#[must_use]
pub fn sanitize_postal_code(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_digit)
        .take(POSTAL_CODE_LEN)
        .collect()
}

/// Validate a draft.
///
/// # Errors
///
/// Returns every failing field with its message.
pub fn validate(draft: &AddressDraft) -> Result<ShippingAddress, FieldErrors> {
    let mut errors = BTreeMap::new();

    let mut required = |field: AddressField, value: &str| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            errors.insert(field, field.message());
        }
        trimmed.to_string()
    };
    let street = required(AddressField::Street, &draft.street);
    let suburb = required(AddressField::Suburb, &draft.suburb);
    let city = required(AddressField::City, &draft.city);

    let province = draft.province.parse::<Province>().ok();
    if province.is_none() {
        errors.insert(AddressField::Province, AddressField::Province.message());
    }

    let postal_code = draft.postal_code.trim();
    let postal_ok = postal_code.len() == POSTAL_CODE_LEN && postal_code.bytes().all(|b| b.is_ascii_digit());
    if !postal_ok {
        errors.insert(AddressField::PostalCode, AddressField::PostalCode.message());
    }

    match province {
        Some(province) if errors.is_empty() => Ok(ShippingAddress {
            street,
            suburb,
            city,
            province,
            postal_code: postal_code.to_string(),
            country: default_country(),
        }),
        _ => Err(FieldErrors(errors)),
    }
}

/// Snapshot of the form for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressReport {
    /// The draft after input normalisation.
    pub address: AddressDraft,
    pub country: &'static str,
    pub is_valid: bool,
    /// Errors for touched fields only.
    pub errors: FieldErrors,
}

type ChangeListener = Box<dyn FnMut(&AddressDraft, bool) + Send + Sync>;

/// Interactive address form state.
pub struct AddressForm {
    draft: AddressDraft,
    touched: BTreeSet<AddressField>,
    disabled: bool,
    result: Result<ShippingAddress, FieldErrors>,
    on_change: Option<ChangeListener>,
}

impl core::fmt::Debug for AddressForm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AddressForm")
            .field("draft", &self.draft)
            .field("touched", &self.touched)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

impl Default for AddressForm {
    fn default() -> Self {
        Self::new(AddressDraft::default())
    }
}

impl AddressForm {
    /// Create a form prefilled with `initial`.
    #[must_use]
    pub fn new(mut initial: AddressDraft) -> Self {
        initial.postal_code = sanitize_postal_code(&initial.postal_code);
        let result = validate(&initial);
        Self {
            draft: initial,
            touched: BTreeSet::new(),
            disabled: false,
            result,
            on_change: None,
        }
    }

    /// Register the listener told `(draft, is_valid)` after every change.
    ///
    /// The listener is called once straight away with the prefilled state.
    #[must_use]
    pub fn on_change(mut self, mut listener: impl FnMut(&AddressDraft, bool) + Send + Sync + 'static) -> Self {
        listener(&self.draft, self.result.is_ok());
        self.on_change = Some(Box::new(listener));
        self
    }

    /// Disable or enable editing. A disabled form ignores changes.
    pub const fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Change one field and revalidate.
    pub fn set_field(&mut self, field: AddressField, value: &str) {
        if self.disabled {
            return;
        }
        let value = if field == AddressField::PostalCode {
            sanitize_postal_code(value)
        } else {
            value.to_string()
        };
        *self.draft.field_mut(field) = value;
        self.result = validate(&self.draft);

        let valid = self.result.is_ok();
        if let Some(listener) = self.on_change.as_mut() {
            listener(&self.draft, valid);
        }
    }

    /// Mark a field as touched (the user left it).
    pub fn touch(&mut self, field: AddressField) {
        self.touched.insert(field);
    }

    /// Mark every field touched, e.g. on submit.
    pub fn touch_all(&mut self) {
        self.touched.extend(AddressField::ALL);
    }

    #[must_use]
    pub const fn draft(&self) -> &AddressDraft {
        &self.draft
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.result.is_ok()
    }

    /// The validated address, if the form is valid.
    #[must_use]
    pub fn address(&self) -> Option<&ShippingAddress> {
        self.result.as_ref().ok()
    }

    /// Errors that should be shown now.
    #[must_use]
    pub fn visible_errors(&self) -> FieldErrors {
        match &self.result {
            Ok(_) => FieldErrors::default(),
            Err(errors) => errors.visible(&self.touched),
        }
    }

    #[must_use]
    pub fn report(&self) -> AddressReport {
        AddressReport {
            address: self.draft.clone(),
            country: SOUTH_AFRICA,
            is_valid: self.is_valid(),
            errors: self.visible_errors(),
        }
    }
}
