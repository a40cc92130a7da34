//! Write-path validation of RFP line items.
//!
//! Direct decisions and RFP requests need different fields: a saved decision
//! commits to a quantity and a whole-number target price, an RFP only needs
//! the length to price against. Every failure is reported per field; the
//! validator never short-circuits on the first one.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::Product;

pub const DEFAULT_MAX_PRODUCT_SPEC_CHARS: usize = 500;
pub const DEFAULT_MAX_LENGTH: u32 = 999_999;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ProductSpec,
    Quantity,
    Length,
    TargetPrice,
    DeliveryTimeline,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProductSpec => "product_spec",
            Self::Quantity => "quantity",
            Self::Length => "length",
            Self::TargetPrice => "target_price",
            Self::DeliveryTimeline => "delivery_timeline",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorCode {
    Required,
    TooLong,
    NotANumber,
    NotPositive,
    NotWholeNumber,
    OutOfRange,
    InvalidDate,
    DateInPast,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Batch position of the offending product; `None` for batch-level fields.
    pub product_index: Option<usize>,
    pub field: Field,
    pub code: FieldErrorCode,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, code: FieldErrorCode, message: impl Into<String>) -> Self {
        Self { product_index: None, field, code, message: message.into() }
    }

    pub fn at(mut self, index: usize) -> Self {
        self.product_index = Some(index);
        self
    }
}

/// Numeric fields as parsed during validation. Only meaningful when the
/// validation is `valid`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFields {
    pub quantity: Option<Decimal>,
    pub length: Option<Decimal>,
    pub target_price: Option<Decimal>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductValidation {
    pub valid: bool,
    pub field_errors: BTreeMap<Field, FieldError>,
    pub values: ParsedFields,
}

impl ProductValidation {
    fn from_errors(errors: Vec<FieldError>, values: ParsedFields) -> Self {
        let field_errors: BTreeMap<_, _> =
            errors.into_iter().map(|error| (error.field, error)).collect();
        Self { valid: field_errors.is_empty(), field_errors, values }
    }

    pub fn error(&self, field: Field) -> Option<&FieldError> {
        self.field_errors.get(&field)
    }

    /// Flattens into batch-scoped errors tagged with the product's position.
    pub fn into_errors(self, index: usize) -> Vec<FieldError> {
        self.field_errors.into_values().map(|error| error.at(index)).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationLimits {
    pub max_product_spec_chars: usize,
    pub max_length: u32,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_product_spec_chars: DEFAULT_MAX_PRODUCT_SPEC_CHARS,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldValidator {
    limits: ValidationLimits,
}

impl FieldValidator {
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> ValidationLimits {
        self.limits
    }

    pub fn validate(&self, product: &Product, needs_rfp: bool) -> ProductValidation {
        let mut errors = Vec::new();
        let mut values = ParsedFields::default();

        if let Some(error) = self.check_product_spec(&product.product_spec) {
            errors.push(error);
        }

        let length = if needs_rfp {
            let max_length = Decimal::from(self.limits.max_length);
            required_positive(Field::Length, product.length.as_deref())
                .and_then(|length| at_most(Field::Length, length, max_length))
        } else {
            required_positive(Field::Length, product.length.as_deref())
        };
        let quantity = if needs_rfp {
            optional_positive(Field::Quantity, product.quantity.as_deref())
        } else {
            required_positive(Field::Quantity, product.quantity.as_deref()).map(Some)
        };
        let target_price = optional_positive(Field::TargetPrice, product.target_price.as_deref())
            .and_then(|price| match price {
                Some(price) if !needs_rfp => whole_number(Field::TargetPrice, price).map(Some),
                other => Ok(other),
            });

        match quantity {
            Ok(value) => values.quantity = value,
            Err(error) => errors.push(error),
        }
        match length {
            Ok(value) => values.length = Some(value),
            Err(error) => errors.push(error),
        }
        match target_price {
            Ok(value) => values.target_price = value,
            Err(error) => errors.push(error),
        }

        ProductValidation::from_errors(errors, values)
    }

    fn check_product_spec(&self, product_spec: &str) -> Option<FieldError> {
        let trimmed = product_spec.trim();
        if trimmed.is_empty() {
            return Some(FieldError::new(
                Field::ProductSpec,
                FieldErrorCode::Required,
                "Product specification is required",
            ));
        }

        let max = self.limits.max_product_spec_chars;
        if trimmed.chars().count() > max {
            return Some(FieldError::new(
                Field::ProductSpec,
                FieldErrorCode::TooLong,
                format!("Product specification must be at most {max} characters"),
            ));
        }

        None
    }
}

/// Checks the batch delivery date. A supplied value is always checked; a
/// missing one only fails when the action requires it.
pub fn validate_delivery_timeline(
    raw: Option<&str>,
    required: bool,
    today: NaiveDate,
) -> Option<FieldError> {
    let raw = raw.map(str::trim).filter(|value| !value.is_empty());
    let Some(raw) = raw else {
        return required.then(|| {
            FieldError::new(
                Field::DeliveryTimeline,
                FieldErrorCode::Required,
                "Delivery timeline is required",
            )
        });
    };

    let Some(date) = parse_date(raw) else {
        return Some(FieldError::new(
            Field::DeliveryTimeline,
            FieldErrorCode::InvalidDate,
            format!("Delivery timeline `{raw}` is not a valid date"),
        ));
    };

    if date < today {
        return Some(FieldError::new(
            Field::DeliveryTimeline,
            FieldErrorCode::DateInPast,
            "Delivery timeline cannot be in the past",
        ));
    }

    None
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|value| value.date_naive()))
}

fn parse_number(field: Field, raw: &str) -> Result<Decimal, FieldError> {
    Decimal::from_str(raw).map_err(|_| {
        FieldError::new(
            field,
            FieldErrorCode::NotANumber,
            format!("{} must be a number", label(field)),
        )
    })
}

fn positive(field: Field, raw: &str) -> Result<Decimal, FieldError> {
    let value = parse_number(field, raw)?;
    if value <= Decimal::ZERO {
        return Err(FieldError::new(
            field,
            FieldErrorCode::NotPositive,
            format!("{} must be greater than zero", label(field)),
        ));
    }
    Ok(value)
}

fn required_positive(field: Field, raw: Option<&str>) -> Result<Decimal, FieldError> {
    match present(raw) {
        Some(raw) => positive(field, raw),
        None => Err(FieldError::new(
            field,
            FieldErrorCode::Required,
            format!("{} is required", label(field)),
        )),
    }
}

fn optional_positive(field: Field, raw: Option<&str>) -> Result<Option<Decimal>, FieldError> {
    present(raw).map(|raw| positive(field, raw)).transpose()
}

fn at_most(field: Field, value: Decimal, max: Decimal) -> Result<Decimal, FieldError> {
    if value > max {
        return Err(FieldError::new(
            field,
            FieldErrorCode::OutOfRange,
            format!("{} must be at most {max}", label(field)),
        ));
    }
    Ok(value)
}

fn whole_number(field: Field, value: Decimal) -> Result<Decimal, FieldError> {
    if !value.fract().is_zero() {
        return Err(FieldError::new(
            field,
            FieldErrorCode::NotWholeNumber,
            format!("{} must be a whole number", label(field)),
        ));
    }
    Ok(value)
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

fn label(field: Field) -> &'static str {
    match field {
        Field::ProductSpec => "Product specification",
        Field::Quantity => "Quantity",
        Field::Length => "Length",
        Field::TargetPrice => "Target price",
        Field::DeliveryTimeline => "Delivery timeline",
    }
}
