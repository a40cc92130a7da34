//! Pricing/RFP decision routing.
//!
//! Classifies each requested product by catalog membership, stock and
//! approved price, validates the fields each action needs, and shapes the
//! payloads for the "save decision" and "raise RFP" workflows.

pub mod availability;
pub mod catalog;
pub mod router;
pub mod submission;
pub mod validation;

pub use availability::{
    classify_availability, AvailabilityClassifier, AvailabilityStatus,
    CatalogAvailabilityClassifier,
};
pub use catalog::Catalog;
pub use router::{
    ActionKind, ActionPayload, DecisionAction, DecisionRouter, PayloadItem, RoutedBatch,
    RoutedProduct, RoutingError, Selection,
};
pub use submission::DecisionSubmission;
pub use validation::{
    validate_delivery_timeline, Field, FieldError, FieldErrorCode, FieldValidator,
    ProductValidation, ValidationLimits,
};
