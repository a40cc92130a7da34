//! Partitions a decision batch and gates the two downstream actions.
//!
//! A batch can feed both workflows: "Save Decision" takes only priced catalog
//! products, "Raise RFP" takes only the rest. Neither action consumes the
//! other's products, so one batch can be saved and raised without re-entry.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::decision::{BatchId, DecisionBatch};
use crate::domain::lead::LeadId;
use crate::domain::product::Product;

use super::availability::{AvailabilityClassifier, AvailabilityStatus};
use super::validation::{parse_date, validate_delivery_timeline, FieldError, FieldValidator};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutedProduct {
    pub index: usize,
    pub product: Product,
    pub availability: AvailabilityStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutedBatch {
    pub batch_id: BatchId,
    pub saveable: Vec<RoutedProduct>,
    pub rfp_required: Vec<RoutedProduct>,
}

impl RoutedBatch {
    pub fn len(&self) -> usize {
        self.saveable.len() + self.rfp_required.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn availability_of(&self, index: usize) -> Option<AvailabilityStatus> {
        self.saveable
            .iter()
            .chain(self.rfp_required.iter())
            .find(|routed| routed.index == index)
            .map(|routed| routed.availability)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    SaveDecision,
    RaiseRfp,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SaveDecision => f.write_str("save_decision"),
            Self::RaiseRfp => f.write_str("raise_rfp"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "indices", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    AllSaveable,
    Indices(Vec<usize>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DecisionAction {
    SaveDecision {
        #[serde(default)]
        selection: Selection,
    },
    RaiseRfp,
}

impl DecisionAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::SaveDecision { .. } => ActionKind::SaveDecision,
            Self::RaiseRfp => ActionKind::RaiseRfp,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoutingError {
    #[error("decision batch has no products")]
    EmptyBatch,
    #[error("no products are eligible for {action}")]
    NoEligibleProducts { action: ActionKind },
    #[error("products {indices:?} need RFP approval and cannot be saved as a decision")]
    SelectionRequiresRfp { indices: Vec<usize> },
    #[error("selected product {index} is outside the batch of {len} products")]
    InvalidSelection { index: usize, len: usize },
    #[error("{} field error(s) block submission", .errors.len())]
    Validation { errors: Vec<FieldError> },
}

impl RoutingError {
    /// Single general message suitable for the submitting user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyBatch => "Add at least one product before submitting.",
            Self::NoEligibleProducts { action: ActionKind::SaveDecision } => {
                "No products have approved pricing. Raise an RFP instead."
            }
            Self::NoEligibleProducts { action: ActionKind::RaiseRfp } => {
                "All products already have approved pricing. Save the decision instead."
            }
            Self::SelectionRequiresRfp { .. } => {
                "Some selected products need pricing approval. Raise an RFP for them first."
            }
            Self::InvalidSelection { .. } => "The product selection does not match this batch.",
            Self::Validation { .. } => "Fix the highlighted fields and try again.",
        }
    }

    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation { errors } => errors,
            _ => &[],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadItem {
    pub index: usize,
    pub product_spec: String,
    pub availability: AvailabilityStatus,
    pub quantity: Option<Decimal>,
    pub length: Option<Decimal>,
    pub target_price: Option<Decimal>,
    pub approved_unit_price: Option<Decimal>,
}

/// Validated, ready-to-send payload for one action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPayload {
    pub action: ActionKind,
    pub batch_id: BatchId,
    pub lead_id: Option<LeadId>,
    pub delivery_timeline: Option<NaiveDate>,
    pub special_requirements: String,
    pub items: Vec<PayloadItem>,
}

impl ActionPayload {
    pub fn indices(&self) -> Vec<usize> {
        self.items.iter().map(|item| item.index).collect()
    }
}

pub struct DecisionRouter<A> {
    classifier: A,
    validator: FieldValidator,
}

impl<A> DecisionRouter<A>
where
    A: AvailabilityClassifier,
{
    pub fn new(classifier: A, validator: FieldValidator) -> Self {
        Self { classifier, validator }
    }

    pub fn classifier(&self) -> &A {
        &self.classifier
    }

    pub fn route(&self, batch: &DecisionBatch) -> RoutedBatch {
        let mut routed = RoutedBatch {
            batch_id: batch.batch_id.clone(),
            saveable: Vec::new(),
            rfp_required: Vec::new(),
        };

        for (index, product) in batch.products.iter().enumerate() {
            let availability = self.classifier.classify(product);
            debug!(
                event_name = "engine.rfp.product_classified",
                batch_id = %batch.batch_id.0,
                index,
                availability = availability.as_str(),
                "product classified"
            );

            let entry = RoutedProduct { index, product: product.clone(), availability };
            if availability.requires_rfp() {
                routed.rfp_required.push(entry);
            } else {
                routed.saveable.push(entry);
            }
        }

        routed
    }

    pub fn execute(
        &self,
        batch: &DecisionBatch,
        action: &DecisionAction,
        today: NaiveDate,
    ) -> Result<ActionPayload, RoutingError> {
        let result = match action {
            DecisionAction::SaveDecision { selection } => {
                self.save_decision(batch, selection, today)
            }
            DecisionAction::RaiseRfp => self.raise_rfp(batch, today),
        };

        match &result {
            Ok(payload) => info!(
                event_name = "engine.rfp.action_accepted",
                batch_id = %batch.batch_id.0,
                action = %action.kind(),
                items = payload.items.len(),
                "decision action accepted"
            ),
            Err(error) => warn!(
                event_name = "engine.rfp.action_rejected",
                batch_id = %batch.batch_id.0,
                action = %action.kind(),
                error = %error,
                "decision action rejected"
            ),
        }

        result
    }

    pub fn save_decision(
        &self,
        batch: &DecisionBatch,
        selection: &Selection,
        today: NaiveDate,
    ) -> Result<ActionPayload, RoutingError> {
        if batch.is_empty() {
            return Err(RoutingError::EmptyBatch);
        }

        let routed = self.route(batch);
        let selected: Vec<&RoutedProduct> = match selection {
            Selection::AllSaveable => routed.saveable.iter().collect(),
            Selection::Indices(indices) => {
                let mut indices = indices.clone();
                indices.sort_unstable();
                indices.dedup();

                if let Some(&index) = indices.iter().find(|&&index| index >= batch.products.len())
                {
                    return Err(RoutingError::InvalidSelection {
                        index,
                        len: batch.products.len(),
                    });
                }

                let needs_rfp: Vec<usize> = routed
                    .rfp_required
                    .iter()
                    .map(|routed| routed.index)
                    .filter(|index| indices.contains(index))
                    .collect();
                if !needs_rfp.is_empty() {
                    return Err(RoutingError::SelectionRequiresRfp { indices: needs_rfp });
                }

                routed.saveable.iter().filter(|routed| indices.contains(&routed.index)).collect()
            }
        };

        if selected.is_empty() {
            return Err(RoutingError::NoEligibleProducts { action: ActionKind::SaveDecision });
        }

        self.build_payload(ActionKind::SaveDecision, batch, &selected, false, today)
    }

    pub fn raise_rfp(
        &self,
        batch: &DecisionBatch,
        today: NaiveDate,
    ) -> Result<ActionPayload, RoutingError> {
        if batch.is_empty() {
            return Err(RoutingError::EmptyBatch);
        }

        let routed = self.route(batch);
        if routed.rfp_required.is_empty() {
            return Err(RoutingError::NoEligibleProducts { action: ActionKind::RaiseRfp });
        }

        let selected: Vec<&RoutedProduct> = routed.rfp_required.iter().collect();
        self.build_payload(ActionKind::RaiseRfp, batch, &selected, true, today)
    }

    fn build_payload(
        &self,
        action: ActionKind,
        batch: &DecisionBatch,
        selected: &[&RoutedProduct],
        needs_rfp: bool,
        today: NaiveDate,
    ) -> Result<ActionPayload, RoutingError> {
        let mut errors = Vec::new();
        let mut items = Vec::with_capacity(selected.len());

        for routed in selected {
            let validation = self.validator.validate(&routed.product, needs_rfp);
            if !validation.valid {
                errors.extend(validation.into_errors(routed.index));
                continue;
            }

            items.push(PayloadItem {
                index: routed.index,
                product_spec: routed.product.product_spec.trim().to_string(),
                availability: routed.availability,
                quantity: validation.values.quantity,
                length: validation.values.length,
                target_price: validation.values.target_price,
                approved_unit_price: routed
                    .product
                    .approved_price
                    .as_ref()
                    .map(|price| price.unit_price),
            });
        }

        // Saved decisions treat the delivery date as optional; RFPs need it
        // to quote lead times.
        errors.extend(validate_delivery_timeline(
            batch.delivery_timeline.as_deref(),
            needs_rfp,
            today,
        ));

        if !errors.is_empty() {
            return Err(RoutingError::Validation { errors });
        }

        Ok(ActionPayload {
            action,
            batch_id: batch.batch_id.clone(),
            lead_id: batch.lead_id.clone(),
            delivery_timeline: batch
                .delivery_timeline
                .as_deref()
                .map(str::trim)
                .and_then(parse_date),
            special_requirements: batch.special_requirements.trim().to_string(),
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{ActionKind, DecisionAction, DecisionRouter, RoutingError, Selection};
    use crate::domain::decision::DecisionBatch;
    use crate::domain::product::{Product, StockState};
    use crate::rfp::availability::{AvailabilityStatus, CatalogAvailabilityClassifier};
    use crate::rfp::catalog::Catalog;
    use crate::rfp::validation::{Field, FieldValidator};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 20).expect("valid date")
    }

    fn router() -> DecisionRouter<CatalogAvailabilityClassifier> {
        DecisionRouter::new(
            CatalogAvailabilityClassifier::new(Catalog::new([
                "XLPE Cable 4C",
                "Copper Busbar 50x6",
                "PVC Insulated Wire 2.5 sqmm",
            ])),
            FieldValidator::default(),
        )
    }

    fn priced(spec: &str) -> Product {
        Product::new(spec)
            .with_quantity("10")
            .with_length("100")
            .with_approved_price(Decimal::new(45_000, 2))
    }

    fn mixed_batch() -> DecisionBatch {
        DecisionBatch::new(
            "B-1",
            vec![
                priced("XLPE Cable 4C"),
                Product::new("Custom fire-survival cable").with_length("400"),
                priced("Copper Busbar 50x6").with_stock(StockState::OutOfStock, Decimal::ZERO),
                Product::new("PVC Insulated Wire 2.5 sqmm")
                    .with_length("900")
                    .with_stock(StockState::Available, Decimal::from(20)),
            ],
        )
        .with_lead("L-9")
        .with_delivery_timeline("2026-04-15")
    }

    #[test]
    fn partition_covers_every_product_exactly_once() {
        let batch = mixed_batch();
        let routed = router().route(&batch);

        let mut indices: Vec<usize> = routed
            .saveable
            .iter()
            .chain(routed.rfp_required.iter())
            .map(|routed| routed.index)
            .collect();
        indices.sort_unstable();

        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(routed.len(), batch.products.len());
        assert_eq!(
            routed.saveable.iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![0, 2],
            "approved price keeps out-of-stock product saveable"
        );
        assert_eq!(
            routed.availability_of(1),
            Some(AvailabilityStatus::CustomProductPricingNeeded)
        );
        assert_eq!(routed.availability_of(3), Some(AvailabilityStatus::InStockPriceUnavailable));
    }

    #[test]
    fn in_stock_unpriced_catalog_product_is_routed_to_rfp() {
        let batch = DecisionBatch::new(
            "B-xlpe",
            vec![
                Product::new("XLPE Cable 4C").with_stock(StockState::Available, Decimal::from(500))
            ],
        );

        let routed = router().route(&batch);
        assert!(routed.saveable.is_empty());
        assert_eq!(
            routed.rfp_required[0].availability,
            AvailabilityStatus::InStockPriceUnavailable
        );
    }

    #[test]
    fn empty_batch_blocks_both_actions() {
        let batch = DecisionBatch::new("B-empty", Vec::new());
        let router = router();

        assert_eq!(
            router.save_decision(&batch, &Selection::AllSaveable, today()),
            Err(RoutingError::EmptyBatch)
        );
        assert_eq!(router.raise_rfp(&batch, today()), Err(RoutingError::EmptyBatch));
    }

    #[test]
    fn save_decision_takes_only_saveable_products() {
        let payload = router()
            .save_decision(&mixed_batch(), &Selection::AllSaveable, today())
            .expect("saveable subset is valid");

        assert_eq!(payload.action, ActionKind::SaveDecision);
        assert_eq!(payload.indices(), vec![0, 2]);
        assert_eq!(payload.items[0].approved_unit_price, Some(Decimal::new(45_000, 2)));
        assert_eq!(payload.items[0].quantity, Some(Decimal::from(10)));
        assert_eq!(payload.delivery_timeline, NaiveDate::from_ymd_opt(2026, 4, 15));
        assert_eq!(payload.lead_id.as_ref().map(|id| id.0.as_str()), Some("L-9"));
    }

    #[test]
    fn raise_rfp_leaves_saveable_products_untouched() {
        let batch = mixed_batch();
        let payload = router().raise_rfp(&batch, today()).expect("rfp subset is valid");

        assert_eq!(payload.action, ActionKind::RaiseRfp);
        assert_eq!(payload.indices(), vec![1, 3]);
        assert_eq!(payload.items[0].availability, AvailabilityStatus::CustomProductPricingNeeded);
        assert_eq!(payload.items[1].availability, AvailabilityStatus::InStockPriceUnavailable);

        let save = router()
            .save_decision(&batch, &Selection::AllSaveable, today())
            .expect("save still possible after raising rfp");
        assert_eq!(save.indices(), vec![0, 2]);
    }

    #[test]
    fn save_rejects_selection_containing_rfp_products() {
        let result = router().save_decision(
            &mixed_batch(),
            &Selection::Indices(vec![0, 1, 3, 1]),
            today(),
        );
        assert_eq!(result, Err(RoutingError::SelectionRequiresRfp { indices: vec![1, 3] }));

        let subset = router()
            .save_decision(&mixed_batch(), &Selection::Indices(vec![2]), today())
            .expect("priced subset");
        assert_eq!(subset.indices(), vec![2]);
    }

    #[test]
    fn save_rejects_out_of_range_selection() {
        let result =
            router().save_decision(&mixed_batch(), &Selection::Indices(vec![0, 9]), today());
        assert_eq!(result, Err(RoutingError::InvalidSelection { index: 9, len: 4 }));
    }

    #[test]
    fn no_eligible_products_distinguishes_the_two_actions() {
        let all_rfp = DecisionBatch::new("B-rfp", vec![Product::new("Custom").with_length("5")]);
        let save = router().save_decision(&all_rfp, &Selection::AllSaveable, today());
        assert_eq!(
            save,
            Err(RoutingError::NoEligibleProducts { action: ActionKind::SaveDecision })
        );

        let all_priced = DecisionBatch::new("B-priced", vec![priced("XLPE Cable 4C")]);
        let rfp = router().raise_rfp(&all_priced, today());
        let error = rfp.expect_err("nothing to raise");
        assert_eq!(error, RoutingError::NoEligibleProducts { action: ActionKind::RaiseRfp });
        assert_ne!(
            error.user_message(),
            RoutingError::NoEligibleProducts { action: ActionKind::SaveDecision }.user_message()
        );
    }

    #[test]
    fn validation_errors_are_collected_across_products_and_batch() {
        let batch = DecisionBatch::new(
            "B-bad",
            vec![
                Product::new("Custom A"),
                Product::new("Custom B").with_length("0"),
                Product::new("XLPE Cable 4C").with_length("12"),
            ],
        );

        let error = router().raise_rfp(&batch, today()).expect_err("invalid rfp");
        let errors = error.field_errors();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.product_index == Some(0) && e.field == Field::Length));
        assert!(errors.iter().any(|e| e.product_index == Some(1) && e.field == Field::Length));
        assert!(errors
            .iter()
            .any(|e| e.product_index.is_none() && e.field == Field::DeliveryTimeline));
    }

    #[test]
    fn save_validates_supplied_delivery_timeline() {
        let batch = DecisionBatch::new("B-late", vec![priced("XLPE Cable 4C")])
            .with_delivery_timeline("2026-03-01");

        let save = DecisionAction::SaveDecision { selection: Selection::AllSaveable };
        let error = router().execute(&batch, &save, today()).expect_err("past delivery date");
        assert_eq!(error.field_errors()[0].field, Field::DeliveryTimeline);

        let undated = DecisionBatch::new("B-undated", vec![priced("XLPE Cable 4C")]);
        assert!(router().execute(&undated, &save, today()).is_ok());
    }

    #[test]
    fn actions_deserialize_from_tagged_json() {
        let save: DecisionAction =
            serde_json::from_str(r#"{"action":"save_decision"}"#).expect("save json");
        assert_eq!(save, DecisionAction::SaveDecision { selection: Selection::AllSaveable });

        let picked: DecisionAction = serde_json::from_str(
            r#"{"action":"save_decision","selection":{"kind":"indices","indices":[0,2]}}"#,
        )
        .expect("selection json");
        assert_eq!(
            picked,
            DecisionAction::SaveDecision { selection: Selection::Indices(vec![0, 2]) }
        );

        let rfp: DecisionAction = serde_json::from_str(r#"{"action":"raise_rfp"}"#).expect("rfp");
        assert_eq!(rfp.kind(), ActionKind::RaiseRfp);
    }
}
