use serde::{Deserialize, Serialize};

use crate::domain::lead::LeadId;
use crate::domain::product::{EnquiredProduct, Product};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub String);

/// An ordered set of requested products plus the fields shared by all of
/// them. Built by the caller, then routed and validated per action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionBatch {
    pub batch_id: BatchId,
    #[serde(default)]
    pub lead_id: Option<LeadId>,
    #[serde(default, deserialize_with = "enquired_products")]
    pub products: Vec<Product>,
    #[serde(default)]
    pub delivery_timeline: Option<String>,
    #[serde(default)]
    pub special_requirements: String,
}

impl DecisionBatch {
    pub fn new(batch_id: impl Into<String>, products: Vec<Product>) -> Self {
        Self {
            batch_id: BatchId(batch_id.into()),
            lead_id: None,
            products,
            delivery_timeline: None,
            special_requirements: String::new(),
        }
    }

    pub fn with_lead(mut self, lead_id: impl Into<String>) -> Self {
        self.lead_id = Some(LeadId(lead_id.into()));
        self
    }

    pub fn with_delivery_timeline(mut self, timeline: impl Into<String>) -> Self {
        self.delivery_timeline = Some(timeline.into());
        self
    }

    pub fn with_special_requirements(mut self, requirements: impl Into<String>) -> Self {
        self.special_requirements = requirements.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

fn enquired_products<'de, D>(deserializer: D) -> Result<Vec<Product>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let enquired = Vec::<EnquiredProduct>::deserialize(deserializer)?;
    Ok(enquired.into_iter().map(Product::from).collect())
}
