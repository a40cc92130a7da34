use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// A requested item inside a pricing/RFP decision batch.
///
/// `quantity`, `length` and `target_price` arrive as loosely formatted
/// numeric text and are only interpreted by the field validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_spec: String,
    #[serde(default, deserialize_with = "numeric_text")]
    pub quantity: Option<String>,
    #[serde(default, deserialize_with = "numeric_text")]
    pub length: Option<String>,
    #[serde(default, deserialize_with = "numeric_text")]
    pub target_price: Option<String>,
    #[serde(default)]
    pub stock_status: Option<StockStatus>,
    #[serde(default)]
    pub approved_price: Option<ApprovedPrice>,
}

impl Product {
    pub fn new(product_spec: impl Into<String>) -> Self {
        Self {
            product_spec: product_spec.into(),
            quantity: None,
            length: None,
            target_price: None,
            stock_status: None,
            approved_price: None,
        }
    }

    pub fn with_quantity(mut self, quantity: impl Into<String>) -> Self {
        self.quantity = Some(quantity.into());
        self
    }

    pub fn with_length(mut self, length: impl Into<String>) -> Self {
        self.length = Some(length.into());
        self
    }

    pub fn with_target_price(mut self, target_price: impl Into<String>) -> Self {
        self.target_price = Some(target_price.into());
        self
    }

    pub fn with_stock(mut self, status: StockState, quantity: Decimal) -> Self {
        self.stock_status = Some(StockStatus { status, quantity });
        self
    }

    pub fn with_approved_price(mut self, unit_price: Decimal) -> Self {
        self.approved_price = Some(ApprovedPrice { unit_price });
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockState {
    Available,
    Limited,
    OutOfStock,
    OnOrder,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockStatus {
    pub status: StockState,
    #[serde(default)]
    pub quantity: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedPrice {
    pub unit_price: Decimal,
}

/// Ingestion shape for enquired products: either a bare product spec or a
/// full line item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnquiredProduct {
    Spec(String),
    Item(Product),
}

impl From<EnquiredProduct> for Product {
    fn from(value: EnquiredProduct) -> Self {
        match value {
            EnquiredProduct::Spec(spec) => Product::new(spec),
            EnquiredProduct::Item(product) => product,
        }
    }
}

fn numeric_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(raw.map(|value| match value {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    }))
}
