use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, StockState, StockStatus};

use super::catalog::Catalog;

/// Where a product stands on price and stock. Exactly one applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    /// Catalog product with an approved price; a decision can be saved.
    Priced,
    CustomProductPricingNeeded,
    InStockPriceUnavailable,
    NotInStockPriceUnavailable,
}

impl AvailabilityStatus {
    pub fn requires_rfp(self) -> bool {
        !matches!(self, Self::Priced)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Priced => "priced",
            Self::CustomProductPricingNeeded => "custom_product_pricing_needed",
            Self::InStockPriceUnavailable => "in_stock_price_unavailable",
            Self::NotInStockPriceUnavailable => "not_in_stock_price_unavailable",
        }
    }
}

pub trait AvailabilityClassifier: Send + Sync {
    fn classify(&self, product: &Product) -> AvailabilityStatus;
}

pub struct CatalogAvailabilityClassifier {
    catalog: Catalog,
}

impl CatalogAvailabilityClassifier {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl AvailabilityClassifier for CatalogAvailabilityClassifier {
    fn classify(&self, product: &Product) -> AvailabilityStatus {
        classify_availability(product, &self.catalog)
    }
}

/// Price governs routing; stock only decides which RFP reason is reported.
pub fn classify_availability(product: &Product, catalog: &Catalog) -> AvailabilityStatus {
    if catalog.is_custom(&product.product_spec) {
        return AvailabilityStatus::CustomProductPricingNeeded;
    }

    if product.approved_price.is_some() {
        return AvailabilityStatus::Priced;
    }

    if is_in_stock(product.stock_status.as_ref()) {
        AvailabilityStatus::InStockPriceUnavailable
    } else {
        AvailabilityStatus::NotInStockPriceUnavailable
    }
}

pub fn is_in_stock(stock: Option<&StockStatus>) -> bool {
    stock.is_some_and(|stock| {
        matches!(stock.status, StockState::Available | StockState::Limited)
            || stock.quantity > Decimal::ZERO
    })
}
