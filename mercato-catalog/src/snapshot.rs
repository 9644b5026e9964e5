use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::product::ProductCatalog;
use mercato_core::{CoreError, CoreResult};
use mercato_shared::Slug;

/// Unit price captured for one order line at checkout. Once captured, the
/// price never tracks the live catalog again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceSnapshot {
    pub product: Slug,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl PriceSnapshot {
    pub fn line_total_cents(&self) -> i64 {
        i64::from(self.quantity) * self.unit_price_cents
    }
}

/// Resolves price and availability at order time. Read-only: called once
/// per line item while the order is being assembled, never afterwards.
pub struct SnapshotProvider {
    catalog: Arc<dyn ProductCatalog>,
}

impl SnapshotProvider {
    pub fn new(catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn quote(
        &self,
        supermarket: &Slug,
        product: &Slug,
        quantity: u32,
    ) -> CoreResult<PriceSnapshot> {
        if quantity == 0 {
            return Err(CoreError::Validation(format!(
                "quantity for product {product} must be positive"
            )));
        }

        let record = self
            .catalog
            .find_by_slug_and_market(product, supermarket)
            .await?;

        if !record.is_active {
            return Err(CoreError::Validation(format!(
                "product {product} is no longer sold"
            )));
        }
        if record.price_cents < 0 {
            return Err(CoreError::Validation(format!(
                "product {product} has an invalid price"
            )));
        }

        Ok(PriceSnapshot {
            product: record.slug,
            product_name: record.name,
            quantity,
            unit_price_cents: record.price_cents,
        })
    }
}
