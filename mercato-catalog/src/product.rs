use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mercato_core::CoreResult;
use mercato_shared::Slug;

/// A catalog product as the order core sees it. The selling side (CRUD,
/// images, categories) is a separate service; only price and availability
/// cross this boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub slug: Slug,
    pub supermarket: Slug,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: u32,
    pub is_active: bool,
}

/// Read-only lookup into the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Resolve a product within one supermarket's catalog. A product that
    /// exists but belongs to a different supermarket is not found.
    async fn find_by_slug_and_market(
        &self,
        product: &Slug,
        supermarket: &Slug,
    ) -> CoreResult<ProductRecord>;
}
