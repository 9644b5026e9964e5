use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use mercato_catalog::{ProductCatalog, ProductRecord};
use mercato_core::{CoreError, CoreResult};
use mercato_shared::Slug;

/// In-memory product catalog standing in for the selling-side service.
pub struct InMemoryProductCatalog {
    products: RwLock<HashMap<Slug, ProductRecord>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self {
            products: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, product: ProductRecord) {
        self.products
            .write()
            .await
            .insert(product.slug.clone(), product);
    }

    /// Replace the live price; captured order snapshots must not follow it.
    pub async fn set_price(&self, slug: &Slug, price_cents: i64) -> CoreResult<()> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(slug)
            .ok_or_else(|| CoreError::not_found(format!("product {slug}")))?;
        product.price_cents = price_cents;
        Ok(())
    }
}

impl Default for InMemoryProductCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn find_by_slug_and_market(
        &self,
        product: &Slug,
        supermarket: &Slug,
    ) -> CoreResult<ProductRecord> {
        self.products
            .read()
            .await
            .get(product)
            .filter(|p| &p.supermarket == supermarket)
            .cloned()
            .ok_or_else(|| {
                CoreError::not_found(format!("product {product} in supermarket {supermarket}"))
            })
    }
}
