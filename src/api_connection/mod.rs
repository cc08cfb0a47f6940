pub mod connection;
pub mod endpoints;

use async_trait::async_trait;

pub use connection::{CatalogError, RetryPolicy, UsdaClient};
pub use endpoints::{NutrientRecord, SearchHit, SearchRequest};

/// The external food catalog. The core depends on this shape only.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Ordered search hits, best catalog match first.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, CatalogError>;

    /// Nutrient facts for one record; `NotFound` when the id is unknown.
    async fn fetch_nutrients(&self, candidate_id: &str) -> Result<Vec<NutrientRecord>, CatalogError>;
}
