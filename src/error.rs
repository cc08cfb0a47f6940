use thiserror::Error;

use crate::api_connection::CatalogError;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("hybrid weight must be within [0, 1], got {0}")]
    InvalidWeight(f32),

    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("ingredient quantity must be a positive number of grams, got {0}")]
    InvalidQuantity(f64),

    #[error("no catalog match for '{0}'")]
    NotFound(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl SearchError {
    /// "No match" outcomes are reported to the user rather than treated as failures.
    pub fn is_no_match(&self) -> bool {
        matches!(
            self,
            SearchError::NotFound(_) | SearchError::Catalog(CatalogError::NotFound(_))
        )
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum NutrientError {
    #[error("cannot scale table '{source_id}': {reason}")]
    MissingReferenceNutrient { source_id: String, reason: String },
}
