pub mod api_connection;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingredient_loader;
pub mod matcher;
pub mod models;
pub mod nutrients;
pub mod search;

pub use error::{NutrientError, SearchError};
pub use matcher::{FoodMatcher, IngredientOutcome, IngredientResolver};
pub use models::{Candidate, Ingredient, ScoredCandidate};
