pub mod aggregator;
pub mod preprocessor;
pub mod table;

pub use aggregator::{aggregate, compare_nutrient, nutritional_profile, NutritionalProfile};
pub use preprocessor::{per_kcal, preprocess, Reference};
pub use table::{nutrient_ids, NutrientEntry, NutrientTable, AGGREGATE_SOURCE_ID};
