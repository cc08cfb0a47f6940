use serde::{Deserialize, Serialize};
use tracing::debug;

use super::connection::CatalogError;
use crate::models::Candidate;
use crate::nutrients::NutrientEntry;

pub const USDA_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";
pub const BRANDED_DATA_TYPE: &str = "Branded";

/// What the core asks the catalog for.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub branded_only: Option<bool>,
    pub page_size: u32,
}

/// One search hit, validated.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub description: String,
    pub brand_owner: Option<String>,
    pub data_type: String,
}

impl SearchHit {
    pub fn into_candidate(self, raw_source_rank: usize) -> Candidate {
        let is_branded = self.data_type == BRANDED_DATA_TYPE || self.brand_owner.is_some();
        Candidate {
            id: self.id,
            description: self.description,
            is_branded,
            raw_source_rank,
            brand_owner: self.brand_owner,
            data_type: self.data_type,
        }
    }
}

/// One nutrient fact for a catalog record, validated.
#[derive(Debug, Clone, PartialEq)]
pub struct NutrientRecord {
    pub nutrient_id: u32,
    pub nutrient_name: String,
    pub unit_name: String,
    pub amount: f64,
}

impl From<NutrientRecord> for NutrientEntry {
    fn from(record: NutrientRecord) -> Self {
        NutrientEntry {
            nutrient_id: record.nutrient_id,
            name: record.nutrient_name,
            unit: record.unit_name,
            amount_per_100g: record.amount,
        }
    }
}

// FoodData Central wire format. Everything is optional here so that a missing
// field becomes a `MalformedResponse` naming it, not a generic decode error.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FdcSearchBody {
    pub query: String,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<Vec<String>>,
}

impl From<&SearchRequest> for FdcSearchBody {
    fn from(request: &SearchRequest) -> Self {
        Self {
            query: request.query.clone(),
            page_size: request.page_size,
            data_type: match request.branded_only {
                Some(true) => Some(vec![BRANDED_DATA_TYPE.to_string()]),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FdcSearchResponse {
    pub foods: Option<Vec<FdcSearchFood>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FdcSearchFood {
    pub fdc_id: Option<u64>,
    pub description: Option<String>,
    pub brand_owner: Option<String>,
    pub data_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FdcFoodDetails {
    pub food_nutrients: Option<Vec<FdcFoodNutrient>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FdcFoodNutrient {
    pub nutrient: Option<FdcNutrient>,
    pub amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FdcNutrient {
    pub id: Option<u32>,
    pub name: Option<String>,
    pub unit_name: Option<String>,
}

fn required<T>(value: Option<T>, what: &str, position: usize) -> Result<T, CatalogError> {
    value.ok_or_else(|| CatalogError::MalformedResponse(format!("{} missing at position {}", what, position)))
}

impl FdcSearchResponse {
    pub fn validate(self) -> Result<Vec<SearchHit>, CatalogError> {
        let foods = self
            .foods
            .ok_or_else(|| CatalogError::MalformedResponse("search response has no 'foods' array".to_string()))?;

        foods
            .into_iter()
            .enumerate()
            .map(|(i, food)| {
                Ok(SearchHit {
                    id: required(food.fdc_id, "fdcId", i)?.to_string(),
                    description: required(food.description, "description", i)?,
                    brand_owner: food.brand_owner.filter(|b| !b.trim().is_empty()),
                    data_type: required(food.data_type, "dataType", i)?,
                })
            })
            .collect()
    }
}

impl FdcFoodDetails {
    /// Nutrient rows without an `amount` are category headers in FoodData
    /// Central and are skipped; anything else missing is malformed.
    pub fn validate(self) -> Result<Vec<NutrientRecord>, CatalogError> {
        let rows = self.food_nutrients.ok_or_else(|| {
            CatalogError::MalformedResponse("food response has no 'foodNutrients' array".to_string())
        })?;

        let mut records = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            let nutrient = required(row.nutrient, "nutrient", i)?;
            let nutrient_id = required(nutrient.id, "nutrient.id", i)?;
            let Some(amount) = row.amount else {
                debug!(nutrient_id, "skipping nutrient row without amount");
                continue;
            };
            if !amount.is_finite() || amount < 0.0 {
                return Err(CatalogError::MalformedResponse(format!(
                    "nutrient {} has invalid amount {}",
                    nutrient_id, amount
                )));
            }
            records.push(NutrientRecord {
                nutrient_id,
                nutrient_name: required(nutrient.name, "nutrient.name", i)?,
                unit_name: required(nutrient.unit_name, "nutrient.unitName", i)?,
                amount,
            });
        }
        Ok(records)
    }
}
