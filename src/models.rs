use serde::{Deserialize, Serialize};

use crate::nutrients::NutrientTable;

/// One catalog record returned by a search. `id` is the only stable join key
/// between search results and nutrient tables; descriptions may repeat.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub description: String,
    pub is_branded: bool,
    pub raw_source_rank: usize, // Position in the catalog response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_owner: Option<String>,
    #[serde(default)]
    pub data_type: String,
}

impl Candidate {
    /// Text the scorers compare the query against. Branded searches prefix the
    /// brand owner so "acme oat milk" can match on the brand too.
    pub fn comparison_text(&self, branded_only: bool) -> String {
        match (&self.brand_owner, branded_only) {
            (Some(owner), true) if !owner.trim().is_empty() => {
                format!("{} {}", owner.trim(), self.description)
            }
            _ => self.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub semantic_score: f32,
    pub lexical_score: f32,
    pub hybrid_score: f32,
}

/// A food the caller wants included at `grams`, filled in as the pipeline
/// resolves it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Ingredient {
    pub name: String,
    pub grams: f64,
    pub resolved_candidate: Option<Candidate>,
    pub nutrient_table: Option<NutrientTable>,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, grams: f64) -> Self {
        Self {
            name: name.into(),
            grams,
            resolved_candidate: None,
            nutrient_table: None,
        }
    }

    pub fn with_table(name: impl Into<String>, grams: f64, table: NutrientTable) -> Self {
        Self {
            name: name.into(),
            grams,
            resolved_candidate: None,
            nutrient_table: Some(table),
        }
    }

    /// Only finite, strictly positive masses take part in matching and aggregation.
    pub fn has_valid_quantity(&self) -> bool {
        self.grams.is_finite() && self.grams > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(brand_owner: Option<&str>) -> Candidate {
        Candidate {
            id: "1".to_string(),
            description: "Oat milk".to_string(),
            is_branded: brand_owner.is_some(),
            raw_source_rank: 0,
            brand_owner: brand_owner.map(String::from),
            data_type: "Branded".to_string(),
        }
    }

    #[test]
    fn test_comparison_text_prefixes_brand_owner_only_for_branded_search() {
        let c = candidate(Some("Oatly"));
        assert_eq!(c.comparison_text(true), "Oatly Oat milk");
        assert_eq!(c.comparison_text(false), "Oat milk");
        assert_eq!(candidate(None).comparison_text(true), "Oat milk");
    }
}
