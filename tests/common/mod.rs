#![allow(dead_code)]

use async_trait::async_trait;
use food_match::api_connection::{CatalogClient, CatalogError, NutrientRecord, SearchHit, SearchRequest};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory catalog that counts calls.
#[derive(Default)]
pub struct FakeCatalog {
    pub foods: HashMap<String, Vec<SearchHit>>,
    pub nutrients: HashMap<String, Vec<NutrientRecord>>,
    pub broken_queries: HashSet<String>,
    pub search_calls: Arc<AtomicUsize>,
    pub fetch_calls: Arc<AtomicUsize>,
}

impl FakeCatalog {
    pub fn with_food(mut self, query: &str, hits: Vec<SearchHit>) -> Self {
        self.foods.insert(query.to_string(), hits);
        self
    }

    pub fn with_nutrients(mut self, id: &str, records: Vec<NutrientRecord>) -> Self {
        self.nutrients.insert(id.to_string(), records);
        self
    }

    pub fn with_broken_query(mut self, query: &str) -> Self {
        self.broken_queries.insert(query.to_string());
        self
    }

    pub fn counters(&self) -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        (self.search_calls.clone(), self.fetch_calls.clone())
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, CatalogError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.broken_queries.contains(&request.query) {
            return Err(CatalogError::MalformedResponse("search response has no 'foods' array".to_string()));
        }
        Ok(self.foods.get(&request.query).cloned().unwrap_or_default())
    }

    async fn fetch_nutrients(&self, candidate_id: &str) -> Result<Vec<NutrientRecord>, CatalogError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.nutrients
            .get(candidate_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(candidate_id.to_string()))
    }
}

pub fn hit(id: &str, description: &str, brand_owner: Option<&str>) -> SearchHit {
    SearchHit {
        id: id.to_string(),
        description: description.to_string(),
        brand_owner: brand_owner.map(String::from),
        data_type: if brand_owner.is_some() { "Branded" } else { "Foundation" }.to_string(),
    }
}

pub fn record(nutrient_id: u32, name: &str, unit: &str, amount: f64) -> NutrientRecord {
    NutrientRecord {
        nutrient_id,
        nutrient_name: name.to_string(),
        unit_name: unit.to_string(),
        amount,
    }
}

pub fn count(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Catalog with chicken, black beans and yogurt.
pub fn pantry() -> FakeCatalog {
    FakeCatalog::default()
        .with_food(
            "chicken breast",
            vec![
                hit("100", "Chicken, thigh, raw", None),
                hit("101", "Chicken, broilers or fryers, breast, meat only, raw", None),
                hit("102", "CHICKEN BREAST STRIPS", Some("Tyson")),
            ],
        )
        .with_food(
            "black beans",
            vec![
                hit("200", "Beans, black, mature seeds, cooked", None),
                hit("201", "Soup, black bean", None),
            ],
        )
        .with_food(
            "greek yogurt",
            vec![
                hit("300", "Yogurt, Greek, plain, nonfat", None),
                hit("301", "GREEK YOGURT", Some("Fage")),
            ],
        )
        .with_nutrients("101", vec![record(1003, "Protein", "G", 10.0), record(1008, "Energy", "KCAL", 120.0)])
        .with_nutrients("102", vec![record(1003, "Protein", "G", 18.0)])
        .with_nutrients("200", vec![record(1003, "Protein", "G", 20.0), record(1079, "Fiber, total dietary", "G", 8.7)])
        .with_nutrients("300", vec![record(1003, "Protein", "G", 10.2)])
        .with_nutrients("301", vec![record(1003, "Protein", "G", 9.0)])
}
