use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api_connection::{CatalogClient, SearchRequest};
use crate::error::{NutrientError, SearchError};
use crate::models::{Candidate, Ingredient, ScoredCandidate};
use crate::nutrients::{self, NutrientEntry, NutrientTable, Reference};
use crate::search::embedding_engine::DEFAULT_MODEL_LOAD_TIMEOUT;
use crate::search::hybrid_ranker::{validate_weight, HybridRanker, Ranking};
use crate::search::query_normalizer::{normalize, split_queries};
use crate::search::result_cache::{CacheKey, ResultCache};

/// Search, fetch and combine: the boundary used by the CLI.
pub struct FoodMatcher<C: CatalogClient> {
    catalog: C,
    ranker: HybridRanker,
    cache: Mutex<ResultCache>,
    page_size: u32,
    model_load_timeout: Duration,
}

impl<C: CatalogClient> FoodMatcher<C> {
    pub fn new(catalog: C, ranker: HybridRanker, cache: ResultCache, page_size: u32) -> Self {
        Self {
            catalog,
            ranker,
            cache: Mutex::new(cache),
            page_size: page_size.max(1),
            model_load_timeout: DEFAULT_MODEL_LOAD_TIMEOUT,
        }
    }

    /// How long the first search waits for the embedding model before ranking
    /// on lexical scores alone.
    pub fn with_model_load_timeout(mut self, timeout: Duration) -> Self {
        self.model_load_timeout = timeout;
        self
    }

    /// Candidates for an already-normalized query, from the cache when present.
    /// The catalog is always queried unfiltered so the ranker can fall back to
    /// generic records when no branded one exists. The cache key still carries
    /// `branded_only`, so the first branded and the first unbranded search for
    /// a query each reach the catalog once and store the same list.
    async fn candidates(&self, normalized_query: &str, branded_only: bool) -> Result<Vec<Candidate>, SearchError> {
        let key = CacheKey::new(normalized_query, branded_only);
        if let Some(cached) = self.cache.lock().await.get(&key) {
            debug!(query = normalized_query, branded_only, "search cache hit");
            return Ok(cached.to_vec());
        }

        let request = SearchRequest {
            query: normalized_query.to_string(),
            branded_only: None,
            page_size: self.page_size,
        };
        let hits = self.catalog.search(&request).await?;
        let candidates: Vec<Candidate> = hits
            .into_iter()
            .enumerate()
            .map(|(rank, hit)| hit.into_candidate(rank))
            .collect();
        info!(query = normalized_query, count = candidates.len(), "catalog search returned candidates");

        if let Err(e) = self.cache.lock().await.put(key, candidates.clone()) {
            warn!(error = %e, "could not persist search cache, continuing");
        }
        Ok(candidates)
    }

    /// All candidates for `food_name`, best first. An empty ranking means the
    /// catalog had nothing for the query.
    pub async fn search(&self, food_name: &str, alpha: f32, branded_only: bool) -> Result<Ranking, SearchError> {
        validate_weight(alpha)?;
        let query = normalize(food_name);
        if query.is_empty() {
            return Err(SearchError::NotFound(food_name.to_string()));
        }
        let candidates = self.candidates(&query, branded_only).await?;
        self.ranker.warm_up(self.model_load_timeout).await;
        self.ranker.rank(&query, &candidates, alpha, branded_only)
    }

    pub async fn best_match(&self, food_name: &str, alpha: f32, branded_only: bool) -> Result<ScoredCandidate, SearchError> {
        let ranking = self.search(food_name, alpha, branded_only).await?;
        ranking
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| SearchError::NotFound(food_name.to_string()))
    }

    /// Best match for every comma-separated food in `input`, in input order.
    /// One food failing does not stop the others.
    pub async fn best_matches(
        &self,
        input: &str,
        alpha: f32,
        branded_only: bool,
    ) -> Vec<(String, Result<ScoredCandidate, SearchError>)> {
        let mut results = Vec::new();
        for query in split_queries(input) {
            let outcome = self.best_match(&query, alpha, branded_only).await;
            results.push((query, outcome));
        }
        results
    }

    pub async fn fetch_nutrients(&self, candidate_id: &str) -> Result<NutrientTable, SearchError> {
        let records = self.catalog.fetch_nutrients(candidate_id).await?;
        Ok(NutrientTable::from_entries(
            candidate_id,
            records.into_iter().map(NutrientEntry::from),
        ))
    }

    pub fn preprocess(&self, table: &NutrientTable, reference: Reference) -> Result<NutrientTable, NutrientError> {
        nutrients::preprocess(table, reference)
    }

    pub fn aggregate(&self, ingredients: &[Ingredient]) -> NutrientTable {
        nutrients::aggregate(ingredients)
    }

    /// Lazily resolves `ingredients` one at a time.
    pub fn resolve(
        &self,
        ingredients: Vec<Ingredient>,
        alpha: f32,
        branded_only: bool,
    ) -> Result<IngredientResolver<'_, C>, SearchError> {
        validate_weight(alpha)?;
        Ok(IngredientResolver {
            matcher: self,
            pending: ingredients.into_iter().collect(),
            processed: Vec::new(),
            alpha,
            branded_only,
        })
    }
}

#[derive(Debug)]
pub enum IngredientOutcome {
    Resolved {
        ingredient: Ingredient,
        best: ScoredCandidate,
    },
    /// The catalog had nothing usable; reported to the user, not an error.
    NoMatch { ingredient: Ingredient },
    Failed {
        ingredient: Ingredient,
        error: SearchError,
    },
}

impl IngredientOutcome {
    pub fn ingredient(&self) -> &Ingredient {
        match self {
            IngredientOutcome::Resolved { ingredient, .. }
            | IngredientOutcome::NoMatch { ingredient }
            | IngredientOutcome::Failed { ingredient, .. } => ingredient,
        }
    }
}

/// Finite, restartable sequence of per-ingredient search-and-fetch steps.
///
/// Each `next` runs one ingredient to completion. A caller can stop at any
/// point; `partial_aggregate` over what has been processed is always valid.
pub struct IngredientResolver<'a, C: CatalogClient> {
    matcher: &'a FoodMatcher<C>,
    pending: VecDeque<Ingredient>,
    processed: Vec<Ingredient>,
    alpha: f32,
    branded_only: bool,
}

impl<'a, C: CatalogClient> IngredientResolver<'a, C> {
    pub async fn next(&mut self) -> Option<IngredientOutcome> {
        let mut ingredient = self.pending.pop_front()?;
        let outcome = self.resolve_one(&mut ingredient).await;
        self.processed.push(ingredient.clone());
        Some(match outcome {
            Ok(Some(best)) => IngredientOutcome::Resolved { ingredient, best },
            Ok(None) => IngredientOutcome::NoMatch { ingredient },
            Err(error) if error.is_no_match() => IngredientOutcome::NoMatch { ingredient },
            Err(error) => IngredientOutcome::Failed { ingredient, error },
        })
    }

    async fn resolve_one(&self, ingredient: &mut Ingredient) -> Result<Option<ScoredCandidate>, SearchError> {
        ingredient.resolved_candidate = None;
        ingredient.nutrient_table = None;

        if !ingredient.has_valid_quantity() {
            return Err(SearchError::InvalidQuantity(ingredient.grams));
        }

        let ranking = self
            .matcher
            .search(&ingredient.name, self.alpha, self.branded_only)
            .await?;
        let Some(best) = ranking.candidates.into_iter().next() else {
            return Ok(None);
        };
        ingredient.resolved_candidate = Some(best.candidate.clone());

        let table = self.matcher.fetch_nutrients(&best.candidate.id).await?;
        ingredient.nutrient_table = Some(table);
        Ok(Some(best))
    }

    pub fn processed(&self) -> &[Ingredient] {
        &self.processed
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn partial_aggregate(&self) -> NutrientTable {
        nutrients::aggregate(&self.processed)
    }

    /// Puts every processed ingredient back in front of the queue, in order.
    /// Searches already made are served from the cache on the second pass.
    pub fn restart(&mut self) {
        for ingredient in self.processed.drain(..).rev() {
            self.pending.push_front(ingredient);
        }
    }

    /// Runs the rest of the sequence and returns every processed ingredient.
    pub async fn run_to_end(mut self) -> Vec<Ingredient> {
        while self.next().await.is_some() {}
        self.processed
    }
}
