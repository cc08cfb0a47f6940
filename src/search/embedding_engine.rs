use model2vec_rs::model::StaticModel;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::SearchError;

pub const EMBEDDING_MODEL_ID: &str = "minishlab/potion-base-32M";

pub const EMBEDDING_DIMENSION: usize = 512;

/// Upper bound on a first model load (download included) before ranking gives
/// up on semantic scores.
pub const DEFAULT_MODEL_LOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Distinct texts kept by an `EmbeddingScorer` before its memo is cleared.
pub const DEFAULT_MEMO_CAPACITY: usize = 10_000;

/// Anything that turns text into fixed-size vectors.
pub trait Embedder: Send + Sync {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SearchError>;

    /// Blocking readiness check; loads whatever the embedder needs.
    fn ensure_ready(&self) -> Result<(), SearchError> {
        Ok(())
    }
}

/// Process-wide static embedding model. Loading is deferred to the first
/// `ensure_ready` (or first embed) and happens exactly once; afterwards the
/// model is read-only and shared freely.
pub struct EmbeddingEngine {
    model_id: String,
    model: OnceLock<Result<StaticModel, String>>,
}

impl EmbeddingEngine {
    pub fn new() -> Self {
        Self::with_model_id(EMBEDDING_MODEL_ID)
    }

    pub fn with_model_id(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            model: OnceLock::new(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn dimension(&self) -> usize {
        // model2vec-rs does not expose the output width of a loaded model.
        EMBEDDING_DIMENSION
    }

    /// Loads the model if needed. A failed load is remembered; later calls
    /// report `ModelUnavailable` without retrying the download.
    pub fn model(&self) -> Result<&StaticModel, SearchError> {
        let loaded = self.model.get_or_init(|| {
            info!(model_id = %self.model_id, "loading embedding model");
            StaticModel::from_pretrained(&self.model_id, None, None, None).map_err(|e| {
                warn!(model_id = %self.model_id, error = %e, "embedding model failed to load");
                e.to_string()
            })
        });
        loaded
            .as_ref()
            .map_err(|reason| SearchError::ModelUnavailable(reason.clone()))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.model.get(), Some(Ok(_)))
    }
}

impl Default for EmbeddingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for EmbeddingEngine {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SearchError> {
        let model = self.model()?;
        Ok(model.encode(texts))
    }

    fn ensure_ready(&self) -> Result<(), SearchError> {
        self.model().map(|_| ())
    }
}

/// Cosine similarity clamped to [0, 1]. Zero-length or zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let cos = dot / (norm_a * norm_b);
    if cos.is_nan() {
        0.0
    } else {
        cos.clamp(0.0, 1.0)
    }
}

/// Semantic scorer over a shared embedder, memoizing vectors per text.
///
/// The memo holds at most `memo_capacity` texts and is cleared wholesale when
/// a batch would overflow it; a long-running process re-embeds after that.
pub struct EmbeddingScorer {
    embedder: Arc<dyn Embedder>,
    readiness: OnceLock<Result<(), String>>,
    memo: Mutex<HashMap<String, Vec<f32>>>,
    memo_capacity: usize,
}

impl EmbeddingScorer {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            readiness: OnceLock::new(),
            memo: Mutex::new(HashMap::new()),
            memo_capacity: DEFAULT_MEMO_CAPACITY,
        }
    }

    pub fn with_memo_capacity(mut self, capacity: usize) -> Self {
        self.memo_capacity = capacity.max(1);
        self
    }

    /// Runs the embedder's readiness check on the blocking pool and waits at
    /// most `timeout` for it. A failed or timed-out load is remembered: every
    /// later score reports `ModelUnavailable` without touching the embedder.
    pub async fn warm_up(&self, timeout: Duration) -> Result<(), SearchError> {
        if let Some(state) = self.readiness.get() {
            return state.clone().map_err(SearchError::ModelUnavailable);
        }

        let embedder = Arc::clone(&self.embedder);
        let loading = tokio::task::spawn_blocking(move || embedder.ensure_ready());
        let state = match tokio::time::timeout(timeout, loading).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(SearchError::ModelUnavailable(reason)))) => Err(reason),
            Ok(Ok(Err(e))) => Err(e.to_string()),
            Ok(Err(join_error)) => Err(format!("model loader stopped: {}", join_error)),
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "embedding model load timed out");
                Err(format!("model load timed out after {:?}", timeout))
            }
        };
        self.readiness
            .get_or_init(|| state)
            .clone()
            .map_err(SearchError::ModelUnavailable)
    }

    fn embeddings_for(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SearchError> {
        if let Some(Err(reason)) = self.readiness.get() {
            return Err(SearchError::ModelUnavailable(reason.clone()));
        }
        let mut memo = self.memo.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut missing: Vec<String> = Vec::new();
        for text in texts {
            if !memo.contains_key(text) && !missing.contains(text) {
                missing.push(text.clone());
            }
        }
        if missing.is_empty() {
            return Ok(texts
                .iter()
                .map(|t| memo.get(t).cloned().unwrap_or_default())
                .collect());
        }

        debug!(count = missing.len(), "embedding uncached texts");
        let vectors = self.embedder.embed(&missing)?;
        if vectors.len() != missing.len() {
            return Err(SearchError::ModelUnavailable(format!(
                "embedder returned {} vectors for {} texts",
                vectors.len(),
                missing.len()
            )));
        }
        let fresh: HashMap<String, Vec<f32>> = missing.into_iter().zip(vectors).collect();
        let result: Vec<Vec<f32>> = texts
            .iter()
            .map(|t| memo.get(t).or_else(|| fresh.get(t)).cloned().unwrap_or_default())
            .collect();

        if memo.len() + fresh.len() > self.memo_capacity {
            debug!(entries = memo.len(), "embedding memo full, clearing");
            memo.clear();
            for (text, vector) in texts.iter().zip(&result).take(self.memo_capacity) {
                memo.insert(text.clone(), vector.clone());
            }
        } else {
            memo.extend(fresh);
        }
        Ok(result)
    }

    pub fn score(&self, query: &str, description: &str) -> Result<f32, SearchError> {
        let scores = self.score_batch(query, &[description.to_string()])?;
        Ok(scores.into_iter().next().unwrap_or(0.0))
    }

    /// Scores every description against the query with one embedder call for
    /// whatever is not memoized yet.
    pub fn score_batch(&self, query: &str, descriptions: &[String]) -> Result<Vec<f32>, SearchError> {
        if descriptions.is_empty() {
            return Ok(Vec::new());
        }
        let mut texts = Vec::with_capacity(descriptions.len() + 1);
        texts.push(query.to_string());
        texts.extend(descriptions.iter().cloned());

        let vectors = self.embeddings_for(&texts)?;
        let (query_vec, rest) = vectors
            .split_first()
            .ok_or_else(|| SearchError::ModelUnavailable("no query embedding".to_string()))?;
        Ok(rest.iter().map(|v| cosine_similarity(query_vec, v)).collect())
    }
}
