pub mod embedding_engine;
pub mod fuzzy;
pub mod hybrid_ranker;
pub mod query_normalizer;
pub mod result_cache;

pub use embedding_engine::{
    cosine_similarity, Embedder, EmbeddingEngine, EmbeddingScorer, DEFAULT_MODEL_LOAD_TIMEOUT, EMBEDDING_DIMENSION,
};
pub use fuzzy::token_set_ratio;
pub use hybrid_ranker::{hybrid_score, HybridRanker, Ranking, ScoringMode};
pub use query_normalizer::{normalize, split_queries};
pub use result_cache::{CacheError, CacheKey, LoadOutcome, ResultCache, CACHE_SCHEMA_VERSION};
