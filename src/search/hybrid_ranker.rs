use std::cmp::Ordering;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::SearchError;
use crate::models::{Candidate, ScoredCandidate};
use crate::search::embedding_engine::EmbeddingScorer;
use crate::search::fuzzy::token_set_ratio;

/// How the semantic half of the score was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    Hybrid,
    /// The embedding model was unavailable; hybrid score equals the lexical score.
    LexicalOnly,
}

#[derive(Debug, Clone)]
pub struct Ranking {
    pub candidates: Vec<ScoredCandidate>,
    pub mode: ScoringMode,
}

impl Ranking {
    pub fn best(&self) -> Option<&ScoredCandidate> {
        self.candidates.first()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

pub fn validate_weight(alpha: f32) -> Result<(), SearchError> {
    if (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(SearchError::InvalidWeight(alpha))
    }
}

/// Convex combination of the two scores; stays in [0, 1] when both inputs do.
pub fn hybrid_score(alpha: f32, semantic: f32, lexical: f32) -> f32 {
    (alpha * semantic + (1.0 - alpha) * lexical).clamp(0.0, 1.0)
}

/// Total order: hybrid score descending, then catalog position, then
/// description, then id.
fn compare_scored(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.hybrid_score
        .total_cmp(&a.hybrid_score)
        .then_with(|| a.candidate.raw_source_rank.cmp(&b.candidate.raw_source_rank))
        .then_with(|| a.candidate.description.cmp(&b.candidate.description))
        .then_with(|| a.candidate.id.cmp(&b.candidate.id))
}

/// Keeps branded candidates when asked to. If the catalog returned no branded
/// record at all, the unfiltered list is used so a search with results never
/// ranks to nothing.
pub fn filter_branded(candidates: &[Candidate], branded_only: bool) -> Vec<&Candidate> {
    if branded_only {
        let branded: Vec<&Candidate> = candidates.iter().filter(|c| c.is_branded).collect();
        if !branded.is_empty() {
            return branded;
        }
        debug!("no branded candidates, falling back to the full list");
    }
    candidates.iter().collect()
}

/// Fuses semantic and lexical similarity and orders candidates best-first.
pub struct HybridRanker {
    semantic: Option<EmbeddingScorer>,
}

impl HybridRanker {
    pub fn new(semantic: EmbeddingScorer) -> Self {
        Self { semantic: Some(semantic) }
    }

    /// A ranker that never touches an embedding model.
    pub fn lexical_only() -> Self {
        Self { semantic: None }
    }

    /// Makes sure the embedding model is loaded, waiting at most `timeout`.
    /// Returns the mode later rankings will use.
    pub async fn warm_up(&self, timeout: Duration) -> ScoringMode {
        let Some(scorer) = &self.semantic else {
            return ScoringMode::LexicalOnly;
        };
        match scorer.warm_up(timeout).await {
            Ok(()) => ScoringMode::Hybrid,
            Err(e) => {
                debug!(error = %e, "semantic scoring disabled");
                ScoringMode::LexicalOnly
            }
        }
    }

    pub fn rank(
        &self,
        query: &str,
        candidates: &[Candidate],
        alpha: f32,
        branded_only: bool,
    ) -> Result<Ranking, SearchError> {
        validate_weight(alpha)?;

        let pool = filter_branded(candidates, branded_only);
        if pool.is_empty() {
            return Ok(Ranking {
                candidates: Vec::new(),
                mode: ScoringMode::Hybrid,
            });
        }

        let texts: Vec<String> = pool.iter().map(|c| c.comparison_text(branded_only)).collect();
        let lexical: Vec<f32> = texts.iter().map(|t| token_set_ratio(query, t)).collect();

        let semantic = match &self.semantic {
            Some(scorer) => match scorer.score_batch(query, &texts) {
                Ok(scores) => Some(scores),
                Err(SearchError::ModelUnavailable(reason)) => {
                    warn!(%reason, "embedding model unavailable, ranking on lexical score only");
                    None
                }
                Err(e) => return Err(e),
            },
            None => None,
        };

        let mode = if semantic.is_some() {
            ScoringMode::Hybrid
        } else {
            ScoringMode::LexicalOnly
        };

        let mut scored: Vec<ScoredCandidate> = pool
            .into_iter()
            .enumerate()
            .map(|(i, candidate)| {
                let lexical_score = lexical[i];
                let (semantic_score, hybrid) = match &semantic {
                    Some(scores) => (scores[i], hybrid_score(alpha, scores[i], lexical_score)),
                    None => (0.0, lexical_score),
                };
                ScoredCandidate {
                    candidate: candidate.clone(),
                    semantic_score,
                    lexical_score,
                    hybrid_score: hybrid,
                }
            })
            .collect();

        scored.sort_by(compare_scored);
        Ok(Ranking { candidates: scored, mode })
    }
}
