/// Trims, collapses whitespace runs and lower-cases a food name so that
/// "  Greek   Yogurt" and "greek yogurt" share a cache key.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Splits comma-separated input ("chicken breast, salmon") into independent
/// normalized queries, dropping empty segments.
pub fn split_queries(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(normalize)
        .filter(|q| !q.is_empty())
        .collect()
}
