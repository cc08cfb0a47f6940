use rapidfuzz::fuzz;
use std::collections::BTreeSet;

fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn join_tokens<'a>(parts: impl IntoIterator<Item = &'a String>) -> String {
    parts.into_iter().map(String::as_str).collect::<Vec<_>>().join(" ")
}

/// Indel similarity: 1.0 for identical strings, 0.0 for nothing in common.
fn ratio(a: &str, b: &str) -> f32 {
    fuzz::ratio(a.chars(), b.chars()) as f32
}

/// Order- and duplicate-insensitive token-set similarity in [0, 1].
///
/// The shared tokens are compared against each side's full token set, so
/// "apple" vs "apple, raw, with skin" still scores 1.0.
pub fn token_set_ratio(a: &str, b: &str) -> f32 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let common = join_tokens(tokens_a.intersection(&tokens_b));
    let only_a = join_tokens(tokens_a.difference(&tokens_b));
    let only_b = join_tokens(tokens_b.difference(&tokens_a));

    let combine = |rest: &str| match (common.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => common.clone(),
        (false, false) => format!("{} {}", common, rest),
    };
    let with_a = combine(&only_a);
    let with_b = combine(&only_b);

    let mut best = ratio(&with_a, &with_b);
    if !common.is_empty() {
        best = best.max(ratio(&common, &with_a)).max(ratio(&common, &with_b));
    }
    best.clamp(0.0, 1.0)
}
