//! Fuzzy matching over dataset unit names.
//!
//! Read-only and stateless per call; callers may query from any number
//! of tasks concurrently. Scores are 0–100, case-insensitive, the
//! maximum of whole-string similarity and best single-token similarity
//! (so "cav" still finds "Cavalry Archer"). Ties keep corpus iteration
//! order via a stable sort, which makes results fully deterministic for
//! the sorted key order a dataset provides.

use strsim::normalized_levenshtein;

/// Default number of results returned to the consumer.
pub const DEFAULT_LIMIT: usize = 10;
/// Default minimum similarity score for a candidate to appear at all.
pub const DEFAULT_SCORE_CUTOFF: u8 = 50;

/// Similarity score between a query and a candidate name, 0–100.
fn similarity(query: &str, candidate: &str) -> u8 {
    let query = query.to_lowercase();
    let candidate = candidate.to_lowercase();

    let whole = normalized_levenshtein(&query, &candidate);
    let best_token = candidate
        .split_whitespace()
        .map(|token| normalized_levenshtein(&query, token))
        .fold(0.0_f64, f64::max);

    (whole.max(best_token) * 100.0).round() as u8
}

/// Rank `names` against `query`, best match first.
///
/// An empty query returns nothing. A query of a single space is the
/// browse-all affordance: the first `limit` names in corpus order, no
/// scoring. Candidates scoring below `score_cutoff` are excluded
/// entirely rather than ranked last.
pub fn search<'a, I>(query: &str, names: I, limit: usize, score_cutoff: u8) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    if query.is_empty() {
        return Vec::new();
    }

    if query == " " {
        let browse: Vec<&str> = names.into_iter().take(limit).collect();
        debug_assert_distinct(&browse);
        return browse;
    }

    let mut scored: Vec<(u8, &str)> = names
        .into_iter()
        .map(|name| (similarity(query, name), name))
        .filter(|(score, _)| *score >= score_cutoff)
        .collect();

    // stable sort: equal scores keep corpus iteration order
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.truncate(limit);

    let results: Vec<&str> = scored.into_iter().map(|(_, name)| name).collect();
    debug_assert_distinct(&results);
    results
}

fn debug_assert_distinct(names: &[&str]) {
    debug_assert_eq!(
        names.len(),
        names.iter().collect::<std::collections::HashSet<_>>().len(),
        "search results must be pairwise distinct"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<&'static str> {
        vec!["Knight", "Camel", "Monk", "Cavalry Archer", "Pikeman"]
    }

    #[test]
    fn typo_still_finds_the_unit() {
        let results = search("knigt", corpus(), DEFAULT_LIMIT, DEFAULT_SCORE_CUTOFF);
        assert_eq!(results.first(), Some(&"Knight"));
    }

    #[test]
    fn exact_match_ranks_first() {
        let results = search("camel", corpus(), DEFAULT_LIMIT, DEFAULT_SCORE_CUTOFF);
        assert_eq!(results.first(), Some(&"Camel"));
    }

    #[test]
    fn token_similarity_matches_multiword_names() {
        let results = search("archer", corpus(), DEFAULT_LIMIT, DEFAULT_SCORE_CUTOFF);
        assert!(results.contains(&"Cavalry Archer"));
    }

    #[test]
    fn empty_query_returns_nothing() {
        assert!(search("", corpus(), DEFAULT_LIMIT, DEFAULT_SCORE_CUTOFF).is_empty());
    }

    #[test]
    fn single_space_browses_corpus_in_order() {
        let results = search(" ", corpus(), 3, DEFAULT_SCORE_CUTOFF);
        assert_eq!(results, vec!["Knight", "Camel", "Monk"]);
    }

    #[test]
    fn below_cutoff_candidates_are_excluded() {
        let results = search("zzz-no-match", corpus(), DEFAULT_LIMIT, DEFAULT_SCORE_CUTOFF);
        assert!(results.is_empty());
    }

    #[test]
    fn limit_caps_result_count() {
        let results = search(" ", corpus(), 2, DEFAULT_SCORE_CUTOFF);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn ties_keep_corpus_order() {
        let names = vec!["Aa", "Ab"];
        let results = search("a", names.clone(), DEFAULT_LIMIT, 0);
        assert_eq!(results, names);
    }
}
