use std::collections::{BTreeMap, HashSet};

use crate::data_models::{Category, SearchResult, SearchTerm};

/// Drops repeated ids (first occurrence wins), stable-sorts by title match
/// then category priority, and truncates to `max_results`.
pub fn rank(results: Vec<SearchResult>, term: &SearchTerm, max_results: usize) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<SearchResult> = results
        .into_iter()
        .filter(|result| seen.insert(result.id.clone()))
        .collect();

    // sort_by_cached_key is stable and lowercases each title once
    ranked.sort_by_cached_key(|result| (!term.matches(&result.title), result.category.priority()));
    ranked.truncate(max_results);
    ranked
}

pub fn group_by_category(results: &[SearchResult]) -> BTreeMap<Category, Vec<SearchResult>> {
    let mut groups: BTreeMap<Category, Vec<SearchResult>> = BTreeMap::new();
    for result in results {
        groups.entry(result.category).or_default().push(result.clone());
    }
    groups
}
