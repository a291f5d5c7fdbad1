//! Operator query matching over vessels.
//!
//! Both vessel names and queries are reduced to a search key (whitespace
//! removed, lowercased) so that `"ocean voyager"`, `"OceanVoyager"` and
//! `" ocean  VOY"` all select the same vessel.

use crate::model::Vessel;

/// Remove all whitespace and lowercase.
pub fn search_key(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalize an operator query with the same rule as [`search_key`].
pub fn normalize_query(query: &str) -> String {
    search_key(query)
}

/// Whether a single vessel matches an already-normalized query.
///
/// A vessel matches when its search key contains the query, or when the
/// query is all digits and the vessel's MMSI contains it.
pub fn matches(vessel: &Vessel, normalized_query: &str) -> bool {
    if normalized_query.is_empty() || vessel.search_key.contains(normalized_query) {
        return true;
    }

    let numeric = normalized_query.chars().all(|c| c.is_ascii_digit());
    numeric
        && vessel
            .mmsi
            .as_deref()
            .is_some_and(|mmsi| mmsi.contains(normalized_query))
}

/// Select the vessels matching `query`, preserving input order.
///
/// An empty (or all-whitespace) query selects every vessel.
pub fn filter_vessels<'a>(vessels: &'a [Vessel], query: &str) -> Vec<&'a Vessel> {
    let query = normalize_query(query);
    vessels.iter().filter(|v| matches(v, &query)).collect()
}
