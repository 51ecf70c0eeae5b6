//! Candidate pool construction: deduplication by normalised URL.
//!
//! Input arrives already ordered by domain priority, then provider rank.
//! The first occurrence of a URL wins, so the copy from the
//! higher-priority domain is the one that survives.

use std::collections::HashSet;

use crate::types::SearchResult;

use super::url_normalize::normalize_url;

/// Deduplicate `results` by normalised URL, keeping the first occurrence,
/// and stop once `cap` unique results were collected.
///
/// Results with an empty URL are dropped. Output order equals input order
/// among the survivors (discovery order).
pub fn deduplicate(results: Vec<SearchResult>, cap: usize) -> Vec<SearchResult> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut pool = Vec::with_capacity(results.len().min(cap));

    for result in results {
        if pool.len() >= cap {
            break;
        }
        if result.url.trim().is_empty() {
            continue;
        }
        if seen.insert(normalize_url(&result.url)) {
            pool.push(result);
        } else {
            tracing::trace!(url = %result.url, domain = %result.source_domain, "duplicate dropped");
        }
    }

    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderKind;

    fn make_result(url: &str, domain: &str) -> SearchResult {
        SearchResult {
            title: format!("Документ от {domain}"),
            url: url.to_string(),
            snippet: String::new(),
            source_domain: domain.to_string(),
            provider: ProviderKind::GoogleCse,
        }
    }

    #[test]
    fn first_occurrence_wins() {
        let results = vec![
            make_result("https://lex.bg/laws/ldoc/1", "lex_bg"),
            make_result("https://LEX.bg/laws/ldoc/1/", "ciela_net"),
        ];
        let pool = deduplicate(results, 30);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].source_domain, "lex_bg");
    }

    #[test]
    fn distinct_urls_keep_order() {
        let results = vec![
            make_result("https://lex.bg/a", "lex_bg"),
            make_result("https://vks.bg/b", "vks_bg"),
            make_result("https://lex.bg/c", "lex_bg"),
        ];
        let urls: Vec<_> = deduplicate(results, 30)
            .into_iter()
            .map(|r| r.url)
            .collect();
        assert_eq!(
            urls,
            vec!["https://lex.bg/a", "https://vks.bg/b", "https://lex.bg/c"]
        );
    }

    #[test]
    fn cap_limits_pool() {
        let results: Vec<_> = (0..50)
            .map(|i| make_result(&format!("https://lex.bg/{i}"), "lex_bg"))
            .collect();
        assert_eq!(deduplicate(results, 30).len(), 30);
    }

    #[test]
    fn duplicates_do_not_count_towards_cap() {
        let mut results = vec![make_result("https://lex.bg/a", "lex_bg"); 5];
        results.push(make_result("https://lex.bg/b", "lex_bg"));
        let pool = deduplicate(results, 2);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool[1].url, "https://lex.bg/b");
    }

    #[test]
    fn empty_urls_dropped() {
        let results = vec![make_result("", "lex_bg"), make_result("  ", "lex_bg")];
        assert!(deduplicate(results, 30).is_empty());
    }
}
