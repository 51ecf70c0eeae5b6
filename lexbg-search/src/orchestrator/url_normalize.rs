//! URL normalisation for search result deduplication.
//!
//! Canonicalises URLs so that the same legal document reached through
//! different providers compares as equal. Providers disagree on `www.`,
//! letter case, trailing slashes and tracking parameters.

use url::Url;

/// Tracking query parameters that are stripped during normalisation.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "yclid",
    "ref",
];

/// Normalise a URL for deduplication comparison.
///
/// 1. Lowercase the whole URL, path included. The Bulgarian legal sites
///    serve their documents case-insensitively.
/// 2. Drop a leading `www.` from the host and any default port.
/// 3. Remove the trailing slash from the path (unless the path is `"/"`).
/// 4. Strip tracking parameters and sort the rest by key.
/// 5. Remove the fragment.
///
/// If the input cannot be parsed as a URL, its trimmed lowercase form
/// is returned so that identical garbage still deduplicates.
///
/// # Examples
///
/// ```
/// use lexbg_search::orchestrator::url_normalize::normalize_url;
///
/// let a = normalize_url("https://WWW.Lex.bg/Laws/LDOC/2121934337/?utm_source=x#chl45");
/// let b = normalize_url("https://lex.bg/laws/ldoc/2121934337");
/// assert_eq!(a, b);
/// ```
pub fn normalize_url(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let Ok(mut parsed) = Url::parse(&lowered) else {
        return lowered;
    };

    parsed.set_fragment(None);

    if is_default_port(&parsed) {
        let _ = parsed.set_port(None);
    }

    if let Some(bare) = parsed
        .host_str()
        .and_then(|h| h.strip_prefix("www."))
        .map(str::to_owned)
    {
        let _ = parsed.set_host(Some(&bare));
    }

    let mut params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();

    if params.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(&params);
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    parsed.to_string()
}

/// Returns `true` if the URL uses the default port for its scheme.
fn is_default_port(url: &Url) -> bool {
    matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    )
}
