//! BM25 lexical scoring over the candidate pool.
//!
//! Each candidate is one document: its title and snippet joined by a
//! space. Document frequencies come from the pool itself, so scores are
//! only comparable within one request.

use crate::config::Bm25Params;

/// Lowercase `text` and split it on every non-alphanumeric character.
///
/// Unicode aware: Cyrillic letters and digits are kept together, while
/// punctuation such as `чл.45,ал.1` splits into `чл`, `45`, `ал`, `1`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Distinct query terms in first-occurrence order.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut terms = Vec::new();
    for token in tokenize(query) {
        if !terms.contains(&token) {
            terms.push(token);
        }
    }
    terms
}

/// Score every document in `documents` against `terms`.
///
/// `idf = ln(1 + (N - n + 0.5) / (n + 0.5))`, which stays positive even
/// for terms present in every document. A document containing none of
/// the terms scores exactly zero.
pub fn bm25_scores(terms: &[String], documents: &[String], params: Bm25Params) -> Vec<f64> {
    let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d)).collect();
    let n_docs = tokenized.len() as f64;
    if tokenized.is_empty() || terms.is_empty() {
        return vec![0.0; tokenized.len()];
    }

    let total_len: usize = tokenized.iter().map(Vec::len).sum();
    let avg_len = (total_len as f64 / n_docs).max(1.0);

    let idf: Vec<f64> = terms
        .iter()
        .map(|term| {
            let containing = tokenized.iter().filter(|doc| doc.contains(term)).count() as f64;
            (1.0 + (n_docs - containing + 0.5) / (containing + 0.5)).ln()
        })
        .collect();

    tokenized
        .iter()
        .map(|doc| {
            let doc_len = doc.len() as f64;
            let norm = params.k1 * (1.0 - params.b + params.b * doc_len / avg_len);
            terms
                .iter()
                .zip(&idf)
                .map(|(term, idf)| {
                    let tf = doc.iter().filter(|t| *t == term).count() as f64;
                    if tf == 0.0 {
                        0.0
                    } else {
                        idf * tf * (params.k1 + 1.0) / (tf + norm)
                    }
                })
                .sum()
        })
        .collect()
}
