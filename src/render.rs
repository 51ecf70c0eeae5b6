//! Plain-text rendering for the command line.
//!
//! Every function returns a `String` so the binary decides where it goes
//! and tests can assert on it.

use std::fmt::Write;

use lexbg_search::legal::{CitationKind, DocumentType};
use lexbg_search::{
    AreaClassification, Citation, DocumentAnalysis, DomainConfig, DomainRegistry, DomainTier,
    SearchOutcome,
};

/// Ranked results, one block per result.
pub fn search_outcome(outcome: &SearchOutcome) -> String {
    let mut out = String::new();
    if outcome.results.is_empty() {
        let _ = writeln!(
            out,
            "Няма резултати над прага на релевантност ({} кандидата).",
            outcome.candidate_count
        );
        return out;
    }

    let _ = writeln!(
        out,
        "{} резултата от {} кандидата\n",
        outcome.results.len(),
        outcome.candidate_count
    );
    for scored in &outcome.results {
        let result = &scored.result;
        let title = if result.title.is_empty() {
            "(без заглавие)"
        } else {
            result.title.as_str()
        };
        let _ = writeln!(out, "{}. {title}", scored.fused_rank);
        let _ = writeln!(out, "   {}", result.url);
        let _ = writeln!(
            out,
            "   {} via {} | релевантност {:.2} (BM25 {:.2}, семантика {:.2})",
            result.source_domain,
            result.provider,
            scored.relevance,
            scored.lexical_score,
            scored.semantic_score
        );
        if !result.snippet.is_empty() {
            let _ = writeln!(out, "   {}", result.snippet.trim());
        }
        out.push('\n');
    }
    out
}

/// Domain registry as a table, in priority order.
pub fn domains(registry: &DomainRegistry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<14} {:<22} {:<11} {:>6}  описание", "ключ", "домейн", "категория", "тегло");
    for domain in registry.prioritized() {
        let _ = writeln!(
            out,
            "{:<14} {:<22} {:<11} {:>6.2}  {}",
            domain.key,
            domain.domain,
            tier_label(domain.tier),
            domain.authority_weight,
            domain.description
        );
    }
    out
}

/// Area classification with the domains worth searching for it.
pub fn classification(classification: &AreaClassification, recommended: &[DomainConfig]) -> String {
    let mut out = String::new();
    match classification.area {
        Some(area) => {
            let _ = writeln!(
                out,
                "Област: {area} (увереност {:.2})",
                classification.confidence
            );
            let _ = writeln!(
                out,
                "Ключови думи: {}",
                classification.matched_keywords.join(", ")
            );
        }
        None => {
            let _ = writeln!(out, "Област: общоправен текст");
        }
    }
    if !recommended.is_empty() {
        let keys: Vec<&str> = recommended.iter().map(|d| d.key.as_str()).collect();
        let _ = writeln!(out, "Препоръчани източници: {}", keys.join(", "));
    }
    out
}

/// Citations grouped by line, in extraction order.
pub fn citations(citations: &[Citation]) -> String {
    if citations.is_empty() {
        return "Не са открити правни позовавания.\n".to_owned();
    }
    let mut out = String::new();
    for citation in citations {
        let _ = writeln!(out, "{:<14} {}", kind_label(citation.kind), citation.text);
    }
    out
}

/// Summary of a fetched legal document.
pub fn analysis(analysis: &DocumentAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", analysis.title);
    let _ = writeln!(out, "{}", analysis.url);
    let _ = writeln!(
        out,
        "Вид: {} | {} думи | {} позовавания\n",
        document_type_label(analysis.document_type),
        analysis.word_count,
        analysis.citations.len()
    );
    let _ = writeln!(out, "{}\n", analysis.summary);
    out.push_str(&citations(&analysis.citations));
    out
}

fn tier_label(tier: DomainTier) -> &'static str {
    match tier {
        DomainTier::PrimaryDatabase => "база данни",
        DomainTier::Court => "съд",
        DomainTier::Government => "държавен",
        DomainTier::News => "новини",
    }
}

fn kind_label(kind: CitationKind) -> &'static str {
    match kind {
        CitationKind::Article => "член",
        CitationKind::Paragraph => "алинея",
        CitationKind::Point => "точка",
        CitationKind::Section => "параграф",
        CitationKind::Decision => "решение",
        CitationKind::Case => "дело",
        CitationKind::Ecli => "ECLI",
        CitationKind::Law => "закон",
        CitationKind::Code => "кодекс",
        CitationKind::Regulation => "наредба",
        CitationKind::Decree => "постановление",
    }
}

fn document_type_label(kind: DocumentType) -> &'static str {
    match kind {
        DocumentType::CouncilOfMinistersDecision => "решение на Министерския съвет",
        DocumentType::CourtDecision => "съдебен акт",
        DocumentType::Law => "закон",
        DocumentType::Code => "кодекс",
        DocumentType::Regulation => "наредба",
        DocumentType::Decree => "постановление",
        DocumentType::Generic => "документ",
    }
}
