//! Bulgarian legal text analysis.
//!
//! Keyword-based legal-area classification, query normalisation (typos,
//! code abbreviations), citation extraction and document-type detection.
//! Everything here is pure, synchronous string processing.

use std::fmt;
use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Areas of Bulgarian law the classifier recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalArea {
    /// Гражданско право.
    Civil,
    /// Наказателно право.
    Criminal,
    /// Административно право.
    Administrative,
    /// Конституционно право.
    Constitutional,
    /// Търговско право.
    Commercial,
    /// Трудово право.
    Labour,
    /// Данъчно право.
    Tax,
    /// Защита на личните данни.
    DataProtection,
}

impl LegalArea {
    /// All areas, in classification tie-break order.
    pub fn all() -> &'static [LegalArea] {
        &[
            Self::Civil,
            Self::Criminal,
            Self::Administrative,
            Self::Constitutional,
            Self::Commercial,
            Self::Labour,
            Self::Tax,
            Self::DataProtection,
        ]
    }

    /// Bulgarian name of the area.
    pub fn bulgarian_name(&self) -> &'static str {
        match self {
            Self::Civil => "гражданско право",
            Self::Criminal => "наказателно право",
            Self::Administrative => "административно право",
            Self::Constitutional => "конституционно право",
            Self::Commercial => "търговско право",
            Self::Labour => "трудово право",
            Self::Tax => "данъчно право",
            Self::DataProtection => "защита на данните",
        }
    }

    /// Lowercase keywords that signal this area.
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Civil => &[
                "граждански",
                "договор",
                "собственост",
                "наследство",
                "вреди",
                "обезщетение",
                "семейно",
                "развод",
                "алименти",
            ],
            Self::Criminal => &[
                "наказателен",
                "престъпление",
                "обвинение",
                "присъда",
                "наказание",
                "затвор",
                "кражба",
                "измама",
            ],
            Self::Administrative => &[
                "административен",
                "държавен",
                "служебен",
                "разрешение",
                "лиценз",
                "наредба",
                "министерство",
            ],
            Self::Constitutional => &["конституционен", "конституция", "основни права", "свободи"],
            Self::Commercial => &["търговски", "търговец", "дружество", "регистър", "търговия"],
            Self::Labour => &[
                "трудов",
                "работник",
                "служител",
                "уволнение",
                "заплата",
                "отпуск",
                "осигуровка",
                "пенсия",
            ],
            Self::Tax => &["данъчен", "данък", "ддс", "нап", "фискален"],
            Self::DataProtection => &["лични данни", "gdpr", "кзлд", "защита на данни"],
        }
    }

    /// Administrative texts are usually a poor match for personal legal issues.
    fn weight(&self) -> f64 {
        match self {
            Self::Administrative => 0.6,
            _ => 1.0,
        }
    }

    /// Areas concerning an individual's own legal situation.
    fn is_personal(&self) -> bool {
        matches!(self, Self::Civil | Self::Criminal | Self::Labour)
    }
}

impl fmt::Display for LegalArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.bulgarian_name())
    }
}

/// Result of classifying a text into a legal area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaClassification {
    /// Best matching area, `None` for general legal content.
    pub area: Option<LegalArea>,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Keywords of the winning area found in the text.
    pub matched_keywords: Vec<String>,
}

impl AreaClassification {
    fn general() -> Self {
        Self {
            area: None,
            confidence: 0.0,
            matched_keywords: Vec::new(),
        }
    }
}

/// Classify `text` into the legal area whose keywords it matches best.
///
/// Each matched keyword contributes `ln(1 + occurrences)` times the area
/// weight; several distinct keywords add a 10% bonus each. Confidence is
/// the area score divided by 3, capped at 1.
pub fn classify_area(text: &str) -> AreaClassification {
    let lower = text.to_lowercase();
    let mut best: Option<(LegalArea, f64, Vec<String>)> = None;

    for area in LegalArea::all() {
        let mut score = 0.0;
        let mut matched = Vec::new();
        for keyword in area.keywords() {
            let occurrences = lower.matches(keyword).count();
            if occurrences > 0 {
                score += (1.0 + occurrences as f64).ln() * area.weight();
                matched.push((*keyword).to_owned());
            }
        }
        if matched.len() > 1 {
            score *= 1.0 + 0.1 * matched.len() as f64;
        }
        let better = match &best {
            Some((_, best_score, _)) => score > *best_score,
            None => score > 0.0,
        };
        if better {
            best = Some((*area, score, matched));
        }
    }

    match best {
        Some((area, score, matched_keywords)) => AreaClassification {
            area: Some(area),
            confidence: (score / 3.0).min(1.0),
            matched_keywords,
        },
        None => AreaClassification::general(),
    }
}

/// How well a document's legal area agrees with the query's, in `[0, 1]`.
pub fn legal_context_score(query: &str, document: &str) -> f64 {
    let q = classify_area(query);
    let d = classify_area(document);
    match (q.area, d.area) {
        (Some(qa), Some(da)) if qa == da => 0.6 + 0.4 * (q.confidence * d.confidence).sqrt(),
        (Some(qa), Some(LegalArea::Administrative)) if qa.is_personal() => 0.1,
        (Some(_), Some(_)) => 0.2,
        (None, Some(_)) => 0.3 + 0.3 * d.confidence,
        (Some(_), None) => 0.2 * q.confidence,
        (None, None) => 0.3,
    }
}

/// Common misspellings in Bulgarian legal queries.
const TYPO_CORRECTIONS: &[(&str, &str)] = &[
    ("обещетение", "обезщетение"),
    ("насказание", "наказание"),
    ("същта", "същата"),
    ("връка", "връзка"),
    ("амога", "мога"),
    ("намам", "нямам"),
];

/// Abbreviations of the main codes, expanded when they appear as whole words.
const CODE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("гк", "граждански кодекс"),
    ("гпк", "граждански процесуален кодекс"),
    ("нк", "наказателен кодекс"),
    ("нпк", "наказателно-процесуален кодекс"),
    ("апк", "административнопроцесуален кодекс"),
    ("тз", "търговски закон"),
    ("тк", "кодекс на труда"),
    ("кт", "кодекс на труда"),
    ("ззд", "закон за задълженията и договорите"),
];

/// Lowercase the query, fix common typos and expand code abbreviations.
pub fn normalize_query(query: &str) -> String {
    let mut text = query.to_lowercase();
    for (typo, correction) in TYPO_CORRECTIONS {
        if text.contains(typo) {
            text = text.replace(typo, correction);
        }
    }
    text.split_whitespace()
        .map(|word| {
            let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
            CODE_ABBREVIATIONS
                .iter()
                .find(|(abbrev, _)| *abbrev == bare)
                .map_or(word, |(_, expansion)| *expansion)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Category of an extracted legal citation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationKind {
    /// `чл. 45, ал. 1`
    Article,
    /// `ал. 2` outside an article reference
    Paragraph,
    /// `т. 5` outside an article reference
    Point,
    /// `§ 10`
    Section,
    /// `Решение № 123/2020`, `Определение № 5`
    Decision,
    /// `дело № 456/2019`
    Case,
    /// European Case Law Identifier
    Ecli,
    /// `Закон за ...`, `Правилник за ...`
    Law,
    /// `Наказателен кодекс`, `Кодекс на труда`
    Code,
    /// `Наредба № 7`
    Regulation,
    /// `Постановление № 12`, `ПМС № 3`
    Decree,
}

/// A citation found in legal text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Citation {
    /// Category.
    pub kind: CitationKind,
    /// Matched text, whitespace-trimmed.
    pub text: String,
}

const CITATION_PATTERNS: &[(CitationKind, &str)] = &[
    (
        CitationKind::Article,
        r"(?i)\bчл\.\s*\d+[а-я]?(?:,\s*ал\.\s*\d+)?(?:,\s*т\.\s*\d+)?",
    ),
    (CitationKind::Paragraph, r"(?i)\bал\.\s*\d+"),
    (CitationKind::Point, r"(?i)\bт\.\s*\d+"),
    (CitationKind::Section, r"§\s*\d+[а-я]?"),
    (
        CitationKind::Decision,
        r"(?i)\b(?:решение|определение|р-ние)\s*№\s*\d+(?:/\d{2,4})?",
    ),
    (CitationKind::Case, r"(?i)\bдело\s*№?\s*\d+(?:/\d{2,4})?"),
    (CitationKind::Ecli, r"ECLI:[A-Z]{2}:[A-Z0-9]+:\d{4}:[A-Za-z0-9.]+"),
    (
        CitationKind::Law,
        r"(?:Закон|Правилник)\s+(?:за|относно)(?:\s+[а-я]+){1,5}",
    ),
    (
        CitationKind::Code,
        r"[А-Я][а-я]+(?:\s+[а-я]+)?\s+кодекс|Кодекс\s+(?:на|за)\s+[а-я]+",
    ),
    (CitationKind::Regulation, r"(?i)\bнаредба\s*№?\s*\d+"),
    (CitationKind::Decree, r"(?i)\b(?:постановление|пмс)\s*№?\s*\d+"),
];

fn citation_patterns() -> &'static [(CitationKind, Regex)] {
    static PATTERNS: OnceLock<Vec<(CitationKind, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        CITATION_PATTERNS
            .iter()
            .filter_map(|(kind, pattern)| match Regex::new(pattern) {
                Ok(re) => Some((*kind, re)),
                Err(e) => {
                    tracing::error!(?kind, error = %e, "invalid citation pattern");
                    None
                }
            })
            .collect()
    })
}

/// Extract legal citations from `text`.
///
/// Paragraph and point references that are part of an article reference
/// are reported only once, as the article. Output is deduplicated and
/// sorted by kind, then text.
pub fn extract_citations(text: &str) -> Vec<Citation> {
    let mut article_spans: Vec<Range<usize>> = Vec::new();
    let mut citations: Vec<Citation> = Vec::new();

    for (kind, re) in citation_patterns() {
        for m in re.find_iter(text) {
            let span = m.range();
            match kind {
                CitationKind::Article => article_spans.push(span.clone()),
                CitationKind::Paragraph | CitationKind::Point => {
                    let inside = article_spans
                        .iter()
                        .any(|a| a.start <= span.start && span.end <= a.end);
                    if inside {
                        continue;
                    }
                }
                _ => {}
            }
            let cited = m.as_str().trim().trim_end_matches('.').to_owned();
            if cited.chars().count() > 2 {
                citations.push(Citation {
                    kind: *kind,
                    text: cited,
                });
            }
        }
    }

    citations.sort();
    citations.dedup();
    citations
}

/// Kind of legal document, guessed from its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Decision of the Council of Ministers.
    CouncilOfMinistersDecision,
    /// Court decision or ruling.
    CourtDecision,
    /// Law.
    Law,
    /// Code.
    Code,
    /// Regulation (наредба).
    Regulation,
    /// Decree (постановление).
    Decree,
    /// Anything else.
    Generic,
}

/// Guess the document type from characteristic words in its text.
pub fn identify_document_type(text: &str) -> DocumentType {
    let lower = text.to_lowercase();
    let has = |needle: &str| lower.contains(needle);

    if has("решение") && has("министерски съвет") {
        DocumentType::CouncilOfMinistersDecision
    } else if has("решение") && (has("съд") || has("дело")) {
        DocumentType::CourtDecision
    } else if has("закон") {
        DocumentType::Law
    } else if has("кодекс") {
        DocumentType::Code
    } else if has("наредба") {
        DocumentType::Regulation
    } else if has("постановление") {
        DocumentType::Decree
    } else {
        DocumentType::Generic
    }
}
