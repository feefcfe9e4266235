//! Keyword sets shared by follow-up detection and the keyword intent fallback.

use lazy_static::lazy_static;
use regex::Regex;

/// Openers that mark a question as leaning on the previous one.
pub const FOLLOWUP_OPENERS: &[&str] = &["what about", "how about", "and", "only", "same"];

pub const FOLLOWUP_TRIGGERS: &[&str] = &[
    "same for",
    "same but",
    "for them",
    "for those",
    "of them",
    "of those",
    "among them",
    "among those",
    "that group",
    "this group",
    "instead",
    "compared to",
    "break it down",
    "split it by",
    "what if we",
];

pub const DEPARTMENT_HINTS: &[&str] = &[
    "sales",
    "research",
    "r&d",
    "development",
    "human resources",
    "hr",
];

pub const GREETING_WORDS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
    "thanks",
    "thank you",
];

/// Substrings that mark an assistant turn as a data answer.
pub const DATA_RESPONSE_MARKERS: &[&str] = &["**result", "**average", "rate:**", "**rate", "%", "count", "rows)"];

const DATA_KEYWORDS: &[&str] = &[
    "how many",
    "number of",
    "count",
    "average",
    "avg",
    "mean",
    "median",
    "total",
    "sum",
    "rate",
    "rates",
    "ratio",
    "percent",
    "percentage",
    "proportion",
    "attrition",
    "overtime",
    "salary",
    "salaries",
    "income",
    "distribution",
    "breakdown",
    "highest",
    "lowest",
    "maximum",
    "minimum",
    "list",
    "show",
];

lazy_static! {
    static ref DATA_KEYWORD_PATTERN: Regex = Regex::new(&format!(
        r"(?i)\b(?:{})\b",
        DATA_KEYWORDS.iter().map(|k| regex::escape(k)).collect::<Vec<_>>().join("|")
    ))
    .unwrap();
}

/// Whether the text mentions something only the dataset can answer.
pub fn contains_data_keyword(text: &str) -> bool {
    DATA_KEYWORD_PATTERN.is_match(text)
}

/// `text` starts with `phrase` followed by a word boundary. Expects lowercase input.
pub fn starts_with_word(text: &str, phrase: &str) -> bool {
    text.strip_prefix(phrase)
        .map(|rest| !rest.starts_with(|c: char| c.is_alphanumeric()))
        .unwrap_or(false)
}

/// `text` contains `phrase` as whole words. Expects lowercase input.
pub fn contains_words(text: &str, phrase: &str) -> bool {
    text.match_indices(phrase).any(|(start, _)| {
        let before_ok = text[..start]
            .chars()
            .next_back()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
        let after_ok = text[start + phrase.len()..]
            .chars()
            .next()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
        before_ok && after_ok
    })
}
