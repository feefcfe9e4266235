//! Follow-up detection and question rewriting.
//!
//! Keyword heuristics, not a parser. They sit behind [`FollowupStrategy`] so a smarter
//! detector can replace them without touching the router.

use crate::conversation::keywords::{
    contains_data_keyword, contains_words, starts_with_word, DEPARTMENT_HINTS, FOLLOWUP_OPENERS,
    FOLLOWUP_TRIGGERS,
};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Trailing `in X` / `for X` clause, up to closing punctuation.
    static ref TRAILING_CLAUSE: Regex =
        Regex::new(r"(?i)\b((?:in|for)\s+[^?!.]+?)\s*[?!.]*\s*$").unwrap();
}

pub trait FollowupStrategy: Send + Sync {
    fn is_followup(&self, question: &str) -> bool;

    /// Merge a follow-up with the question it refers to.
    fn rewrite(&self, current: &str, previous: &str) -> String;
}

/// Keyword-driven detector used by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordFollowups;

impl FollowupStrategy for KeywordFollowups {
    fn is_followup(&self, question: &str) -> bool {
        is_followup(question)
    }

    fn rewrite(&self, current: &str, previous: &str) -> String {
        rewrite_followup(current, previous)
    }
}

pub fn is_followup(question: &str) -> bool {
    let q = question.trim().to_lowercase();
    if q.is_empty() {
        return false;
    }

    if FOLLOWUP_OPENERS.iter().any(|opener| starts_with_word(&q, opener)) {
        return true;
    }

    if FOLLOWUP_TRIGGERS.iter().any(|phrase| q.contains(phrase)) {
        return true;
    }

    let mentions_department = DEPARTMENT_HINTS.iter().any(|hint| contains_words(&q, hint));
    mentions_department && !contains_data_keyword(&q)
}

/// Resolve `current` against `previous` into one self-contained question.
pub fn rewrite_followup(current: &str, previous: &str) -> String {
    if previous.trim().is_empty() {
        return current.to_string();
    }

    if contains_data_keyword(current) {
        return current.to_string();
    }

    let base = previous.trim().trim_end_matches('?').trim_end();

    if let Some(caps) = TRAILING_CLAUSE.captures(current.trim()) {
        let clause = caps[1].trim();
        if previous.to_lowercase().contains(&clause.to_lowercase()) {
            return previous.to_string();
        }
        return format!("{} {}?", base, clause);
    }

    let current = current.trim().trim_end_matches('?').trim_end();
    format!("{} ({})?", base, current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openers() {
        assert!(is_followup("What about in Sales?"));
        assert!(is_followup("  how about managers"));
        assert!(is_followup("And for women?"));
        assert!(is_followup("only the ones with overtime"));
        assert!(is_followup("Same thing for 2019"));
        assert!(!is_followup("Android developers count"));
    }

    #[test]
    fn test_triggers() {
        assert!(is_followup("Show the attrition rate for them"));
        assert!(is_followup("break it down by job role"));
        assert!(is_followup("Use median instead"));
    }

    #[test]
    fn test_department_hint_without_data_keyword() {
        assert!(is_followup("Research & Development?"));
        assert!(is_followup("in HR?"));
        assert!(!is_followup("What's the average salary in Sales?"));
    }

    #[test]
    fn test_not_followup() {
        assert!(!is_followup(""));
        assert!(!is_followup("   "));
        assert!(!is_followup("How many employees are there?"));
        assert!(!is_followup("How can I reduce burnout?"));
    }

    #[test]
    fn test_rewrite_appends_clause() {
        let rewritten = rewrite_followup("what about in Sales?", "What's the average salary?");
        assert_eq!(rewritten, "What's the average salary in Sales?");
        assert!(rewritten.contains("average salary"));
        assert!(rewritten.contains("Sales"));
        assert!(rewritten.ends_with('?'));
    }

    #[test]
    fn test_rewrite_with_for_clause() {
        let rewritten = rewrite_followup("and for people in R&D", "How many employees left?");
        assert_eq!(rewritten, "How many employees left for people in R&D?");
    }

    #[test]
    fn test_rewrite_empty_previous_is_identity() {
        for q in ["what about in Sales?", "", "anything", "  padded  "] {
            assert_eq!(rewrite_followup(q, ""), q);
        }
    }

    #[test]
    fn test_rewrite_keeps_self_contained_question() {
        let q = "What's the attrition rate in Sales?";
        assert_eq!(rewrite_followup(q, "How many employees are there?"), q);
    }

    #[test]
    fn test_rewrite_clause_already_present() {
        let previous = "What's the average salary in Sales?";
        assert_eq!(rewrite_followup("what about in sales?", previous), previous);
    }

    #[test]
    fn test_rewrite_last_resort_merge() {
        let rewritten = rewrite_followup("women?", "What's the attrition rate?");
        assert_eq!(rewritten, "What's the attrition rate (women)?");
    }

    #[test]
    fn test_strategy_delegates() {
        let strategy = KeywordFollowups;
        assert!(strategy.is_followup("what about in Sales?"));
        assert_eq!(
            strategy.rewrite("what about in Sales?", "What's the average salary?"),
            "What's the average salary in Sales?"
        );
    }
}
