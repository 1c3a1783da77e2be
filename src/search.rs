use crate::document::Question;
use regex::{Regex, RegexBuilder};

/// A question that survived filtering, with its position in the unfiltered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilteredQuestion<'a> {
    pub index: usize,
    pub question: &'a Question,
}

/// One run of text, marked when it matched the search term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightSpan<'a> {
    pub text: &'a str,
    pub is_match: bool,
}

/// Keep questions whose question or answer contains `term`, ignoring case. Order is preserved.
///
/// Matching uses the same literal pattern as [`highlight`], so every kept row has a highlighted run.
pub fn filter_questions<'a>(questions: &'a [Question], term: &str) -> Vec<FilteredQuestion<'a>> {
    let pattern = literal_pattern(term);
    questions
        .iter()
        .enumerate()
        .filter(|(_, question)| match &pattern {
            Some(pattern) => matches_pattern(question, pattern),
            None => true,
        })
        .map(|(index, question)| FilteredQuestion { index, question })
        .collect()
}

fn matches_pattern(question: &Question, pattern: &Regex) -> bool {
    pattern.is_match(&question.question)
        || (!question.answer.is_empty() && pattern.is_match(&question.answer))
}

/// Split `text` around case-insensitive occurrences of `term`, treated literally.
pub fn highlight<'a>(text: &'a str, term: &str) -> Vec<HighlightSpan<'a>> {
    let Some(pattern) = literal_pattern(term) else {
        return vec![HighlightSpan {
            text,
            is_match: false,
        }];
    };

    let mut spans = Vec::new();
    let mut cursor = 0;
    for found in pattern.find_iter(text) {
        if found.start() > cursor {
            spans.push(HighlightSpan {
                text: &text[cursor..found.start()],
                is_match: false,
            });
        }
        spans.push(HighlightSpan {
            text: found.as_str(),
            is_match: true,
        });
        cursor = found.end();
    }
    if cursor < text.len() || spans.is_empty() {
        spans.push(HighlightSpan {
            text: &text[cursor..],
            is_match: false,
        });
    }
    spans
}

fn literal_pattern(term: &str) -> Option<Regex> {
    if term.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
        .ok()
}

/// "1 search result" / "N search results".
pub fn result_label(count: usize) -> String {
    if count == 1 {
        format!("{} search result", count)
    } else {
        format!("{} search results", count)
    }
}
