//! Line classifier: heading / code / prose / blank, one line at a time.
//!
//! Each decision is a short list of independent predicates evaluated in
//! order. Headings must pass every heading rule; a non-blank line is code if
//! any code rule fires. The code rules deliberately favour recall: prose shown
//! in monospace is tolerable, a listing split into paragraphs is not.

use crate::config::{compile_keywords, ParserConfig, DEFAULT_CODE_KEYWORDS};
use once_cell::sync::Lazy;
use regex::Regex;

/// What a single physical line looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Heading,
    Code,
    Prose,
    Blank,
}

static RE_DEFAULT_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| compile_keywords(DEFAULT_CODE_KEYWORDS).unwrap());

/// Heading rules that hold regardless of configuration, applied to the
/// trimmed line.
const HEADING_RULES: &[fn(&str) -> bool] = &[
    long_enough,
    starts_with_capital_or_star,
    has_uppercase_letter,
    has_no_lowercase_letter,
    not_a_separator_rule,
];

fn long_enough(t: &str) -> bool {
    t.chars().count() >= 3
}

fn starts_with_capital_or_star(t: &str) -> bool {
    t.chars()
        .next()
        .is_some_and(|c| c.is_ascii_uppercase() || c == '*')
}

fn has_uppercase_letter(t: &str) -> bool {
    t.chars().any(|c| c.is_ascii_uppercase())
}

fn has_no_lowercase_letter(t: &str) -> bool {
    !t.chars().any(|c| c.is_ascii_lowercase())
}

// "-----", "*****", "= = =" and friends.
fn not_a_separator_rule(t: &str) -> bool {
    !t.chars()
        .all(|c| matches!(c, '*' | '-' | '=' | '_') || c.is_whitespace())
}

// Stock allow-list; digits and colons are deliberately absent, so
// "CHAPTER 1" is not a heading.
fn uses_heading_charset(t: &str) -> bool {
    t.chars().all(|c| {
        c.is_ascii_uppercase() || c.is_whitespace() || matches!(c, '*' | '-' | '(' | ')')
    })
}

/// True if `line` starts a new section, using the stock rules.
pub fn is_heading(line: &str) -> bool {
    is_heading_with(line, &ParserConfig::default())
}

pub fn is_heading_with(line: &str, config: &ParserConfig) -> bool {
    let trimmed = line.trim();
    if !HEADING_RULES.iter().all(|rule| rule(trimmed)) {
        return false;
    }
    match &config.heading_pattern {
        Some(re) => re.is_match(trimmed),
        None => uses_heading_charset(trimmed),
    }
}

/// True if a non-heading line looks like part of a code listing.
///
/// Blank lines are never code.
pub fn is_code(line: &str) -> bool {
    is_code_with(line, &ParserConfig::default())
}

pub fn is_code_with(line: &str, config: &ParserConfig) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    let keywords = config.code_keywords.as_ref().unwrap_or(&*RE_DEFAULT_KEYWORDS);

    opens_with_brace(line)
        || is_indented(line)
        || keywords.is_match(line)
        || ends_statement(trimmed)
        || line.contains(":=")
        || ends_with_bare_period(trimmed)
}

// Pascal comments: `{ ... }`.
fn opens_with_brace(line: &str) -> bool {
    line.trim_start().starts_with('{')
}

fn is_indented(line: &str) -> bool {
    line.chars().take_while(|c| c.is_whitespace()).count() >= 4
}

fn ends_statement(trimmed: &str) -> bool {
    trimmed.ends_with(';')
}

// A trailing period marks code only on a single-token line (`end.`,
// `Init.`); a line of several words ending in a period is a sentence.
fn ends_with_bare_period(trimmed: &str) -> bool {
    trimmed.ends_with('.') && !trimmed.contains(char::is_whitespace)
}

/// Classify one line with the stock rules.
pub fn classify(line: &str) -> LineKind {
    classify_with(line, &ParserConfig::default())
}

pub fn classify_with(line: &str, config: &ParserConfig) -> LineKind {
    if line.trim().is_empty() {
        LineKind::Blank
    } else if is_heading_with(line, config) {
        LineKind::Heading
    } else if is_code_with(line, config) {
        LineKind::Code
    } else {
        LineKind::Prose
    }
}
