//! Heuristic chapter parser.
//!
//! Turns unmarked plain text into a [`ParsedDocument`] using only layout and
//! lexical cues.
//!
//! ## Data Flow
//!
//! ```text
//! text ──▶ classify ──▶ segment ──▶ blocks
//!          (per line)   (sections)  (per section)
//! ```
//!
//! 1. [`classify`] — stateless per-line predicates: heading, code, prose, blank
//! 2. [`segment`]  — header selection and section boundaries, one fold over
//!    the lines
//! 3. [`blocks`]   — groups a section's lines into alternating prose/code
//!    blocks
//!
//! Every stage is a pure function of its input, so a single parse is safe to
//! run from any number of threads at once.

pub mod blocks;
pub mod classify;
pub mod segment;

use crate::config::ParserConfig;
use crate::document::ParsedDocument;

/// Parse a chapter with the stock heuristics.
///
/// Never fails: empty or odd input degrades to a single `"Content"` section.
///
/// ```rust
/// let doc = tutor_reader::parse("INTRODUCTION\nWelcome to the series");
/// assert_eq!(doc.sections[0].id, "introduction-0");
/// ```
pub fn parse(text: &str) -> ParsedDocument {
    parse_with(text, &ParserConfig::default())
}

/// Parse a chapter with overridden heuristics.
pub fn parse_with(text: &str, config: &ParserConfig) -> ParsedDocument {
    segment::segment(text, config)
}
