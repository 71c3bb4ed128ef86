//! # tutor-reader
//!
//! Structure retyped compiler-construction chapters (prose interleaved with
//! Pascal-style listings, no markup at all) into titled sections of typed
//! prose and code blocks.
//!
//! ## Why heuristics?
//!
//! The source texts are plain ASCII transcriptions: headings are just
//! all-caps lines, listings are just indented or semicolon-terminated lines.
//! There is nothing to parse in the grammatical sense, so the parser works
//! from layout and lexical cues and degrades gracefully instead of failing.
//! Misreading prose as code costs little (it renders in monospace); splitting
//! a listing into paragraphs costs a lot, so the code rules favour recall.
//!
//! ## Pipeline Overview
//!
//! ```text
//! chapter file
//!  │
//!  ├─ 1. Library   read <root>/<name>.txt (not-found vs. I/O failure)
//!  ├─ 2. Classify  per line: heading / code / prose / blank
//!  ├─ 3. Segment   header + sections (copyright sections dropped)
//!  ├─ 4. Blocks    alternating prose/code blocks per section
//!  └─ 5. Modernize optional LLM rewrite of prose blocks
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use tutor_reader::{parse, BlockKind};
//!
//! let doc = parse("THE CRADLE\nHere is the skeleton\n    x := 1;");
//! assert_eq!(doc.sections[0].title, "THE CRADLE");
//! assert_eq!(doc.sections[0].blocks[1].kind, BlockKind::Code);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `tutor` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## Known limitation
//!
//! Headings may only contain uppercase letters, whitespace, `*`, `-`, `(` and
//! `)`, so `"CHAPTER 1"` is not a heading. Widen the allow-list with
//! [`ParserConfigBuilder::heading_pattern`] when a corpus needs it.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod library;
pub mod modernize;
pub mod parser;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ModernizeConfig, ModernizeConfigBuilder, ParserConfig, ParserConfigBuilder};
pub use document::{BlockKind, ContentBlock, DocumentStats, ParsedDocument, Section};
pub use error::{ReaderError, SectionError};
pub use library::{ChapterLibrary, ManifestSummary};
pub use modernize::{
    modernize, modernize_document, modernize_section, parse_model_reply, BlockModernization,
    Modernization, ModernizeOutput, TermMapping,
};
pub use parser::classify::{classify, is_code, is_heading, LineKind};
pub use parser::{parse, parse_with};
pub use progress::{ModernizeProgressCallback, NoopProgressCallback, ProgressCallback};
