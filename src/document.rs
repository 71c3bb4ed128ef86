//! Output types for a parsed chapter.
//!
//! A [`ParsedDocument`] is produced once per [`crate::parser::parse`] call and
//! never mutated afterwards. All types derive `Serialize`/`Deserialize` so the
//! CLI can emit them as JSON and callers can ship them to a front end as-is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A whole chapter: the header line plus its sections in reading order.
///
/// `sections` is never empty; a text with no heading at all becomes a single
/// synthetic `"Content"` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Line shown above the table of contents (e.g. `"Part I: INTRODUCTION"`).
    pub header: String,
    /// Sections in document order. Ids are unique within the document.
    pub sections: Vec<Section>,
}

/// A titled run of content between two heading lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// `slug(title)-ordinal`, unique within the document.
    pub id: String,
    /// Heading text with surrounding asterisks and whitespace removed.
    pub title: String,
    /// Content blocks; adjacent blocks never share a [`BlockKind`].
    pub blocks: Vec<ContentBlock>,
}

/// The two kinds of content the classifier distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Prose,
    Code,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Prose => f.write_str("prose"),
            BlockKind::Code => f.write_str("code"),
        }
    }
}

/// A maximal run of same-kind lines within a section.
///
/// `content` is never empty or whitespace-only. Prose is fully trimmed; code
/// keeps its leading indentation and loses only trailing whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub content: String,
}

impl ContentBlock {
    pub fn prose(content: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Prose,
            content: content.into(),
        }
    }

    pub fn code(content: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Code,
            content: content.into(),
        }
    }

    pub fn is_code(&self) -> bool {
        self.kind == BlockKind::Code
    }
}

/// Block counts for a parsed document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub sections: usize,
    pub prose_blocks: usize,
    pub code_blocks: usize,
}

impl ParsedDocument {
    /// Look up a section by its id.
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Section titles in order, as shown in a table of contents.
    pub fn titles(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.title.as_str()).collect()
    }

    pub fn stats(&self) -> DocumentStats {
        self.sections
            .iter()
            .flat_map(|s| s.blocks.iter())
            .fold(
                DocumentStats {
                    sections: self.sections.len(),
                    ..Default::default()
                },
                |mut stats, block| {
                    match block.kind {
                        BlockKind::Prose => stats.prose_blocks += 1,
                        BlockKind::Code => stats.code_blocks += 1,
                    }
                    stats
                },
            )
    }

    /// Reassemble the document as plain text.
    ///
    /// Header first, then each section title followed by its blocks, every
    /// part separated by one blank line. Titles are written as
    /// `*** TITLE ***` so that short or bracketed titles still read as
    /// headings; parsing the result again yields the same section titles and
    /// block kinds.
    pub fn to_text(&self) -> String {
        let mut parts: Vec<String> = vec![self.header.clone()];
        for section in &self.sections {
            parts.push(format!("*** {} ***", section.title));
            parts.extend(section.blocks.iter().map(|b| b.content.clone()));
        }
        parts.join("\n\n")
    }

    /// Render as Markdown: header as `#`, sections as `##`, code fenced.
    pub fn to_markdown(&self) -> String {
        let mut md = format!("# {}\n", self.header);
        for section in &self.sections {
            md.push_str(&format!("\n## {}\n", section.title));
            for block in &section.blocks {
                match block.kind {
                    BlockKind::Prose => md.push_str(&format!("\n{}\n", block.content)),
                    BlockKind::Code => md.push_str(&format!("\n```\n{}\n```\n", block.content)),
                }
            }
        }
        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParsedDocument {
        ParsedDocument {
            header: "Part I: INTRODUCTION".into(),
            sections: vec![
                Section {
                    id: "introduction-0".into(),
                    title: "INTRODUCTION".into(),
                    blocks: vec![
                        ContentBlock::prose("Welcome aboard"),
                        ContentBlock::code("begin\n  x := 1;\nend"),
                    ],
                },
                Section {
                    id: "the-cradle-1".into(),
                    title: "THE CRADLE".into(),
                    blocks: vec![],
                },
            ],
        }
    }

    #[test]
    fn block_serialises_with_type_field() {
        let json = serde_json::to_string(&ContentBlock::code("x := 1;")).unwrap();
        assert_eq!(json, r#"{"type":"code","content":"x := 1;"}"#);
    }

    #[test]
    fn block_deserialises_lowercase_kind() {
        let block: ContentBlock =
            serde_json::from_str(r#"{"type":"prose","content":"hi"}"#).unwrap();
        assert_eq!(block, ContentBlock::prose("hi"));
    }

    #[test]
    fn section_lookup_by_id() {
        let doc = sample();
        assert_eq!(doc.section("the-cradle-1").unwrap().title, "THE CRADLE");
        assert!(doc.section("missing-9").is_none());
    }

    #[test]
    fn stats_count_blocks_by_kind() {
        let stats = sample().stats();
        assert_eq!(
            stats,
            DocumentStats {
                sections: 2,
                prose_blocks: 1,
                code_blocks: 1
            }
        );
    }

    #[test]
    fn to_text_separates_parts_with_blank_lines() {
        assert_eq!(
            sample().to_text(),
            "Part I: INTRODUCTION\n\n*** INTRODUCTION ***\n\nWelcome aboard\n\nbegin\n  x := 1;\nend\n\n*** THE CRADLE ***"
        );
    }

    #[test]
    fn block_kind_displays_as_its_json_name() {
        let kinds: Vec<String> = sample().sections[0]
            .blocks
            .iter()
            .map(|b| b.kind.to_string())
            .collect();
        assert_eq!(kinds, vec!["prose", "code"]);
        assert_eq!(
            serde_json::to_value(BlockKind::Code).unwrap(),
            BlockKind::Code.to_string()
        );
    }

    #[test]
    fn markdown_fences_code_blocks() {
        let md = sample().to_markdown();
        assert!(md.starts_with("# Part I: INTRODUCTION\n"));
        assert!(md.contains("\n## THE CRADLE\n"));
        assert!(md.contains("\n```\nbegin\n  x := 1;\nend\n```\n"));
    }
}
