//! Document segmenter: header selection and section boundaries.
//!
//! The scan is a fold over the normalised lines carrying an explicit
//! [`Segmentation`] value (open section draft plus finished sections), so
//! the segmenter holds no state between calls.

use super::blocks::build_blocks;
use super::classify::is_heading_with;
use crate::config::ParserConfig;
use crate::document::{ContentBlock, ParsedDocument, Section};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

const FALLBACK_HEADER: &str = "Document";
const FALLBACK_TITLE: &str = "Untitled";
const SYNTHETIC_ID: &str = "content-0";
const SYNTHETIC_TITLE: &str = "Content";

static RE_NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Normalise line endings and drop leading/trailing blank lines.
pub fn normalise_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|l| l.trim().is_empty()).count();
    lines.drain(..leading);
    lines
}

/// Lowercase, collapse non-alphanumeric runs to `-`, strip edge hyphens.
pub fn slugify(s: &str) -> String {
    RE_NON_ALNUM
        .replace_all(&s.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// Pick the header from the lines before the first heading.
fn select_header(region: &[&str], part_prefix: &str) -> String {
    region
        .iter()
        .map(|l| l.trim())
        .find(|l| l.starts_with(part_prefix))
        .or_else(|| region.iter().map(|l| l.trim()).find(|l| !l.is_empty()))
        .unwrap_or(FALLBACK_HEADER)
        .to_string()
}

#[derive(Debug)]
struct SectionDraft<'a> {
    heading: &'a str,
    lines: Vec<&'a str>,
}

#[derive(Debug, Default)]
struct Segmentation<'a> {
    sections: Vec<Section>,
    draft: Option<SectionDraft<'a>>,
    skipped: usize,
}

impl<'a> Segmentation<'a> {
    fn step(mut self, line: &'a str, config: &ParserConfig) -> Self {
        if is_heading_with(line, config) {
            self.finalize(config);
            self.draft = Some(SectionDraft {
                heading: line.trim(),
                lines: Vec::new(),
            });
        } else if let Some(draft) = self.draft.as_mut() {
            draft.lines.push(line);
        }
        self
    }

    fn finalize(&mut self, config: &ParserConfig) {
        let Some(draft) = self.draft.take() else {
            return;
        };
        if draft.heading.is_empty() && draft.lines.is_empty() {
            return;
        }
        let upper = draft.heading.to_uppercase();
        if config
            .copyright_markers
            .iter()
            .any(|marker| upper.contains(marker.as_str()))
        {
            debug!("Dropping section '{}' ({} lines)", draft.heading, draft.lines.len());
            self.skipped += 1;
            return;
        }

        let stripped = draft
            .heading
            .trim_matches(|c: char| c == '*' || c.is_whitespace());
        let title = if stripped.is_empty() {
            FALLBACK_TITLE
        } else {
            stripped
        };
        let ordinal = self.sections.len();
        let id = format!("{}-{}", slugify(title), ordinal);

        self.sections.push(Section {
            id,
            title: title.to_string(),
            blocks: build_blocks(&draft.lines, config),
        });
    }

    fn finish(mut self, config: &ParserConfig) -> (Vec<Section>, usize) {
        self.finalize(config);
        (self.sections, self.skipped)
    }
}

fn synthetic_section(lines: &[&str]) -> Section {
    Section {
        id: SYNTHETIC_ID.to_string(),
        title: SYNTHETIC_TITLE.to_string(),
        blocks: vec![ContentBlock::prose(lines.join("\n"))],
    }
}

/// Split `text` into a header and sections.
pub fn segment(text: &str, config: &ParserConfig) -> ParsedDocument {
    let lines = normalise_lines(text);

    let Some(first_heading) = lines.iter().position(|l| is_heading_with(l, config)) else {
        debug!("No heading in {} lines; emitting a single Content section", lines.len());
        return ParsedDocument {
            header: FALLBACK_HEADER.to_string(),
            sections: vec![synthetic_section(&lines)],
        };
    };

    let header = select_header(&lines[..first_heading], &config.part_prefix);

    let (mut sections, skipped) = lines[first_heading..]
        .iter()
        .fold(Segmentation::default(), |acc, &line| acc.step(line, config))
        .finish(config);

    if sections.is_empty() {
        sections.push(synthetic_section(&lines));
    }

    debug!(
        "Segmented {} lines into {} sections ({} dropped)",
        lines.len(),
        sections.len(),
        skipped
    );

    ParsedDocument { header, sections }
}
