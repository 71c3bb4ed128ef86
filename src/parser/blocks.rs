//! Block builder: group one section's lines into prose and code blocks.
//!
//! A fold over the lines carrying the open block and the finished list.
//! Blank lines never change the block type; they sit in whichever block is
//! open and disappear if they end up at its edges after trimming.

use super::classify::is_code_with;
use crate::config::ParserConfig;
use crate::document::{BlockKind, ContentBlock};

#[derive(Debug)]
struct OpenBlock<'a> {
    kind: BlockKind,
    lines: Vec<&'a str>,
}

#[derive(Debug)]
struct BlockFold<'a> {
    done: Vec<ContentBlock>,
    open: OpenBlock<'a>,
}

impl<'a> BlockFold<'a> {
    fn seeded(kind: BlockKind) -> Self {
        Self {
            done: Vec::new(),
            open: OpenBlock {
                kind,
                lines: Vec::new(),
            },
        }
    }

    fn step(mut self, line: &'a str, config: &ParserConfig) -> Self {
        if !line.trim().is_empty() {
            let kind = kind_of(line, config);
            if kind != self.open.kind {
                let next = OpenBlock {
                    kind,
                    lines: Vec::new(),
                };
                let finished = std::mem::replace(&mut self.open, next);
                self.done.extend(flush(finished));
            }
        }
        self.open.lines.push(line);
        self
    }

    fn finish(mut self) -> Vec<ContentBlock> {
        self.done.extend(flush(self.open));
        self.done
    }
}

fn kind_of(line: &str, config: &ParserConfig) -> BlockKind {
    if is_code_with(line, config) {
        BlockKind::Code
    } else {
        BlockKind::Prose
    }
}

fn flush(block: OpenBlock<'_>) -> Option<ContentBlock> {
    let joined = block.lines.join("\n");
    if joined.trim().is_empty() {
        return None;
    }
    let content = match block.kind {
        BlockKind::Prose => joined.trim(),
        BlockKind::Code => joined.trim_end(),
    };
    Some(ContentBlock {
        kind: block.kind,
        content: content.to_string(),
    })
}

/// Build the blocks for one section's content lines.
///
/// The first line seeds the block type; a blank first line is not code, so
/// it seeds prose.
pub fn build_blocks<S: AsRef<str>>(lines: &[S], config: &ParserConfig) -> Vec<ContentBlock> {
    let Some(first) = lines.first() else {
        return Vec::new();
    };
    let seed = kind_of(first.as_ref(), config);
    lines
        .iter()
        .fold(BlockFold::seeded(seed), |acc, line| {
            acc.step(line.as_ref(), config)
        })
        .finish()
}
