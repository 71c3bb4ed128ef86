//! Chapter library: a directory of plain-text chapter files.
//!
//! Chapters are addressed by name (`tutor1` → `<root>/tutor1.txt`). Reads are
//! single-attempt; a missing file is reported as
//! [`ReaderError::ChapterNotFound`] so callers can show a not-found page
//! instead of a generic failure. The manifest is a JSON array of chapter file
//! names, written next to the chapters.

use crate::config::ParserConfig;
use crate::document::ParsedDocument;
use crate::error::ReaderError;
use crate::parser::parse_with;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_EXTENSION: &str = "txt";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Result of [`ChapterLibrary::write_manifest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSummary {
    pub path: PathBuf,
    pub entries: usize,
}

/// A directory of chapter files sharing one extension.
#[derive(Debug, Clone)]
pub struct ChapterLibrary {
    root: PathBuf,
    extension: String,
}

impl ChapterLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Use a different chapter file extension (without the dot).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// Map a chapter name to its file path.
    ///
    /// Accepts the bare stem (`tutor1`) or the file name (`tutor1.txt`).
    /// Rejects names that are empty or could leave the library directory.
    pub fn chapter_path(&self, name: &str) -> Result<PathBuf, ReaderError> {
        let stem = strip_extension(name.trim(), &self.extension);
        if stem.is_empty()
            || stem.contains(['/', '\\', '\0'])
            || stem == "."
            || stem.contains("..")
        {
            return Err(ReaderError::InvalidChapterName {
                name: name.to_string(),
            });
        }
        Ok(self.root.join(format!("{stem}.{}", self.extension)))
    }

    /// Read a chapter's raw text.
    pub async fn read_chapter(&self, name: &str) -> Result<String, ReaderError> {
        let path = self.chapter_path(name)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                debug!("Read chapter '{}' ({} bytes)", name, text.len());
                Ok(text)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ReaderError::ChapterNotFound {
                name: name.to_string(),
            }),
            Err(source) => Err(ReaderError::ReadFailed { path, source }),
        }
    }

    /// Read and parse a chapter.
    pub async fn load_chapter(
        &self,
        name: &str,
        config: &ParserConfig,
    ) -> Result<ParsedDocument, ReaderError> {
        let text = self.read_chapter(name).await?;
        Ok(parse_with(&text, config))
    }

    /// Chapter file names in the library, in reading order.
    ///
    /// Ordered by the first number in the name (`tutor2` before `tutor10`;
    /// names without one sort as 0), then by name ignoring case.
    pub async fn list_chapters(&self) -> Result<Vec<String>, ReaderError> {
        let list_err = |source| ReaderError::ListFailed {
            path: self.root.clone(),
            source,
        };
        let mut dir = tokio::fs::read_dir(&self.root).await.map_err(list_err)?;
        let suffix = format!(".{}", self.extension.to_lowercase());

        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(list_err)? {
            if let Some(name) = entry.file_name().to_str() {
                if name.to_lowercase().ends_with(&suffix) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort_by(|a, b| compare_chapter_names(a, b));
        Ok(names)
    }

    /// Write the chapter list to `manifest.json` (temp file + rename).
    pub async fn write_manifest(&self) -> Result<ManifestSummary, ReaderError> {
        let names = self.list_chapters().await?;
        let path = self.manifest_path();
        let json = serde_json::to_string_pretty(&names)
            .map_err(|e| ReaderError::Internal(format!("manifest serialisation: {e}")))?;

        let tmp_path = path.with_extension("json.tmp");
        let write_err = |source| ReaderError::ManifestWriteFailed {
            path: path.clone(),
            source,
        };
        tokio::fs::write(&tmp_path, json).await.map_err(write_err)?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(write_err)?;

        info!("Wrote {} entries to {}", names.len(), path.display());
        Ok(ManifestSummary {
            path,
            entries: names.len(),
        })
    }

    /// Read the chapter list back from `manifest.json`.
    pub async fn read_manifest(&self) -> Result<Vec<String>, ReaderError> {
        let path = self.manifest_path();
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ReaderError::ReadFailed {
                path: path.clone(),
                source,
            })?;
        serde_json::from_str(&text).map_err(|e| ReaderError::ManifestMalformed {
            path,
            detail: e.to_string(),
        })
    }
}

fn strip_extension<'a>(name: &'a str, extension: &str) -> &'a str {
    let suffix_len = extension.len() + 1;
    if name.len() > suffix_len && name.is_char_boundary(name.len() - suffix_len) {
        let (stem, suffix) = name.split_at(name.len() - suffix_len);
        if suffix.starts_with('.') && suffix[1..].eq_ignore_ascii_case(extension) {
            return stem;
        }
    }
    name
}

/// First run of ASCII digits in `name`, or 0.
fn chapter_number(name: &str) -> u64 {
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        0
    } else {
        digits.parse().unwrap_or(u64::MAX)
    }
}

// Number first, then case-insensitively so `Appendix` and `appendix-b` stay
// together; byte order only settles exact case variants.
fn compare_chapter_names(a: &str, b: &str) -> Ordering {
    chapter_number(a)
        .cmp(&chapter_number(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_path_adds_extension() {
        let lib = ChapterLibrary::new("/srv/texts");
        assert_eq!(
            lib.chapter_path("tutor1").unwrap(),
            PathBuf::from("/srv/texts/tutor1.txt")
        );
        assert_eq!(
            lib.chapter_path("tutor1.TXT").unwrap(),
            PathBuf::from("/srv/texts/tutor1.txt")
        );
    }

    #[test]
    fn chapter_path_rejects_escapes() {
        let lib = ChapterLibrary::new("/srv/texts");
        for bad in ["", "  ", "../etc/passwd", "a/b", "a\\b", "."] {
            assert!(
                matches!(
                    lib.chapter_path(bad),
                    Err(ReaderError::InvalidChapterName { .. })
                ),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn custom_extension_drops_leading_dot() {
        let lib = ChapterLibrary::new("/srv").with_extension(".md");
        assert_eq!(lib.chapter_path("intro").unwrap(), PathBuf::from("/srv/intro.md"));
    }

    #[test]
    fn chapter_numbers() {
        assert_eq!(chapter_number("tutor12.txt"), 12);
        assert_eq!(chapter_number("tutor1-2.txt"), 1);
        assert_eq!(chapter_number("preface.txt"), 0);
    }

    #[test]
    fn names_sort_numerically_then_lexically() {
        let mut names = vec!["tutor10.txt", "tutor2.txt", "preface.txt", "appendix.txt", "tutor1.txt"];
        names.sort_by(|a, b| compare_chapter_names(a, b));
        assert_eq!(
            names,
            vec!["appendix.txt", "preface.txt", "tutor1.txt", "tutor2.txt", "tutor10.txt"]
        );
    }

    #[test]
    fn name_ties_ignore_case() {
        let mut names = vec!["Preface.txt", "appendix.txt", "Zeta.txt", "beta.txt"];
        names.sort_by(|a, b| compare_chapter_names(a, b));
        assert_eq!(names, vec!["appendix.txt", "beta.txt", "Preface.txt", "Zeta.txt"]);
    }
}
