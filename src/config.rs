//! Configuration types for parsing and modernizing chapters.
//!
//! Two independent configs, each built through a consuming builder whose
//! `build()` validates:
//!
//! * [`ParserConfig`] — overrides for the line-classification heuristics.
//!   The default reproduces the stock rules exactly, so
//!   `parse_with(text, &ParserConfig::default())` equals `parse(text)`.
//! * [`ModernizeConfig`] — LLM provider selection and request knobs for the
//!   modernizer.

use crate::error::ReaderError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Keywords that mark a line as code when they appear as a whole word.
pub const DEFAULT_CODE_KEYWORDS: &[&str] = &[
    "procedure", "begin", "end", "case", "var", "const", "program", "else",
];

/// Title substring that always drops a section (compared case-insensitively).
pub const DEFAULT_COPYRIGHT_MARKER: &str = "COPYRIGHT";

/// Header-region prefix preferred over the first non-blank line.
pub const DEFAULT_PART_PREFIX: &str = "Part ";

/// Overrides for the line classifier and segmenter.
///
/// # Example
/// ```rust
/// use tutor_reader::ParserConfig;
///
/// // Accept "CHAPTER 1"-style headings and C-ish keywords.
/// let config = ParserConfig::builder()
///     .heading_pattern(r"[A-Z0-9\s*\-()]*")
///     .code_keywords(["int", "return", "while"])
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Character allow-list a trimmed heading must fully match.
    ///
    /// `None` uses the stock rule: uppercase ASCII letters, whitespace, `*`,
    /// `-`, `(` and `)`. The other heading rules (length, leading character,
    /// all-caps, not a separator line) always apply.
    pub heading_pattern: Option<Regex>,

    /// Whole-word, case-insensitive keyword matcher for code lines.
    /// `None` uses [`DEFAULT_CODE_KEYWORDS`].
    pub code_keywords: Option<Regex>,

    /// Sections whose title contains any of these (case-insensitively) are
    /// dropped. Always includes [`DEFAULT_COPYRIGHT_MARKER`]; stored uppercase.
    pub copyright_markers: Vec<String>,

    /// Header-region lines starting with this win the header slot.
    pub part_prefix: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            heading_pattern: None,
            code_keywords: None,
            copyright_markers: vec![DEFAULT_COPYRIGHT_MARKER.to_string()],
            part_prefix: DEFAULT_PART_PREFIX.to_string(),
        }
    }
}

impl ParserConfig {
    /// Create a new builder for `ParserConfig`.
    pub fn builder() -> ParserConfigBuilder {
        ParserConfigBuilder::default()
    }
}

/// Builder for [`ParserConfig`].
#[derive(Debug, Default)]
pub struct ParserConfigBuilder {
    heading_pattern: Option<String>,
    code_keywords: Option<Vec<String>>,
    copyright_markers: Vec<String>,
    part_prefix: Option<String>,
}

impl ParserConfigBuilder {
    /// Regex the whole trimmed heading must match (anchors are added).
    pub fn heading_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.heading_pattern = Some(pattern.into());
        self
    }

    pub fn code_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.code_keywords = Some(keywords.into_iter().map(Into::into).collect());
        self
    }

    /// Drop sections whose title contains `marker` as well as `COPYRIGHT`.
    pub fn copyright_marker(mut self, marker: impl Into<String>) -> Self {
        self.copyright_markers.push(marker.into());
        self
    }

    pub fn part_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.part_prefix = Some(prefix.into());
        self
    }

    /// Build the configuration, compiling and validating the overrides.
    pub fn build(self) -> Result<ParserConfig, ReaderError> {
        let mut config = ParserConfig::default();

        if let Some(pattern) = self.heading_pattern {
            let anchored = format!("^(?:{pattern})$");
            let re = Regex::new(&anchored).map_err(|e| {
                ReaderError::InvalidConfig(format!("heading pattern '{pattern}': {e}"))
            })?;
            config.heading_pattern = Some(re);
        }

        if let Some(keywords) = self.code_keywords {
            config.code_keywords = Some(compile_keywords(&keywords)?);
        }

        for marker in self.copyright_markers {
            if marker.trim().is_empty() {
                return Err(ReaderError::InvalidConfig(
                    "copyright marker must not be blank".into(),
                ));
            }
            let marker = marker.to_uppercase();
            if !config.copyright_markers.contains(&marker) {
                config.copyright_markers.push(marker);
            }
        }

        if let Some(prefix) = self.part_prefix {
            config.part_prefix = prefix;
        }

        Ok(config)
    }
}

/// Compile a keyword list into a whole-word, case-insensitive alternation.
///
/// A word boundary is required only on a side where the keyword starts or
/// ends with a word character, so `c++` and `:=` still match.
pub(crate) fn compile_keywords<S: AsRef<str>>(keywords: &[S]) -> Result<Regex, ReaderError> {
    let words: Vec<String> = keywords
        .iter()
        .map(|k| k.as_ref().trim())
        .filter(|k| !k.is_empty())
        .map(keyword_pattern)
        .collect();
    if words.is_empty() {
        return Err(ReaderError::InvalidConfig(
            "code keyword list must contain at least one keyword".into(),
        ));
    }
    Regex::new(&format!(r"(?i)(?:{})", words.join("|")))
        .map_err(|e| ReaderError::InvalidConfig(format!("code keywords: {e}")))
}

fn keyword_pattern(keyword: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let lead = if keyword.starts_with(is_word) { r"\b" } else { "" };
    let trail = if keyword.ends_with(is_word) { r"\b" } else { "" };
    format!("{lead}{}{trail}", regex::escape(keyword))
}

/// Configuration for LLM-backed modernization of chapter text.
///
/// Built via [`ModernizeConfig::builder()`] or [`ModernizeConfig::default()`].
#[derive(Clone)]
pub struct ModernizeConfig {
    /// LLM model identifier. Default: `gpt-4o-mini` when a provider is named.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per request. Default: 1000.
    pub max_tokens: usize,

    /// Extra attempts after a failed LLM call. Default: 0 (single attempt).
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Custom system prompt. If None, uses [`crate::prompts::MODERNIZE_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// In-flight LLM calls during [`crate::modernize::modernize_document`]. Default: 4.
    pub concurrency: usize,

    /// Receives per-block events during batch runs.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ModernizeConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 1000,
            max_retries: 0,
            retry_backoff_ms: 500,
            system_prompt: None,
            concurrency: 4,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ModernizeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModernizeConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ModernizeProgressCallback>"),
            )
            .finish()
    }
}

impl ModernizeConfig {
    /// Create a new builder for `ModernizeConfig`.
    pub fn builder() -> ModernizeConfigBuilder {
        ModernizeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ModernizeConfig`].
#[derive(Debug)]
pub struct ModernizeConfigBuilder {
    config: ModernizeConfig,
}

impl ModernizeConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ModernizeConfig, ReaderError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(ReaderError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.max_tokens == 0 {
            return Err(ReaderError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parser_config_has_no_overrides() {
        let c = ParserConfig::default();
        assert!(c.heading_pattern.is_none());
        assert!(c.code_keywords.is_none());
        assert_eq!(c.copyright_markers, vec!["COPYRIGHT"]);
        assert_eq!(c.part_prefix, "Part ");
    }

    #[test]
    fn heading_pattern_is_anchored() {
        let c = ParserConfig::builder()
            .heading_pattern(r"[A-Z0-9\s]*")
            .build()
            .unwrap();
        let re = c.heading_pattern.unwrap();
        assert!(re.is_match("CHAPTER 1"));
        assert!(!re.is_match("CHAPTER 1:"));
    }

    #[test]
    fn invalid_heading_pattern_is_rejected() {
        let err = ParserConfig::builder()
            .heading_pattern("[A-Z")
            .build()
            .unwrap_err();
        assert!(matches!(err, ReaderError::InvalidConfig(_)));
    }

    #[test]
    fn keywords_match_whole_words_case_insensitively() {
        let re = compile_keywords(&["while", "c++"]).unwrap();
        assert!(re.is_match("  WHILE x > 0"));
        assert!(!re.is_match("meanwhile"));
        assert!(re.is_match("use c++ here"));
        assert!(!re.is_match("abc++ d"));
    }

    #[test]
    fn punctuation_keywords_match_at_line_edges() {
        let re = compile_keywords(&["#include", "->"]).unwrap();
        assert!(re.is_match("#include <stdio.h>"));
        assert!(re.is_match("p->next"));
        assert!(!re.is_match("including this"));
    }

    #[test]
    fn empty_keyword_list_is_rejected() {
        let err = ParserConfig::builder()
            .code_keywords(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, ReaderError::InvalidConfig(_)));
    }

    #[test]
    fn blank_copyright_marker_is_rejected() {
        assert!(ParserConfig::builder().copyright_marker("  ").build().is_err());
    }

    #[test]
    fn extra_copyright_markers_keep_the_default() {
        let c = ParserConfig::builder()
            .copyright_marker("legal")
            .copyright_marker("Copyright")
            .build()
            .unwrap();
        assert_eq!(c.copyright_markers, vec!["COPYRIGHT", "LEGAL"]);
    }

    #[test]
    fn modernize_defaults() {
        let c = ModernizeConfig::default();
        assert_eq!(c.max_tokens, 1000);
        assert_eq!(c.max_retries, 0);
        assert_eq!(c.concurrency, 4);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = ModernizeConfig::builder().concurrency(0).build().unwrap_err();
        assert!(err.to_string().contains("Concurrency"));
    }

    #[test]
    fn temperature_is_clamped() {
        let c = ModernizeConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }
}
