//! LLM-backed modernization of chapter text.
//!
//! Sends a span of old compiler-writing prose to a chat model and gets back
//! the rewritten text plus a list of `{old, modern, explanation}` term
//! mappings. All prompt wording lives in [`crate::prompts`].
//!
//! Models do not always return clean JSON. [`parse_model_reply`] repairs the
//! common failure shapes (fenced JSON, chatter around the object, a bare
//! mapping array) and falls back to treating the whole reply as the
//! modernized text, so a reply is never lost.
//!
//! ## Retry Strategy
//!
//! One attempt by default. With `max_retries > 0` the wait before attempt
//! `n` is `retry_backoff_ms * 2^(n-1)`.

use crate::config::ModernizeConfig;
use crate::document::{BlockKind, ParsedDocument, Section};
use crate::error::{ReaderError, SectionError};
use crate::prompts::{modernize_user_message, MODERNIZE_SYSTEM_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// One old-to-new terminology substitution reported by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermMapping {
    #[serde(default)]
    pub old: String,
    #[serde(default)]
    pub modern: String,
    #[serde(default)]
    pub explanation: String,
}

/// The repaired model reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modernization {
    #[serde(default)]
    pub modern: String,
    #[serde(default)]
    pub mappings: Vec<TermMapping>,
}

/// A modernization plus request accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModernizeOutput {
    #[serde(flatten)]
    pub result: Modernization,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
    /// Attempts made before success (1 = first try).
    pub attempts: u32,
}

/// Outcome for one prose block in a batch run.
///
/// Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockModernization {
    pub section_id: String,
    /// Index of the block within its section's `blocks`.
    pub block_index: usize,
    pub original: String,
    pub result: Option<Modernization>,
    pub error: Option<SectionError>,
}

// ── Reply repair ─────────────────────────────────────────────────────────────

static RE_JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*\n(.*)\n```$").unwrap());

// First `{` through the last `}` that ends a line.
static RE_OBJECT_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)\{[\s\S]*\}$").unwrap());

static RE_ARRAY_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[\s\S]*\]").unwrap());

fn strip_json_fence(reply: &str) -> &str {
    RE_JSON_FENCE
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map_or(reply, |m| m.as_str())
}

fn parse_object(candidate: &str) -> Option<Modernization> {
    match serde_json::from_str::<serde_json::Value>(candidate).ok()? {
        value @ serde_json::Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    }
}

/// Turn a raw model reply into a [`Modernization`], repairing what it can.
///
/// Tried in order: the whole reply (outer ```` ```json ```` fence removed) as
/// a JSON object; the `{...}` span inside it; a `[...]` span as a bare
/// mapping list (the source text then stands in for `modern`); finally the
/// reply itself as the modernized text with no mappings. A parsed object with
/// an empty `modern` falls back to the source text.
pub fn parse_model_reply(reply: &str, source_text: &str) -> Modernization {
    let body = strip_json_fence(reply.trim());

    let parsed = parse_object(body).or_else(|| {
        RE_OBJECT_SPAN
            .find(body)
            .and_then(|m| parse_object(m.as_str()))
    });

    if let Some(mut modernization) = parsed {
        if modernization.modern.trim().is_empty() {
            modernization.modern = source_text.to_string();
        }
        return modernization;
    }

    if let Some(mappings) = RE_ARRAY_SPAN
        .find(body)
        .and_then(|m| serde_json::from_str::<Vec<TermMapping>>(m.as_str()).ok())
    {
        debug!("Model reply was a bare mapping list ({} items)", mappings.len());
        return Modernization {
            modern: source_text.to_string(),
            mappings,
        };
    }

    warn!("Model reply was not JSON; using it verbatim as the modern text");
    Modernization {
        modern: reply.trim().to_string(),
        mappings: Vec::new(),
    }
}

// ── Single span ──────────────────────────────────────────────────────────────

/// Modernize one span of text, resolving the provider from `config`.
///
/// # Errors
/// - [`ReaderError::EmptyText`] for empty or whitespace-only input
/// - [`ReaderError::ProviderNotConfigured`] when no provider can be built
/// - [`ReaderError::LlmApiError`] when every attempt fails
pub async fn modernize(
    text: &str,
    config: &ModernizeConfig,
) -> Result<ModernizeOutput, ReaderError> {
    if text.trim().is_empty() {
        return Err(ReaderError::EmptyText);
    }
    let provider = resolve_provider(config)?;
    modernize_with(&provider, text, config).await
}

/// Modernize one span of text with an already-resolved provider.
pub async fn modernize_with(
    provider: &Arc<dyn LLMProvider>,
    text: &str,
    config: &ModernizeConfig,
) -> Result<ModernizeOutput, ReaderError> {
    if text.trim().is_empty() {
        return Err(ReaderError::EmptyText);
    }

    let start = Instant::now();
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(MODERNIZE_SYSTEM_PROMPT);
    let messages = vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(modernize_user_message(text)),
    ];
    let options = build_options(config);

    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Modernize: retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match provider.chat(&messages, Some(&options)).await {
            Ok(response) => {
                let duration = start.elapsed();
                debug!(
                    "Modernize: {} input tokens, {} output tokens, {:?}",
                    response.prompt_tokens, response.completion_tokens, duration
                );
                return Ok(ModernizeOutput {
                    result: parse_model_reply(&response.content, text),
                    input_tokens: response.prompt_tokens,
                    output_tokens: response.completion_tokens,
                    duration_ms: duration.as_millis() as u64,
                    attempts: attempt + 1,
                });
            }
            Err(e) => {
                let err_msg = format!("{}", e);
                warn!("Modernize: attempt {} failed — {}", attempt + 1, err_msg);
                last_err = Some(err_msg);
            }
        }
    }

    Err(ReaderError::LlmApiError {
        attempts: config.max_retries + 1,
        message: last_err.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

/// Build `CompletionOptions` from the modernize config.
fn build_options(config: &ModernizeConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

// ── Batches ──────────────────────────────────────────────────────────────────

struct BlockJob {
    section_id: String,
    block_index: usize,
    text: String,
}

fn prose_jobs<'a>(sections: impl IntoIterator<Item = &'a Section>) -> Vec<BlockJob> {
    sections
        .into_iter()
        .flat_map(|section| {
            section
                .blocks
                .iter()
                .enumerate()
                .filter(|(_, b)| b.kind == BlockKind::Prose)
                .map(move |(i, b)| BlockJob {
                    section_id: section.id.clone(),
                    block_index: i,
                    text: b.content.clone(),
                })
        })
        .collect()
}

/// Modernize every prose block in the document.
///
/// Blocks run concurrently (up to `config.concurrency`); a failed block is
/// recorded in its [`BlockModernization::error`] and does not stop the rest.
/// Results come back in document order.
///
/// # Errors
/// Only provider resolution is fatal.
pub async fn modernize_document(
    doc: &ParsedDocument,
    config: &ModernizeConfig,
) -> Result<Vec<BlockModernization>, ReaderError> {
    let provider = resolve_provider(config)?;
    Ok(run_batch(&provider, prose_jobs(&doc.sections), config).await)
}

/// Modernize the prose blocks of a single section.
pub async fn modernize_section(
    section: &Section,
    config: &ModernizeConfig,
) -> Result<Vec<BlockModernization>, ReaderError> {
    let provider = resolve_provider(config)?;
    Ok(run_batch(&provider, prose_jobs([section]), config).await)
}

async fn run_batch(
    provider: &Arc<dyn LLMProvider>,
    jobs: Vec<BlockJob>,
    config: &ModernizeConfig,
) -> Vec<BlockModernization> {
    let total = jobs.len();
    info!("Modernizing {} prose blocks", total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut results: Vec<(usize, BlockModernization)> =
        stream::iter(jobs.into_iter().enumerate().map(|(position, job)| {
            let provider = Arc::clone(provider);
            let cfg = config.clone();
            async move {
                if let Some(ref cb) = cfg.progress_callback {
                    cb.on_block_start(position, total);
                }
                let outcome = modernize_with(&provider, &job.text, &cfg).await;
                let (result, error) = match outcome {
                    Ok(out) => {
                        if let Some(ref cb) = cfg.progress_callback {
                            cb.on_block_complete(position, total, out.result.modern.len());
                        }
                        (Some(out.result), None)
                    }
                    Err(e) => {
                        let detail = e.to_string();
                        if let Some(ref cb) = cfg.progress_callback {
                            cb.on_block_error(position, total, &detail);
                        }
                        let err = SectionError::LlmFailed {
                            section_id: job.section_id.clone(),
                            block: job.block_index,
                            detail,
                        };
                        (None, Some(err))
                    }
                };
                (
                    position,
                    BlockModernization {
                        section_id: job.section_id,
                        block_index: job.block_index,
                        original: job.text,
                        result,
                        error,
                    },
                )
            }
        }))
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|(position, _)| *position);
    let results: Vec<BlockModernization> = results.into_iter().map(|(_, r)| r).collect();

    let success = results.iter().filter(|r| r.error.is_none()).count();
    info!("Modernized {}/{} prose blocks", success, total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, success);
    }
    results
}

// ── Provider resolution ──────────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ReaderError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ReaderError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. `config.provider` — a pre-built provider, used as-is
/// 2. `config.provider_name` (+ `config.model`)
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
/// 4. `OPENAI_API_KEY` present → OpenAI
/// 5. `ProviderFactory::from_env` auto-detection
pub fn resolve_provider(config: &ModernizeConfig) -> Result<Arc<dyn LLMProvider>, ReaderError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ReaderError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
