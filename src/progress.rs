//! Progress-callback trait for batch modernization events.
//!
//! Inject an [`Arc<dyn ModernizeProgressCallback>`] via
//! [`crate::config::ModernizeConfigBuilder::progress_callback`] to receive
//! events as [`crate::modernize::modernize_document`] works through the prose
//! blocks of a chapter.
//!
//! # Example
//!
//! ```rust
//! use tutor_reader::{ModernizeConfig, ModernizeProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ModernizeProgressCallback for CountingCallback {
//!     fn on_block_complete(&self, index: usize, total: usize, modern_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Block {}/{} done ({} bytes)", index + 1, total, modern_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ModernizeConfig::builder()
//!     .progress_callback(counter as Arc<dyn ModernizeProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch modernizer as it processes each prose block.
///
/// Blocks run concurrently, so `on_block_*` methods may be called from
/// different tasks at once and in any order. All methods default to no-ops.
pub trait ModernizeProgressCallback: Send + Sync {
    /// Called once before any block is sent.
    fn on_batch_start(&self, total_blocks: usize) {
        let _ = total_blocks;
    }

    /// Called just before the LLM request for block `index` (0-based).
    fn on_block_start(&self, index: usize, total_blocks: usize) {
        let _ = (index, total_blocks);
    }

    /// Called when a block is rewritten; `modern_len` is the byte length of
    /// the modernized text.
    fn on_block_complete(&self, index: usize, total_blocks: usize, modern_len: usize) {
        let _ = (index, total_blocks, modern_len);
    }

    /// Called when a block fails after all attempts.
    fn on_block_error(&self, index: usize, total_blocks: usize, error: &str) {
        let _ = (index, total_blocks, error);
    }

    /// Called once after every block has been attempted.
    fn on_batch_complete(&self, total_blocks: usize, success_count: usize) {
        let _ = (total_blocks, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ModernizeProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ModernizeConfig`].
pub type ProgressCallback = Arc<dyn ModernizeProgressCallback>;
