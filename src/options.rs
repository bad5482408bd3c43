//! Conversion options.
//!
//! Every knob is an explicit field on a record passed into
//! `convert`/`convert_str` rather than runtime-mutable global configuration;
//! the keyword registry is the only process-wide state, loaded once and
//! read-only thereafter.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How the validator's diagnostics affect assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLevel {
    /// Any `error`-severity diagnostic aborts assembly.
    Strict,
    /// Errors are embedded as visible `ErrorMarker`s; the document is
    /// still produced. This is the default.
    Normal,
    /// Warnings and below are suppressed from the output but retained in
    /// the structured report.
    Lenient,
    /// Alias of `Lenient` kept for API parity with the enumerated
    /// `strict|normal|lenient|ignore` error-level names.
    Ignore,
}

impl Default for ErrorLevel {
    fn default() -> Self {
        ErrorLevel::Normal
    }
}

/// Cooperative cancellation flag, checked between streaming chunks and at
/// the top of the parser/renderer main loops.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A chunk-progress callback emitted by the streaming driver after each chunk.
pub struct ProgressUpdate {
    pub progress_percent: f64,
    pub processing_rate: f64,
    pub eta_seconds: f64,
}

pub type ProgressCallback = Box<dyn Fn(&ProgressUpdate) + Send + Sync>;

/// Options recognized by the core.
pub struct ConvertOptions {
    pub template_name: Option<String>,
    pub include_source_view: bool,
    pub error_level: ErrorLevel,
    pub progress_callback: Option<ProgressCallback>,
    pub cancellation_token: Option<CancellationToken>,
    /// Default: 1 MiB.
    pub chunk_threshold_bytes: usize,
    /// Default: 10,000 logical lines.
    pub chunk_threshold_lines: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            template_name: None,
            include_source_view: false,
            error_level: ErrorLevel::default(),
            progress_callback: None,
            cancellation_token: None,
            chunk_threshold_bytes: 1024 * 1024,
            chunk_threshold_lines: 10_000,
        }
    }
}

impl std::fmt::Debug for ConvertOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvertOptions")
            .field("template_name", &self.template_name)
            .field("include_source_view", &self.include_source_view)
            .field("error_level", &self.error_level)
            .field("has_progress_callback", &self.progress_callback.is_some())
            .field("cancellation_token", &self.cancellation_token)
            .field("chunk_threshold_bytes", &self.chunk_threshold_bytes)
            .field("chunk_threshold_lines", &self.chunk_threshold_lines)
            .finish()
    }
}
