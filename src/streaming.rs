//! Streaming Driver.
//!
//! Processes large inputs in chunks split at blank lines so that no open
//! marker spans a chunk boundary. Chunks are lexed (optionally in parallel,
//! behind the `parallel` feature) and then parsed sequentially against one
//! shared `ParserContext` so heading/footnote counters stay monotonic across
//! the whole document: the parser itself remains single-threaded cooperative
//! — only chunk *lexing* is embarrassingly parallel.
//!
//! Each chunk is rendered to an HTML fragment as soon as it's parsed; a
//! `TocPlaceholder` renders as a sentinel (`render::TOC_SENTINEL`) because
//! the real TOC isn't known until every chunk — and therefore every
//! heading — has been seen. The sentinel is replaced by the real TOC html
//! in one pass after the loop.

use crate::ast::Document;
use crate::lexer::{self, LineKind, LogicalLine};
use crate::options::{CancellationToken, ConvertOptions, ProgressCallback, ProgressUpdate};
use crate::parser::{self, ParserContext};
use crate::render::{self, RenderOptions};
use crate::toc;

/// The result of a full streaming run: the aggregated AST (needed for the
/// final TOC/footnote passes and for `get_diagnostics()`) plus the
/// rendered body and TOC html.
pub struct StreamingOutcome {
    pub document: Document,
    pub body_html: String,
    pub toc_html: String,
}

/// Whether `source` is large enough to warrant the streaming path: inputs
/// exceeding a configurable byte or line threshold are chunked.
pub(crate) fn should_stream(source: &str, options: &ConvertOptions) -> bool {
    source.len() > options.chunk_threshold_bytes
        || source.lines().count() > options.chunk_threshold_lines
}

/// Runs the streaming pipeline. Returns `None` if `cancellation_token` was
/// set between chunks, discarding whatever partial output had accumulated
/// Cancellation is best-effort and discards partial output.
pub(crate) fn run(source: &str, options: &ConvertOptions, render_opts: &RenderOptions) -> Option<StreamingOutcome> {
    let chunks = split_into_chunks(source, options.chunk_threshold_bytes, options.chunk_threshold_lines);
    let chunk_lines = lex_all(&chunks, cfg!(feature = "parallel"));

    let mut ctx = ParserContext::new();
    let mut document = Document::new();
    let mut fragments = Vec::with_capacity(chunks.len());

    let total_bytes = source.len().max(1) as f64;
    let mut processed_bytes = 0usize;
    let started = std::time::Instant::now();
    let mut rate_ema: Option<f64> = None;

    for (chunk, lines) in chunks.iter().zip(chunk_lines.into_iter()) {
        if is_cancelled(&options.cancellation_token) {
            log::debug!("streaming driver cancelled between chunks; discarding partial output");
            return None;
        }

        let children = parser::parse_lines(&lines, &mut ctx);
        let fragment = render::render_blocks(&children, render::TOC_SENTINEL, render_opts);
        document.children.extend(children);
        fragments.push(fragment);

        processed_bytes += chunk.len();
        emit_progress(
            &options.progress_callback,
            processed_bytes,
            total_bytes,
            started.elapsed().as_secs_f64(),
            &mut rate_ema,
        );
    }

    document.diagnostics = ctx.diagnostics;
    document.footnotes = ctx.footnotes;

    let toc = toc::build_toc(&document);
    let toc_html = toc::render_toc_html(&toc);

    let mut body_html = fragments.join("\n").replace(render::TOC_SENTINEL, &toc_html);
    if let Some(section) = crate::footnote::render_footnotes_section(&document) {
        body_html.push('\n');
        body_html.push_str(&section);
    }

    Some(StreamingOutcome {
        document,
        body_html,
        toc_html,
    })
}

fn is_cancelled(token: &Option<CancellationToken>) -> bool {
    token.as_ref().is_some_and(CancellationToken::is_cancelled)
}

/// Exponential moving average over observed byte-rate: a plain instantaneous
/// per-chunk rate swings wildly on the first few chunks, so `eta_seconds` is
/// smoothed instead.
fn emit_progress(
    callback: &Option<ProgressCallback>,
    processed_bytes: usize,
    total_bytes: f64,
    elapsed_secs: f64,
    rate_ema: &mut Option<f64>,
) {
    let Some(callback) = callback else { return };
    let elapsed_secs = elapsed_secs.max(1e-6);
    let instantaneous_rate = processed_bytes as f64 / elapsed_secs;
    let smoothed = match *rate_ema {
        Some(prev) => prev * 0.7 + instantaneous_rate * 0.3,
        None => instantaneous_rate,
    };
    *rate_ema = Some(smoothed);

    let remaining_bytes = (total_bytes - processed_bytes as f64).max(0.0);
    let eta_seconds = if smoothed > 0.0 { remaining_bytes / smoothed } else { 0.0 };

    callback(&ProgressUpdate {
        progress_percent: (processed_bytes as f64 / total_bytes * 100.0).min(100.0),
        processing_rate: smoothed,
        eta_seconds,
    });
}

#[cfg(feature = "parallel")]
fn lex_all(chunks: &[String], parallel: bool) -> Vec<Vec<LogicalLine>> {
    if parallel {
        use rayon::prelude::*;
        return chunks.par_iter().map(|c| lexer::lex(c)).collect();
    }
    chunks.iter().map(|c| lexer::lex(c)).collect()
}

#[cfg(not(feature = "parallel"))]
fn lex_all(chunks: &[String], _parallel: bool) -> Vec<Vec<LogicalLine>> {
    chunks.iter().map(|c| lexer::lex(c)).collect()
}

/// A line index is a safe split point when it is `Blank` and no marker
/// opened before it is still unclosed — chunks are split at blank lines so
/// that no open marker spans a chunk boundary.
fn safe_split_flags(lines: &[LogicalLine]) -> Vec<bool> {
    let mut depth: i32 = 0;
    let mut flags = Vec::with_capacity(lines.len());
    for line in lines {
        let depth_before = depth;
        match &line.kind {
            LineKind::MarkerOpen { .. } => depth += 1,
            LineKind::MarkerClose => depth = (depth - 1).max(0),
            _ => {}
        }
        flags.push(matches!(line.kind, LineKind::Blank) && depth_before == 0);
    }
    flags
}

/// Split `source` into chunks no (much) larger than the given thresholds,
/// cutting only at safe blank-line boundaries; scans forward past the
/// threshold if necessary to find one.
pub(crate) fn split_into_chunks(source: &str, threshold_bytes: usize, threshold_lines: usize) -> Vec<String> {
    let lines = lexer::lex(source);
    if lines.is_empty() {
        return vec![source.to_string()];
    }
    if source.len() <= threshold_bytes && lines.len() <= threshold_lines {
        return vec![source.to_string()];
    }

    let safe = safe_split_flags(&lines);
    let mut chunks = Vec::new();
    let mut chunk_start = 0usize;

    for idx in 0..lines.len() {
        let is_last_line = idx == lines.len() - 1;
        let bytes_so_far =
            lines[idx].span.end.byte_offset as usize - lines[chunk_start].span.start.byte_offset as usize;
        let lines_so_far = idx - chunk_start + 1;
        let over_threshold = bytes_so_far >= threshold_bytes || lines_so_far >= threshold_lines;

        if is_last_line || (over_threshold && safe[idx]) {
            let start_byte = lines[chunk_start].span.start.byte_offset as usize;
            let end_byte = if idx + 1 < lines.len() {
                lines[idx + 1].span.start.byte_offset as usize
            } else {
                source.len()
            };
            chunks.push(source[start_byte..end_byte].to_string());
            chunk_start = idx + 1;
        }
    }

    if chunks.is_empty() {
        chunks.push(source.to_string());
    }
    chunks
}
