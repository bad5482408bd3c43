//! Kumihan markup to self-contained HTML.
//!
//! A two-stage pipeline: source text is lexed into logical lines, parsed
//! into a typed `ast::Document`, validated (diagnostics are data, never
//! exceptions — see `diagnostics`), and rendered to HTML via the table of
//! contents, footnote, and assembler stages. Inputs above a configurable
//! size are routed through `streaming` instead, which processes the
//! document in chunks against one shared parser state.

use std::fs;
use std::path::Path;

pub mod assembler;
pub mod ast;
pub mod diagnostics;
pub mod error;
pub mod footnote;
pub mod keyword;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod render;
mod streaming;
pub mod span;
pub mod toc;

pub use assembler::{DocumentAssembler, MinimalTemplateRenderer, TemplateRenderer};
pub use ast::Document;
pub use diagnostics::{Diagnostic, ValidationReport};
pub use error::{ConvertError, ExitCode};
pub use options::{CancellationToken, ConvertOptions, ErrorLevel, ProgressCallback, ProgressUpdate};

/// The result of a successful conversion: the rendered HTML plus the
/// `Document` it was built from, so a caller can inspect diagnostics or
/// re-render with different options without reparsing.
#[derive(Debug, Clone)]
pub struct ConvertOutcome {
    pub html: String,
    pub document: Document,
}

impl ConvertOutcome {
    pub fn get_diagnostics(&self) -> &[Diagnostic] {
        &self.document.diagnostics
    }

    pub fn diagnostics_json(&self) -> Result<String, serde_json::Error> {
        ValidationReport::new(&self.document.diagnostics).to_json()
    }
}

/// Converts Kumihan source text to a self-contained HTML document.
///
/// Routes through the streaming driver when `source` exceeds
/// `options.chunk_threshold_bytes`/`chunk_threshold_lines`; otherwise
/// parses and renders the whole document in one pass. In `ErrorLevel::Strict`
/// mode, any `error`-severity diagnostic aborts before rendering and is
/// returned as `ConvertError::StrictModeErrors`.
pub fn convert_str(source: &str, options: &ConvertOptions) -> Result<ConvertOutcome, ConvertError> {
    let normalized = lexer::normalize_source(source);
    let render_opts = render::RenderOptions {
        error_level: options.error_level,
    };

    log::debug!("converting {} bytes of source", normalized.len());

    let (document, body_html, toc_html) = if streaming::should_stream(&normalized, options) {
        log::debug!("input exceeds chunk threshold; using the streaming driver");
        match streaming::run(&normalized, options, &render_opts) {
            Some(outcome) => (outcome.document, outcome.body_html, outcome.toc_html),
            None => {
                log::debug!("streaming run was cancelled");
                return Err(ConvertError::Cancelled);
            }
        }
    } else {
        let document = parser::parse(&normalized);
        let toc = toc::build_toc(&document);
        let toc_html = toc::render_toc_html(&toc);
        let body_html = render::render_document(&document, &toc_html, &render_opts);
        (document, body_html, toc_html)
    };

    for diag in &document.diagnostics {
        if diag.severity >= diagnostics::Severity::Warning {
            log::warn!("{}", diag.message);
        }
    }

    if options.error_level == ErrorLevel::Strict {
        let errors: Vec<Diagnostic> = document
            .diagnostics
            .iter()
            .filter(|d| d.severity == diagnostics::Severity::Error)
            .cloned()
            .collect();
        if !errors.is_empty() {
            log::debug!("strict mode: aborting with {} error diagnostic(s)", errors.len());
            return Err(ConvertError::StrictModeErrors(errors));
        }
    }

    let assembler = DocumentAssembler::new();
    let renderer = MinimalTemplateRenderer::new();
    let template_name = options.template_name.as_deref().unwrap_or("default");
    let source_view = options.include_source_view.then_some(source);
    let html = assembler
        .assemble(&document, &body_html, &toc_html, template_name, source_view, None, &renderer)
        .map_err(|e| ConvertError::Template(e.0))?;

    Ok(ConvertOutcome { html, document })
}

/// Thin I/O wrapper around `convert_str`: reads `input_path`, converts, and
/// writes the result to `output_path`. Returns an `ExitCode` rather than a
/// `Result` so a CLI collaborator can use it directly as its process exit
/// status.
pub fn convert(input_path: &Path, output_path: &Path, options: &ConvertOptions) -> ExitCode {
    let source = match fs::read_to_string(input_path) {
        Ok(s) => s,
        Err(source) => {
            log::warn!("failed to read {}: {}", input_path.display(), source);
            return ExitCode::from(&ConvertError::Io {
                path: input_path.to_path_buf(),
                source,
            });
        }
    };

    let outcome = match convert_str(&source, options) {
        Ok(outcome) => outcome,
        Err(err) => {
            log::warn!("conversion of {} failed: {}", input_path.display(), err);
            return ExitCode::from(&err);
        }
    };

    if let Err(source) = fs::write(output_path, &outcome.html) {
        log::warn!("failed to write {}: {}", output_path.display(), source);
        let err = ConvertError::Io {
            path: output_path.to_path_buf(),
            source,
        };
        return ExitCode::from(&err);
    }

    ExitCode::Success
}
