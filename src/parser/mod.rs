//! Block Parser (C3) orchestration.
//!
//! Entry point and shared mutable state for the pushdown parse. The state
//! machine itself lives in `block`; `inline` is the separate left-to-right
//! inline grammar it calls into for every text run it isolates.

mod block;
pub mod inline;

use crate::ast::{BlockNode, Document};
use crate::diagnostics::Diagnostic;
use crate::lexer::{self, LogicalLine};

/// Maximum container nesting depth: decorated blocks and collapsibles
/// nested deeper than this are flattened, with a `NestingTooDeep`
/// diagnostic.
pub const MAX_NESTING_DEPTH: u32 = 20;

/// Mutable state threaded through the whole parse: monotonic counters for
/// heading anchors and footnote ids, the anchor-collision table, and the
/// accumulating diagnostics/footnotes that end up on the `Document`.
pub(crate) struct ParserContext {
    pub heading_counter: u32,
    pub footnote_counter: u32,
    pub anchor_ids: std::collections::HashSet<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub footnotes: Vec<crate::ast::FootnoteDef>,
}

impl ParserContext {
    pub(crate) fn new() -> Self {
        Self {
            heading_counter: 0,
            footnote_counter: 0,
            anchor_ids: std::collections::HashSet::new(),
            diagnostics: Vec::new(),
            footnotes: Vec::new(),
        }
    }

    /// Assigns a unique `heading-N` anchor id, disambiguating collisions
    /// with a `-2`, `-3`, ... suffix.
    pub(crate) fn next_anchor_id(&mut self) -> String {
        self.heading_counter += 1;
        let base = format!("heading-{}", self.heading_counter);
        if self.anchor_ids.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.anchor_ids.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Parse already-normalized Kumihan source into a `Document`. Normalization
/// (BOM stripping, CRLF handling) happens in `crate::convert_str` before
/// this is called.
pub fn parse(source: &str) -> Document {
    let lines = lexer::lex(source);
    let mut ctx = ParserContext::new();
    let children = parse_lines(&lines, &mut ctx);
    Document {
        children,
        diagnostics: ctx.diagnostics,
        footnotes: ctx.footnotes,
    }
}

/// Parses one batch of already-lexed lines against a `ParserContext` the
/// caller owns: the streaming driver calls this once per chunk, threading a
/// single context across chunks so heading/footnote counters stay monotonic
/// over the whole document instead of resetting per chunk.
pub(crate) fn parse_lines(lines: &[LogicalLine], ctx: &mut ParserContext) -> Vec<BlockNode> {
    block::parse_block_sequence(lines, 0, ctx, 0, false).0
}
