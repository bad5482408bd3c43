//! AST Model.
//!
//! A tagged sum type plus a dispatch table per variant, rather than a class
//! hierarchy with virtual dispatch: every node is matched explicitly on its
//! variant, the same way the renderer dispatches on it.
//!
//! The tree is built once by the parser and is immutable during rendering;
//! later passes (validator, TOC builder, footnote resolver) attach *derived*
//! data to the `Document`, never mutate nodes.

pub mod inline;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::diagnostics::{Diagnostic, ErrorKind};
use crate::keyword::Keyword;
use crate::span::Span;

pub use inline::{InlineNode, InlineSeq};

/// The parsed document: an ordered sequence of top-level blocks plus the
/// diagnostics accumulated while building it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub children: Vec<BlockNode>,
    pub diagnostics: Vec<Diagnostic>,
    /// Footnotes, in document order, collected as the inline parser
    /// encounters `((text))` spans. Kumihan footnotes are
    /// fully inline — the reference site and the body text are the same
    /// span — so there is no separate "definition" pass to run.
    pub footnotes: Vec<FootnoteDef>,
}

/// One resolved footnote: its stable id and its body content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootnoteDef {
    pub id: String,
    pub body: InlineSeq,
    pub span: Span,
}

impl Document {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            diagnostics: Vec::new(),
            footnotes: Vec::new(),
        }
    }

    /// Pre-order traversal over every block node, depth-first, used by the
    /// TOC builder, footnote resolver, and renderer.
    pub fn walk_pre_order(&self) -> Vec<&BlockNode> {
        let mut out = Vec::new();
        for child in &self.children {
            walk_block_pre_order(child, &mut out);
        }
        out
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == crate::diagnostics::Severity::Error)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn walk_block_pre_order<'a>(node: &'a BlockNode, out: &mut Vec<&'a BlockNode>) {
    out.push(node);
    for child in node.children() {
        walk_block_pre_order(child, out);
    }
}

/// A single list item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub decorations: Vec<Keyword>,
    pub inline: InlineSeq,
    pub sublist: Option<Box<List>>,
    pub span: Span,
}

/// A (possibly nested) list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub ordered: bool,
    pub items: Vec<ListItem>,
    pub span: Span,
}

/// Block-level AST node variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockNode {
    Heading {
        level: u8,
        inline: InlineSeq,
        anchor_id: String,
        span: Span,
    },
    Paragraph {
        inline: InlineSeq,
        span: Span,
    },
    List {
        list: List,
    },
    DecoratedBlock {
        keywords: Vec<Keyword>,
        attrs: HashMap<String, String>,
        children: Vec<BlockNode>,
        span: Span,
    },
    Collapsible {
        summary: String,
        spoiler: bool,
        children: Vec<BlockNode>,
        span: Span,
    },
    Image {
        src: String,
        alt: String,
        attrs: HashMap<String, String>,
        span: Span,
    },
    TocPlaceholder {
        span: Span,
    },
    ErrorMarker {
        original_text: String,
        kind: ErrorKind,
        message: String,
        span: Span,
    },
}

impl BlockNode {
    pub fn span(&self) -> Span {
        match self {
            BlockNode::Heading { span, .. }
            | BlockNode::Paragraph { span, .. }
            | BlockNode::DecoratedBlock { span, .. }
            | BlockNode::Collapsible { span, .. }
            | BlockNode::Image { span, .. }
            | BlockNode::TocPlaceholder { span }
            | BlockNode::ErrorMarker { span, .. } => *span,
            BlockNode::List { list } => list.span,
        }
    }

    /// Direct block children, for pre-order traversal. Lists and their
    /// items are not `BlockNode`s themselves, so they contribute no
    /// children here; the renderer recurses into them directly.
    pub fn children(&self) -> &[BlockNode] {
        match self {
            BlockNode::DecoratedBlock { children, .. } | BlockNode::Collapsible { children, .. } => {
                children
            }
            _ => &[],
        }
    }

    pub fn as_heading(&self) -> Option<(u8, &InlineSeq, &str)> {
        match self {
            BlockNode::Heading {
                level,
                inline,
                anchor_id,
                ..
            } => Some((*level, inline, anchor_id.as_str())),
            _ => None,
        }
    }
}
