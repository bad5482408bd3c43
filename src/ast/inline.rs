//! Inline AST nodes produced by the Inline Parser.

use serde::{Deserialize, Serialize};

pub type InlineSeq = Vec<InlineNode>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmphasisKind {
    Bold,
    Italic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InlineNode {
    Text { value: String },
    Ruby { base: String, reading: String },
    FootnoteRef { id: String },
    Emphasis { kind: EmphasisKind, children: InlineSeq },
    InlineCode { value: String },
    RawEscape { value: String },
}

impl InlineNode {
    pub fn text(value: impl Into<String>) -> Self {
        InlineNode::Text { value: value.into() }
    }

    /// Flattened plain-text content, ignoring markup — used by the
    /// plain-text round-trip check and by summary text for collapsibles.
    pub fn plain_text(seq: &[InlineNode]) -> String {
        let mut out = String::new();
        for node in seq {
            match node {
                InlineNode::Text { value } | InlineNode::InlineCode { value } => out.push_str(value),
                InlineNode::RawEscape { value } => out.push_str(value),
                InlineNode::Ruby { base, .. } => out.push_str(base),
                InlineNode::FootnoteRef { .. } => {}
                InlineNode::Emphasis { children, .. } => out.push_str(&Self::plain_text(children)),
            }
        }
        out
    }
}
