//! TOC Builder.
//!
//! Walks the already-built AST and produces a nested outline: a level-`N`
//! heading that follows a level-`M` heading with `M < N` becomes that
//! heading's child. Anchor ids are not assigned here — they were already
//! stamped onto each `Heading` node by the parser's
//! `ParserContext::next_anchor_id` counter; the TOC builder only reads them
//! back out in document order.

use crate::ast::{inline::InlineNode, BlockNode, Document};
use crate::render::escape::escape;

/// One entry in the nested table of contents.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    pub anchor_id: String,
    pub level: u8,
    pub title: String,
    pub children: Vec<TocEntry>,
}

/// The document's table of contents: a forest of `TocEntry` trees rooted at
/// the shallowest heading level(s) present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Toc {
    pub entries: Vec<TocEntry>,
}

impl Toc {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the TOC by walking every `Heading` in pre-order (document order)
/// and nesting each under the most recent heading of a shallower level.
/// Pure function of the AST: calling this twice on the same `Document`
/// yields equal trees.
pub fn build_toc(doc: &Document) -> Toc {
    let headings: Vec<(u8, String, String)> = doc
        .walk_pre_order()
        .into_iter()
        .filter_map(|node| match node {
            BlockNode::Heading {
                level,
                inline,
                anchor_id,
                ..
            } => Some((*level, InlineNode::plain_text(inline), anchor_id.clone())),
            _ => None,
        })
        .collect();

    // Build depth-first with a stack of open "frames": each frame holds the
    // siblings collected so far at one nesting level. A heading is appended
    // to the innermost frame shallower than it; frames deeper than or equal
    // to the new heading are folded back in as that heading's predecessor's
    // children before it is pushed.
    struct Frame {
        level: u8,
        entries: Vec<TocEntry>,
    }
    let mut stack = vec![Frame {
        level: 0,
        entries: Vec::new(),
    }];

    for (level, title, anchor_id) in headings {
        while stack.len() > 1 && stack.last().unwrap().level >= level {
            let finished = stack.pop().unwrap();
            stack.last_mut().unwrap().entries.last_mut().unwrap().children = finished.entries;
        }
        stack.last_mut().unwrap().entries.push(TocEntry {
            anchor_id,
            level,
            title,
            children: Vec::new(),
        });
        stack.push(Frame {
            level,
            entries: Vec::new(),
        });
    }
    while stack.len() > 1 {
        let finished = stack.pop().unwrap();
        stack.last_mut().unwrap().entries.last_mut().unwrap().children = finished.entries;
    }

    Toc {
        entries: stack.pop().unwrap().entries,
    }
}

/// Render the TOC as a nested `<ul>` list, substituted into the document
/// wherever a `TocPlaceholder` node sits. Entries are wrapped with
/// `<a href="#{anchor}">` links to their heading.
pub fn render_toc_html(toc: &Toc) -> String {
    if toc.is_empty() {
        return String::new();
    }
    render_entries(&toc.entries)
}

fn render_entries(entries: &[TocEntry]) -> String {
    let mut out = String::from("<ul>");
    for entry in entries {
        out.push_str("<li><a href=\"#");
        out.push_str(&escape(&entry.anchor_id));
        out.push_str("\">");
        out.push_str(&escape(&entry.title));
        out.push_str("</a>");
        if !entry.children.is_empty() {
            out.push_str(&render_entries(&entry.children));
        }
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    out
}
