//! HTML Renderer.
//!
//! Element-dispatched: one pure function per `BlockNode`/`InlineNode`
//! variant, matched on the tag — the same tagged-sum-type dispatch the AST
//! itself uses, rather than virtual-call dispatch over a class hierarchy.
//!
//! The renderer never mutates the `Document` it's given; the TOC html it
//! substitutes at a `TocPlaceholder` is passed in by the caller; footnote
//! numbering is handled by `crate::footnote`.

pub mod escape;

use std::collections::BTreeMap;

use crate::ast::inline::{EmphasisKind, InlineNode, InlineSeq};
use crate::ast::{BlockNode, Document, List, ListItem};
use crate::keyword::Keyword;
use crate::options::ErrorLevel;
use escape::escape;

/// Placeholder substituted into a `TocPlaceholder` node when the real TOC
/// html isn't known yet: the streaming driver renders each chunk's fragment
/// before the whole document — and therefore the whole TOC — has been
/// seen, and does a single string replace once it has.
pub const TOC_SENTINEL: &str = "\u{0}KUMIHAN_TOC_PLACEHOLDER\u{0}";

/// Knobs the renderer itself needs: the configured error level affects how
/// `ErrorMarker` nodes render.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub error_level: ErrorLevel,
}

/// Render every top-level block, in order, joined by `\n`. Used directly by
/// the streaming driver (one call per chunk) and by `render_document` (one
/// call over the whole tree).
pub fn render_blocks(children: &[BlockNode], toc_html: &str, opts: &RenderOptions) -> String {
    children
        .iter()
        .map(|node| render_block(node, toc_html, opts))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a complete document: its blocks plus the footnotes section
/// appended at the end when any footnotes exist.
pub fn render_document(doc: &Document, toc_html: &str, opts: &RenderOptions) -> String {
    let mut out = render_blocks(&doc.children, toc_html, opts);
    if let Some(section) = crate::footnote::render_footnotes_section(doc) {
        out.push('\n');
        out.push_str(&section);
    }
    out
}

fn render_block(node: &BlockNode, toc_html: &str, opts: &RenderOptions) -> String {
    match node {
        BlockNode::Heading {
            level,
            inline,
            anchor_id,
            ..
        } => format!(
            "<h{level} id=\"{id}\">{inline}</h{level}>",
            level = level,
            id = escape(anchor_id),
            inline = render_inline(inline)
        ),
        BlockNode::Paragraph { inline, .. } => format!("<p>{}</p>", render_inline(inline)),
        BlockNode::List { list } => render_list(list, toc_html, opts),
        BlockNode::DecoratedBlock {
            keywords,
            attrs,
            children,
            ..
        } => render_decorated_block(keywords, attrs, children, toc_html, opts),
        BlockNode::Collapsible {
            summary,
            spoiler,
            children,
            ..
        } => render_collapsible(summary, *spoiler, children, toc_html, opts),
        BlockNode::Image { src, alt, .. } => {
            format!("<img src=\"images/{}\" alt=\"{}\" />", escape(src), escape(alt))
        }
        BlockNode::TocPlaceholder { .. } => toc_html.to_string(),
        BlockNode::ErrorMarker {
            original_text,
            message,
            ..
        } => render_error_marker(original_text, message, opts),
    }
}

fn render_open_tag(
    tag: &str,
    id: Option<&str>,
    class: Option<&str>,
    style: Option<&str>,
    others: &BTreeMap<&str, &str>,
) -> String {
    let mut out = format!("<{}", tag);
    if let Some(id) = id {
        out.push_str(&format!(" id=\"{}\"", escape(id)));
    }
    if let Some(class) = class {
        out.push_str(&format!(" class=\"{}\"", escape(class)));
    }
    if let Some(style) = style {
        out.push_str(&format!(" style=\"{}\"", escape(style)));
    }
    for (key, value) in others {
        out.push_str(&format!(" {}=\"{}\"", key, escape(value)));
    }
    out.push('>');
    out
}

/// Opening tag for one keyword in a composite decoration: only
/// `ハイライト`'s `color` attribute produces a `style`; everything else is
/// bare class-only (or class-less, for `太字`/`イタリック`).
fn open_tag_for_keyword(kw: &Keyword, attrs: &std::collections::HashMap<String, String>) -> String {
    let style = kw
        .attr_kind("color")
        .and_then(|_| attrs.get("color"))
        .map(|color| format!("background-color:{}", color));
    render_open_tag(kw.html_tag, None, kw.css_class, style.as_deref(), &BTreeMap::new())
}

/// Renders the body of a marker container (a `DecoratedBlock` or a
/// `Collapsible`): a single `Paragraph` child is unwrapped to its bare
/// inline content rather than wrapped in `<p>`, since a one-marker
/// container reads as "this text, decorated" (see S3's
/// `<div class="highlight" ...>注目</div>`, with no nested `<p>`). A
/// container with more than one child still renders each one as its own
/// block.
fn render_wrapped_body(children: &[BlockNode], toc_html: &str, opts: &RenderOptions) -> String {
    if let [BlockNode::Paragraph { inline, .. }] = children {
        return render_inline(inline);
    }
    render_blocks(children, toc_html, opts)
}

/// Composite decorations nest outer→inner in `nesting_order_rank` order;
/// `keywords` arrives already sorted that way by `keyword::parse_composite`.
fn render_decorated_block(
    keywords: &[Keyword],
    attrs: &std::collections::HashMap<String, String>,
    children: &[BlockNode],
    toc_html: &str,
    opts: &RenderOptions,
) -> String {
    let mut out = String::new();
    for kw in keywords {
        out.push_str(&open_tag_for_keyword(kw, attrs));
    }
    out.push_str(&render_wrapped_body(children, toc_html, opts));
    for kw in keywords.iter().rev() {
        out.push_str(&format!("</{}>", kw.html_tag));
    }
    out
}

fn render_collapsible(
    summary: &str,
    spoiler: bool,
    children: &[BlockNode],
    toc_html: &str,
    opts: &RenderOptions,
) -> String {
    let class = if spoiler { Some("spoiler") } else { None };
    let open = render_open_tag("details", None, class, None, &BTreeMap::new());
    format!(
        "{open}<summary>{summary}</summary>{body}</details>",
        open = open,
        summary = escape(summary),
        body = render_wrapped_body(children, toc_html, opts)
    )
}

fn render_error_marker(original_text: &str, message: &str, opts: &RenderOptions) -> String {
    match opts.error_level {
        ErrorLevel::Lenient | ErrorLevel::Ignore => escape(original_text),
        ErrorLevel::Strict | ErrorLevel::Normal => format!(
            "<div class=\"error-marker\">{message}: {text}</div>",
            message = escape(message),
            text = escape(original_text)
        ),
    }
}

fn render_list(list: &List, toc_html: &str, opts: &RenderOptions) -> String {
    let tag = if list.ordered { "ol" } else { "ul" };
    let mut out = format!("<{}>", tag);
    for item in &list.items {
        out.push_str("<li>");
        out.push_str(&render_list_item(item));
        if let Some(sublist) = &item.sublist {
            out.push_str(&render_list(sublist, toc_html, opts));
        }
        out.push_str("</li>");
    }
    out.push_str(&format!("</{}>", tag));
    out
}

/// A list item's inline-keyword prefix wraps its content inside the `<li>`,
/// in the same outer→inner rank order as a `DecoratedBlock`.
fn render_list_item(item: &ListItem) -> String {
    let inline_html = render_inline(&item.inline);
    if item.decorations.is_empty() {
        return inline_html;
    }
    let mut out = String::new();
    for kw in &item.decorations {
        out.push_str(&render_open_tag(kw.html_tag, None, kw.css_class, None, &BTreeMap::new()));
    }
    out.push_str(&inline_html);
    for kw in item.decorations.iter().rev() {
        out.push_str(&format!("</{}>", kw.html_tag));
    }
    out
}

/// Render an `InlineSeq`. Inline elements are concatenated with no added
/// whitespace.
pub fn render_inline(seq: &[InlineNode]) -> String {
    seq.iter().map(render_inline_node).collect()
}

fn render_inline_node(node: &InlineNode) -> String {
    match node {
        InlineNode::Text { value } => escape(value),
        InlineNode::RawEscape { value } => escape(value),
        InlineNode::Ruby { base, reading } => {
            format!("<ruby>{}<rt>{}</rt></ruby>", escape(base), escape(reading))
        }
        InlineNode::FootnoteRef { id } => crate::footnote::render_footnote_ref(id),
        InlineNode::InlineCode { value } => format!("<code>{}</code>", escape(value)),
        InlineNode::Emphasis { kind, children } => {
            let tag = match kind {
                EmphasisKind::Bold => "strong",
                EmphasisKind::Italic => "em",
            };
            format!("<{tag}>{}</{tag}>", render_inline(children), tag = tag)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> RenderOptions {
        RenderOptions {
            error_level: ErrorLevel::Normal,
        }
    }

    #[test]
    fn heading_and_paragraph_render_in_order() {
        let doc = crate::parser::parse("#見出し1#\nタイトル\n##\n\n本文です。\n");
        let html = render_document(&doc, "", &opts());
        assert!(html.contains("<h1 id=\"heading-1\">タイトル</h1>"));
        assert!(html.contains("<p>本文です。</p>"));
        assert!(html.find("h1").unwrap() < html.find("本文です").unwrap());
    }

    #[test]
    fn composite_decoration_nests_outer_to_inner() {
        let doc = crate::parser::parse("#枠線+太字#\ncontent\n##\n");
        let html = render_document(&doc, "", &opts());
        assert!(html.contains("<div class=\"box\"><strong>content</strong></div>"));
    }

    #[test]
    fn highlight_with_color_attribute() {
        let doc = crate::parser::parse("#ハイライト color=#ffffcc#\n注目\n##\n");
        let html = render_document(&doc, "", &opts());
        assert!(html.contains("<div class=\"highlight\" style=\"background-color:#ffffcc\">注目</div>"));
    }

    #[test]
    fn error_marker_visible_in_normal_mode_and_literal_in_lenient() {
        let doc = crate::parser::parse("#太子#\nx\n##\n");
        let normal = render_document(&doc, "", &opts());
        assert!(normal.contains("error-marker"));

        let lenient_opts = RenderOptions {
            error_level: ErrorLevel::Lenient,
        };
        let lenient = render_document(&doc, "", &lenient_opts);
        assert!(!lenient.contains("error-marker"));
    }

    #[test]
    fn footnote_inline_and_section_render() {
        let doc = crate::parser::parse("本文((注記))続き。\n");
        let html = render_document(&doc, "", &opts());
        assert!(html.contains("本文<sup id=\"fnref-1\"><a href=\"#fn-1\">1</a></sup>続き。"));
        assert!(html.contains("<li id=\"fn-1\">注記"));
    }

    #[test]
    fn toc_placeholder_is_substituted() {
        let doc = crate::parser::parse("#目次#\n##\n");
        let html = render_document(&doc, "<ul><li>stub</li></ul>", &opts());
        assert_eq!(html, "<ul><li>stub</li></ul>");
    }
}
