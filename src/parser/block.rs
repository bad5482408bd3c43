//! Block Parser: the pushdown state machine.
//!
//! A recursive-descent line-cursor walk dispatching on line kind, built
//! around five block states: `TopLevel`, `InParagraph`, `InList(level)`,
//! `InDecoratedBlock`, `InCollapsible`. The states aren't reified as an enum
//! here — each is a recursion level of `parse_block_sequence`/
//! `parse_list_at_level`, which is the idiomatic encoding of a pushdown
//! automaton whose stack is the Rust call stack.

use std::collections::HashMap;

use crate::ast::{BlockNode, List, ListItem};
use crate::diagnostics::{Diagnostic, ErrorKind};
use crate::keyword::{self, Keyword, KeywordCategory, KeywordError};
use crate::lexer::{LineKind, LogicalLine};
use crate::span::Span;

use super::inline::{find_marker_close, parse_inline, InlineContext};
use super::{ParserContext, MAX_NESTING_DEPTH};

/// Parses a run of sibling blocks starting at `pos`. When `inside_container`
/// is true, a `MarkerClose` line ends this sequence (the container that
/// opened it); when false (top level), a stray `MarkerClose` is itself a
/// diagnostic and is skipped. Returns the parsed children and the position
/// just past the line that ended the sequence.
pub(super) fn parse_block_sequence(
    lines: &[LogicalLine],
    mut pos: usize,
    ctx: &mut ParserContext,
    depth: u32,
    inside_container: bool,
) -> (Vec<BlockNode>, usize) {
    let mut children = Vec::new();

    loop {
        if pos >= lines.len() {
            if inside_container {
                ctx.diagnostics.push(Diagnostic::error(
                    ErrorKind::UnclosedBlock,
                    lines.last().map(|l| l.span).unwrap_or(Span::point(crate::span::Position::start())),
                    "block was never closed before end of document",
                ));
            }
            return (children, pos);
        }

        let line = &lines[pos];
        match &line.kind {
            LineKind::Blank => {
                pos += 1;
            }
            LineKind::MarkerClose => {
                if inside_container {
                    return (children, pos + 1);
                }
                ctx.diagnostics.push(Diagnostic::warning(
                    ErrorKind::UnexpectedClose,
                    line.span,
                    "'##' with no matching open marker",
                ));
                pos += 1;
            }
            LineKind::MarkerOpen { header_text } => {
                let header_text = header_text.clone();
                let (node, new_pos) = parse_marker_block(lines, pos, &header_text, ctx, depth);
                children.push(node);
                pos = new_pos;
            }
            LineKind::MarkerInline { header_text, content } => {
                let node = parse_inline_marker_line(header_text, content, line.span, ctx);
                children.push(node);
                pos += 1;
            }
            LineKind::ListItem { .. } => {
                let (list, new_pos) = parse_list_at_level(lines, pos, indent_of(&lines[pos]), ctx);
                children.push(BlockNode::List { list });
                pos = new_pos;
            }
            LineKind::Text { .. } | LineKind::EscapedMarkerLine { .. } => {
                let (joined, span, new_pos) = gather_paragraph(lines, pos);
                let mut inline_ctx = InlineContext {
                    footnote_counter: &mut ctx.footnote_counter,
                    diagnostics: &mut ctx.diagnostics,
                    footnotes: &mut ctx.footnotes,
                    span,
                };
                let inline = parse_inline(&joined, &mut inline_ctx);
                children.push(BlockNode::Paragraph { inline, span });
                pos = new_pos;
            }
        }
    }
}

fn indent_of(line: &LogicalLine) -> usize {
    match &line.kind {
        LineKind::ListItem { indent_chars, .. } => *indent_chars,
        _ => 0,
    }
}

/// Collects a run of consecutive `Text`/`EscapedMarkerLine` lines into one
/// paragraph, joined with `\n` so the plain-text round trip preserves
/// internal line breaks exactly.
fn gather_paragraph(lines: &[LogicalLine], mut pos: usize) -> (String, Span, usize) {
    let start_span = lines[pos].span;
    let mut collected = Vec::new();
    let mut last_span = start_span;
    while pos < lines.len() {
        match &lines[pos].kind {
            LineKind::Text { content } => {
                collected.push(content.clone());
                last_span = lines[pos].span;
                pos += 1;
            }
            LineKind::EscapedMarkerLine { text } => {
                collected.push(format!("#{}", text));
                last_span = lines[pos].span;
                pos += 1;
            }
            _ => break,
        }
    }
    (collected.join("\n"), start_span.merge(last_span), pos)
}

/// A `#header#content##` line standing alone: equivalent to a one-line
/// paragraph containing a single inline marker.
fn parse_inline_marker_line(
    header: &str,
    content: &str,
    span: Span,
    ctx: &mut ParserContext,
) -> BlockNode {
    let mut inline_ctx = InlineContext {
        footnote_counter: &mut ctx.footnote_counter,
        diagnostics: &mut ctx.diagnostics,
        footnotes: &mut ctx.footnotes,
        span,
    };
    let inline = parse_inline(&format!("#{}#{}##", header, content), &mut inline_ctx);
    BlockNode::Paragraph { inline, span }
}

/// Dispatches a `MarkerOpen` line to the right block constructor based on
/// the keyword category: TOC placeholder, image, collapsible, heading, or a
/// plain decorated block. On an unknown keyword or other header error,
/// recovers by skipping to the next `MarkerClose` or blank line and
/// emitting an `ErrorMarker`.
fn parse_marker_block(
    lines: &[LogicalLine],
    pos: usize,
    header_text: &str,
    ctx: &mut ParserContext,
    depth: u32,
) -> (BlockNode, usize) {
    let open_span = lines[pos].span;

    let keywords = match keyword::parse_composite(header_text) {
        Ok(k) if !k.is_empty() => k,
        Ok(_) => return recover_unknown_marker(lines, pos, header_text, "empty keyword header"),
        Err(KeywordError::UnknownKeyword(tok)) => {
            let suggestions: Vec<String> = keyword::suggest(&tok, 3)
                .into_iter()
                .map(|k| k.name.to_string())
                .collect();
            ctx.diagnostics.push(
                Diagnostic::error(
                    ErrorKind::UnknownKeyword,
                    open_span,
                    format!("unknown keyword '{}'", tok),
                )
                .with_keyword_suggestions(&tok),
            );
            let reason = match suggestions.first() {
                Some(top) => format!("unknown keyword (did you mean {}?)", top),
                None => "unknown keyword".to_string(),
            };
            return recover_unknown_marker(lines, pos, header_text, &reason);
        }
        Err(other) => {
            ctx.diagnostics
                .push(Diagnostic::error(ErrorKind::InvalidAttribute, open_span, format!("{:?}", other)));
            return recover_unknown_marker(lines, pos, header_text, "invalid header");
        }
    };

    let attrs = match keyword::parse_attributes(header_text) {
        Ok(a) => a,
        Err(KeywordError::InvalidColor(value)) => {
            ctx.diagnostics.push(Diagnostic::warning(
                ErrorKind::InvalidColor,
                open_span,
                format!("invalid color value '{}', attribute dropped", value),
            ));
            HashMap::new()
        }
        Err(other) => {
            ctx.diagnostics
                .push(Diagnostic::warning(ErrorKind::InvalidAttribute, open_span, format!("{:?}", other)));
            HashMap::new()
        }
    };

    if keywords.iter().any(|k| k.category == KeywordCategory::SpecialToc) {
        return parse_toc_placeholder(lines, pos, ctx);
    }
    if keywords.iter().any(|k| k.category == KeywordCategory::SpecialImage) {
        return parse_image(lines, pos, &attrs, ctx);
    }
    if keywords.iter().any(|k| k.category == KeywordCategory::Collapsible) {
        return parse_collapsible(lines, pos, &keywords, ctx, depth);
    }
    if let Some(heading_kw) = keywords.iter().find(|k| k.category == KeywordCategory::Heading) {
        return parse_heading(lines, pos, heading_kw, &keywords, ctx);
    }
    parse_decorated_block(lines, pos, keywords, attrs, ctx, depth)
}

fn recover_unknown_marker(
    lines: &[LogicalLine],
    pos: usize,
    header_text: &str,
    reason: &str,
) -> (BlockNode, usize) {
    let open_span = lines[pos].span;
    let mut p = pos + 1;
    while p < lines.len() {
        match &lines[p].kind {
            LineKind::MarkerClose => {
                p += 1;
                break;
            }
            LineKind::Blank => break,
            _ => p += 1,
        }
    }
    (
        BlockNode::ErrorMarker {
            original_text: lines[pos].raw.clone(),
            kind: ErrorKind::UnknownKeyword,
            message: format!("'{}': {}", header_text, reason),
            span: open_span,
        },
        p,
    )
}

/// `目次`: any content between the markers is ignored but flagged, since a
/// placeholder block isn't supposed to carry content.
fn parse_toc_placeholder(lines: &[LogicalLine], pos: usize, ctx: &mut ParserContext) -> (BlockNode, usize) {
    let open_span = lines[pos].span;
    let mut p = pos + 1;
    let mut had_content = false;
    while p < lines.len() {
        match &lines[p].kind {
            LineKind::MarkerClose => {
                p += 1;
                break;
            }
            LineKind::Blank => p += 1,
            _ => {
                had_content = true;
                p += 1;
            }
        }
    }
    if had_content {
        ctx.diagnostics.push(Diagnostic::warning(
            ErrorKind::EmptyBlock,
            open_span,
            "content inside a '目次' block is ignored",
        ));
    }
    (BlockNode::TocPlaceholder { span: open_span }, p)
}

/// Matches the renderer's `src` grammar: a bare filename with an image
/// extension, no path traversal or query components.
fn image_src_pattern() -> &'static regex::Regex {
    static PATTERN: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"^[A-Za-z0-9_.-]+\.(png|jpe?g|gif|webp|svg)$").unwrap()
    })
}

/// `画像`: the block body is the image source path, the `alt` attribute is
/// carried over verbatim. An `src` that fails the renderer's filename
/// grammar degrades to an `ErrorMarker` with a diagnostic.
fn parse_image(
    lines: &[LogicalLine],
    pos: usize,
    attrs: &HashMap<String, String>,
    ctx: &mut ParserContext,
) -> (BlockNode, usize) {
    let open_span = lines[pos].span;
    let mut p = pos + 1;
    let mut src_lines = Vec::new();
    while p < lines.len() {
        match &lines[p].kind {
            LineKind::MarkerClose => {
                p += 1;
                break;
            }
            LineKind::Text { content } => {
                src_lines.push(content.clone());
                p += 1;
            }
            LineKind::Blank => p += 1,
            _ => p += 1,
        }
    }
    let src = src_lines.join("").trim().to_string();
    let alt = attrs.get("alt").cloned().unwrap_or_default();

    if !image_src_pattern().is_match(&src) {
        ctx.diagnostics.push(Diagnostic::error(
            ErrorKind::InvalidAttribute,
            open_span,
            format!("'{}' is not a valid image filename", src),
        ));
        return (
            BlockNode::ErrorMarker {
                original_text: src,
                kind: ErrorKind::InvalidAttribute,
                message: "invalid image filename".to_string(),
                span: open_span,
            },
            p,
        );
    }

    (
        BlockNode::Image {
            src,
            alt,
            attrs: attrs.clone(),
            span: open_span,
        },
        p,
    )
}

/// `折りたたみ` / `ネタバレ`: a container whose default summary text depends
/// on which of the two collapsible keywords was used.
fn parse_collapsible(
    lines: &[LogicalLine],
    pos: usize,
    keywords: &[&'static Keyword],
    ctx: &mut ParserContext,
    depth: u32,
) -> (BlockNode, usize) {
    let open_span = lines[pos].span;
    let spoiler = keywords.iter().any(|k| k.name == "ネタバレ");
    let summary = if spoiler { "ネタバレを表示" } else { "詳細を表示" };

    let next_depth = depth + 1;
    if next_depth > MAX_NESTING_DEPTH {
        ctx.diagnostics.push(Diagnostic::warning(
            ErrorKind::NestingTooDeep,
            open_span,
            "nesting exceeds the depth cap; further nesting is flattened",
        ));
    }
    let (children, p) = parse_block_sequence(lines, pos + 1, ctx, next_depth.min(MAX_NESTING_DEPTH), true);
    (
        BlockNode::Collapsible {
            summary: summary.to_string(),
            spoiler,
            children,
            span: open_span,
        },
        p,
    )
}

/// `見出しN`, possibly composited with decoration keywords: the heading's
/// own content is a single inline run; multiple content lines are joined
/// with a space (with a diagnostic) rather than treated as an error.
fn parse_heading(
    lines: &[LogicalLine],
    pos: usize,
    heading_kw: &'static Keyword,
    all_keywords: &[&'static Keyword],
    ctx: &mut ParserContext,
) -> (BlockNode, usize) {
    let open_span = lines[pos].span;
    let level: u8 = heading_kw.html_tag.trim_start_matches('h').parse().unwrap_or(1);

    let mut p = pos + 1;
    let mut text_lines = Vec::new();
    while p < lines.len() {
        match &lines[p].kind {
            LineKind::MarkerClose => {
                p += 1;
                break;
            }
            LineKind::Blank => p += 1,
            LineKind::Text { content } => {
                text_lines.push(content.clone());
                p += 1;
            }
            LineKind::EscapedMarkerLine { text } => {
                text_lines.push(format!("#{}", text));
                p += 1;
            }
            _ => p += 1,
        }
    }

    if text_lines.len() > 1 {
        ctx.diagnostics.push(Diagnostic::warning(
            ErrorKind::MultiLineHeading,
            open_span,
            "multiple lines inside a heading marker were joined with a space",
        ));
    }
    let joined = text_lines.join(" ");

    let mut inline_ctx = InlineContext {
        footnote_counter: &mut ctx.footnote_counter,
        diagnostics: &mut ctx.diagnostics,
        footnotes: &mut ctx.footnotes,
        span: open_span,
    };
    let mut inline = parse_inline(&joined, &mut inline_ctx);

    for kw in all_keywords.iter().rev() {
        if kw.name == heading_kw.name {
            continue;
        }
        match kw.html_tag {
            "strong" => inline = vec![crate::ast::InlineNode::Emphasis {
                kind: crate::ast::inline::EmphasisKind::Bold,
                children: inline,
            }],
            "em" => inline = vec![crate::ast::InlineNode::Emphasis {
                kind: crate::ast::inline::EmphasisKind::Italic,
                children: inline,
            }],
            _ => {
                ctx.diagnostics.push(Diagnostic::warning(
                    ErrorKind::MixedInlineBlock,
                    open_span,
                    format!("'{}' cannot decorate a heading's inline content; ignored", kw.name),
                ));
            }
        }
    }

    let anchor_id = ctx.next_anchor_id();
    (
        BlockNode::Heading {
            level,
            inline,
            anchor_id,
            span: open_span,
        },
        p,
    )
}

/// A generic composite decorated block: its children are parsed recursively
/// as a nested block sequence. An empty decoration degrades to an
/// `ErrorMarker`.
fn parse_decorated_block(
    lines: &[LogicalLine],
    pos: usize,
    keywords: Vec<&'static Keyword>,
    attrs: HashMap<String, String>,
    ctx: &mut ParserContext,
    depth: u32,
) -> (BlockNode, usize) {
    let open_span = lines[pos].span;
    let next_depth = depth + 1;
    if next_depth > MAX_NESTING_DEPTH {
        ctx.diagnostics.push(Diagnostic::warning(
            ErrorKind::NestingTooDeep,
            open_span,
            "nesting exceeds the depth cap; further nesting is flattened",
        ));
    }
    let (children, p) = parse_block_sequence(lines, pos + 1, ctx, next_depth.min(MAX_NESTING_DEPTH), true);
    if children.is_empty() {
        return (
            BlockNode::ErrorMarker {
                original_text: lines[pos].raw.clone(),
                kind: ErrorKind::EmptyBlock,
                message: "decorated block has no content".to_string(),
                span: open_span,
            },
            p,
        );
    }
    (
        BlockNode::DecoratedBlock {
            keywords: keywords.into_iter().cloned().collect(),
            attrs,
            children,
            span: open_span,
        },
        p,
    )
}

/// Builds a (possibly nested) list starting at `pos`, whose first item is
/// at `base_indent`: items at the same indent extend the current list, a
/// deeper indent opens a sublist under the previous item, a shallower
/// indent ends this level and lets the caller continue.
fn parse_list_at_level(
    lines: &[LogicalLine],
    mut pos: usize,
    base_indent: usize,
    ctx: &mut ParserContext,
) -> (List, usize) {
    let start_span = lines[pos].span;
    let mut last_span = start_span;
    let mut items: Vec<ListItem> = Vec::new();
    let mut ordered = false;
    let mut seen_first = false;

    while pos < lines.len() {
        let LineKind::ListItem {
            indent_chars,
            ordered: item_ordered,
            content,
            ..
        } = &lines[pos].kind
        else {
            break;
        };

        if *indent_chars < base_indent {
            break;
        }
        if *indent_chars > base_indent {
            if let Some(last_item) = items.last_mut() {
                let (sublist, new_pos) = parse_list_at_level(lines, pos, *indent_chars, ctx);
                last_item.sublist = Some(Box::new(sublist));
                pos = new_pos;
                continue;
            }
            // No item at this level to attach a sublist to: treat as if it
            // were at this level (defensive; malformed leading indent).
        }

        if !seen_first {
            ordered = *item_ordered;
            seen_first = true;
        }

        let span = lines[pos].span;
        let (decorations, text) = parse_list_item_prefix(content, ctx, span);
        let mut inline_ctx = InlineContext {
            footnote_counter: &mut ctx.footnote_counter,
            diagnostics: &mut ctx.diagnostics,
            footnotes: &mut ctx.footnotes,
            span,
        };
        let inline = parse_inline(&text, &mut inline_ctx);
        last_span = span;
        items.push(ListItem {
            decorations,
            inline,
            sublist: None,
            span,
        });
        pos += 1;
    }

    (
        List {
            ordered,
            items,
            span: start_span.merge(last_span),
        },
        pos,
    )
}

/// Recognizes a list item's optional inline-keyword prefix: `#太字# text ##`
/// or `#太字+枠線# text ##`. Unlike a standalone inline marker, the keywords
/// here aren't restricted to inline-only tags — they decorate the `<li>`
/// itself, so any valid composite is accepted.
fn parse_list_item_prefix(
    content: &str,
    ctx: &mut ParserContext,
    span: Span,
) -> (Vec<Keyword>, String) {
    let chars: Vec<char> = content.chars().collect();
    if chars.first() != Some(&'#') || chars.get(1) == Some(&'#') {
        return (Vec::new(), content.to_string());
    }
    let Some(header_end) = chars[1..].iter().position(|&c| c == '#').map(|p| p + 1) else {
        return (Vec::new(), content.to_string());
    };
    if header_end == 1 {
        return (Vec::new(), content.to_string());
    }
    let header: String = chars[1..header_end].iter().collect();
    let content_start = header_end + 1;
    let Some(closer_at) = find_marker_close(&chars, content_start) else {
        return (Vec::new(), content.to_string());
    };
    let trailing: String = chars[closer_at + 2..].iter().collect();
    if !trailing.trim().is_empty() {
        return (Vec::new(), content.to_string());
    }
    let inner: String = chars[content_start..closer_at].iter().collect();

    match keyword::parse_composite(&header) {
        Ok(keywords) if !keywords.is_empty() => {
            (keywords.into_iter().cloned().collect(), inner.trim().to_string())
        }
        Ok(_) => (Vec::new(), content.to_string()),
        Err(KeywordError::UnknownKeyword(tok)) => {
            ctx.diagnostics.push(
                Diagnostic::error(ErrorKind::UnknownKeyword, span, format!("unknown keyword '{}'", tok))
                    .with_keyword_suggestions(&tok),
            );
            (Vec::new(), content.to_string())
        }
        Err(_) => (Vec::new(), content.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> crate::ast::Document {
        crate::parser::parse(source)
    }

    #[test]
    fn plain_paragraph_round_trips() {
        let doc = parse("本文です。\n");
        assert_eq!(doc.children.len(), 1);
        assert!(matches!(&doc.children[0], BlockNode::Paragraph { .. }));
    }

    #[test]
    fn heading_gets_unique_anchor() {
        let doc = parse("#見出し1#\nタイトル\n##\n\n#見出し1#\n二つめ\n##\n");
        let (_, _, a1) = doc.children[0].as_heading().unwrap();
        let (_, _, a2) = doc.children[1].as_heading().unwrap();
        assert_eq!(a1, "heading-1");
        assert_eq!(a2, "heading-2");
    }

    #[test]
    fn composite_heading_wraps_inline_content() {
        let doc = parse("#見出し2+太字#\n重要\n##\n");
        let (level, inline, _) = doc.children[0].as_heading().unwrap();
        assert_eq!(level, 2);
        assert!(matches!(
            &inline[0],
            crate::ast::InlineNode::Emphasis { kind: crate::ast::inline::EmphasisKind::Bold, .. }
        ));
    }

    #[test]
    fn unknown_keyword_becomes_error_marker_with_suggestion() {
        let doc = parse("#太子#\ntext\n##\n");
        assert!(matches!(&doc.children[0], BlockNode::ErrorMarker { .. }));
        assert!(doc.has_errors());
        let diag = &doc.diagnostics[0];
        assert_eq!(diag.suggestions[0], "太字");
    }

    #[test]
    fn empty_decorated_block_degrades_to_error_marker() {
        let doc = parse("#枠線#\n##\n");
        assert!(matches!(&doc.children[0], BlockNode::ErrorMarker { kind: ErrorKind::EmptyBlock, .. }));
    }

    #[test]
    fn unclosed_block_emits_diagnostic_at_eof() {
        let doc = parse("#枠線#\ntext\n");
        assert!(doc.has_errors());
        assert!(doc.diagnostics.iter().any(|d| d.kind == ErrorKind::UnclosedBlock));
    }

    #[test]
    fn nested_list_attaches_sublist_to_previous_item() {
        let doc = parse("- top\n  - nested\n- top2\n");
        let BlockNode::List { list } = &doc.children[0] else {
            panic!("expected list");
        };
        assert_eq!(list.items.len(), 2);
        assert!(list.items[0].sublist.is_some());
    }

    #[test]
    fn list_item_decoration_prefix_is_parsed() {
        let doc = parse("- #太字# bold item ##\n");
        let BlockNode::List { list } = &doc.children[0] else {
            panic!("expected list");
        };
        assert_eq!(list.items[0].decorations.len(), 1);
        assert_eq!(list.items[0].decorations[0].name, "太字");
    }

    #[test]
    fn collapsible_default_summary_depends_on_spoiler() {
        let doc = parse("#折りたたみ#\ntext\n##\n\n#ネタバレ#\ntext\n##\n");
        let BlockNode::Collapsible { summary, spoiler, .. } = &doc.children[0] else {
            panic!("expected collapsible");
        };
        assert!(!spoiler);
        assert_eq!(summary, "詳細を表示");
        let BlockNode::Collapsible { summary, spoiler, .. } = &doc.children[1] else {
            panic!("expected collapsible");
        };
        assert!(spoiler);
        assert_eq!(summary, "ネタバレを表示");
    }

    #[test]
    fn toc_placeholder_flags_ignored_content() {
        let doc = parse("#目次#\nstray text\n##\n");
        assert!(matches!(&doc.children[0], BlockNode::TocPlaceholder { .. }));
        assert!(doc.diagnostics.iter().any(|d| d.kind == ErrorKind::EmptyBlock));
    }

    #[test]
    fn footnote_inside_paragraph_is_collected() {
        let doc = parse("本文((これは脚注))続き\n");
        assert_eq!(doc.footnotes.len(), 1);
        assert_eq!(doc.footnotes[0].id, "fn-1");
    }

    #[test]
    fn image_block_captures_src_and_alt() {
        let doc = parse("#画像 alt=\"図\"#\nphoto.png\n##\n");
        assert!(matches!(
            &doc.children[0],
            BlockNode::Image { src, alt, .. } if src == "photo.png" && alt == "図"
        ));
    }

}
