//! Document Assembler.
//!
//! Builds the template context and invokes an injected `TemplateRenderer`,
//! an abstract interface in place of coupling to one specific template
//! library: any engine that can substitute named variables and evaluate
//! trivial conditionals suffices. This module ships a minimal built-in
//! substitution engine as the default so the crate has no hard dependency
//! on an external templating crate.

use std::collections::HashMap;
use std::fmt;

use crate::ast::{BlockNode, Document};
use crate::ast::inline::InlineNode;

/// The context handed to a `TemplateRenderer`.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub title: String,
    pub body_html: String,
    pub toc_html: String,
    pub has_toc: bool,
    pub source_text: Option<String>,
    pub source_filename: Option<String>,
    pub navigation_html: Option<String>,
    pub css_vars: HashMap<String, String>,
}

impl TemplateContext {
    /// Flatten into a `name -> value` map for substitution-style template
    /// engines; the assembler only ever populates the context keys listed
    /// here.
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("title".to_string(), self.title.clone());
        map.insert("body_html".to_string(), self.body_html.clone());
        map.insert("toc_html".to_string(), self.toc_html.clone());
        map.insert("has_toc".to_string(), self.has_toc.to_string());
        map.insert(
            "include_source_view".to_string(),
            self.source_text.is_some().to_string(),
        );
        if let Some(source_text) = &self.source_text {
            map.insert("source_text".to_string(), source_text.clone());
        }
        if let Some(filename) = &self.source_filename {
            map.insert("source_filename".to_string(), filename.clone());
        }
        if let Some(nav) = &self.navigation_html {
            map.insert("navigation_html".to_string(), nav.clone());
        }
        for (key, value) in &self.css_vars {
            map.insert(format!("css_vars.{}", key), value.clone());
        }
        map
    }
}

/// Failure from an injected `TemplateRenderer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateError(pub String);

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "template error: {}", self.0)
    }
}

impl std::error::Error for TemplateError {}

/// External collaborator: anything that can turn a named template plus a
/// context into a finished HTML string.
pub trait TemplateRenderer {
    fn render(&self, template_name: &str, context: &TemplateContext) -> Result<String, TemplateError>;
}

const DEFAULT_TEMPLATE: &str = concat!(
    "<!DOCTYPE html>\n",
    "<html lang=\"ja\">\n",
    "<head><meta charset=\"utf-8\"><title>{{title}}</title></head>\n",
    "<body>\n",
    "{{#if has_toc}}<nav class=\"toc\">{{toc_html}}</nav>{{/if}}\n",
    "<main>{{body_html}}</main>\n",
    "{{#if include_source_view}}<pre class=\"source\">{{source_text}}</pre>{{/if}}\n",
    "</body>\n",
    "</html>\n",
);

/// The built-in minimal substitution engine: `{{var}}` plus trivial
/// `{{#if var}}...{{/if}}` conditionals, no nesting.
pub struct MinimalTemplateRenderer {
    templates: HashMap<String, String>,
}

impl MinimalTemplateRenderer {
    pub fn new() -> Self {
        let mut templates = HashMap::new();
        templates.insert("default".to_string(), DEFAULT_TEMPLATE.to_string());
        Self { templates }
    }

    pub fn with_template(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.templates.insert(name.into(), content.into());
        self
    }
}

impl Default for MinimalTemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for MinimalTemplateRenderer {
    fn render(&self, template_name: &str, context: &TemplateContext) -> Result<String, TemplateError> {
        let template = self
            .templates
            .get(template_name)
            .ok_or_else(|| TemplateError(format!("unknown template '{}'", template_name)))?;
        let vars = context.to_map();
        let after_conditionals = apply_conditionals(template, &vars);
        Ok(apply_variables(&after_conditionals, &vars))
    }
}

/// Strips (or keeps) each non-nested `{{#if name}}...{{/if}}` block based on
/// whether `name` maps to a non-empty, non-`"false"` value.
fn apply_conditionals(template: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{#if ") {
        out.push_str(&rest[..start]);
        let after_tag = &rest[start + "{{#if ".len()..];
        let Some(name_end) = after_tag.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = after_tag[..name_end].trim();
        let body_and_after = &after_tag[name_end + 2..];
        let close_tag = "{{/if}}";
        let close_idx = body_and_after.find(close_tag).unwrap_or(body_and_after.len());
        let body = &body_and_after[..close_idx];
        let truthy = vars.get(name).map(|v| !v.is_empty() && v != "false").unwrap_or(false);
        if truthy {
            out.push_str(body);
        }
        rest = body_and_after
            .get(close_idx + close_tag.len()..)
            .unwrap_or("");
    }
    out.push_str(rest);
    out
}

fn apply_variables(template: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = after[..end].trim();
                if let Some(value) = vars.get(name) {
                    out.push_str(value);
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Picks the document title: the first `見出し1` heading's plain text, or
/// an empty string when the document has none. `title` is a required
/// `TemplateContext` field and this is the only source of one in scope —
/// there is no front-matter parsing.
fn derive_title(doc: &Document) -> String {
    doc.walk_pre_order()
        .into_iter()
        .find_map(|node| match node {
            BlockNode::Heading { level: 1, inline, .. } => Some(InlineNode::plain_text(inline)),
            _ => None,
        })
        .unwrap_or_default()
}

/// Builds the template context and invokes the renderer.
pub struct DocumentAssembler;

impl DocumentAssembler {
    pub fn new() -> Self {
        Self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        &self,
        doc: &Document,
        body_html: &str,
        toc_html: &str,
        template_name: &str,
        source_text: Option<&str>,
        source_filename: Option<&str>,
        template: &dyn TemplateRenderer,
    ) -> Result<String, TemplateError> {
        let context = TemplateContext {
            title: derive_title(doc),
            body_html: body_html.to_string(),
            toc_html: toc_html.to_string(),
            has_toc: !toc_html.is_empty(),
            source_text: source_text.map(str::to_string),
            source_filename: source_filename.map(str::to_string),
            navigation_html: None,
            css_vars: HashMap::new(),
        };
        template.render(template_name, &context)
    }
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_plain_variables() {
        let mut vars = HashMap::new();
        vars.insert("title".to_string(), "Hi".to_string());
        assert_eq!(apply_variables("<title>{{title}}</title>", &vars), "<title>Hi</title>");
    }

    #[test]
    fn conditional_block_kept_when_truthy() {
        let mut vars = HashMap::new();
        vars.insert("has_toc".to_string(), "true".to_string());
        let out = apply_conditionals("a{{#if has_toc}}b{{/if}}c", &vars);
        assert_eq!(out, "abc");
    }

    #[test]
    fn conditional_block_dropped_when_falsy() {
        let vars = HashMap::new();
        let out = apply_conditionals("a{{#if has_toc}}b{{/if}}c", &vars);
        assert_eq!(out, "ac");
    }

    #[test]
    fn assembler_produces_full_html_document() {
        let doc = crate::parser::parse("#見出し1#\nタイトル\n##\n");
        let assembler = DocumentAssembler::new();
        let renderer = MinimalTemplateRenderer::new();
        let html = assembler
            .assemble(&doc, "<h1>タイトル</h1>", "", "default", None, None, &renderer)
            .unwrap();
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("<title>タイトル</title>"));
        assert!(html.contains("<main><h1>タイトル</h1></main>"));
        assert!(!html.contains("<nav"));
    }

    #[test]
    fn assembler_includes_source_view_when_requested() {
        let doc = crate::parser::parse("本文\n");
        let assembler = DocumentAssembler::new();
        let renderer = MinimalTemplateRenderer::new();
        let html = assembler
            .assemble(&doc, "<p>本文</p>", "", "default", Some("本文\n"), Some("doc.txt"), &renderer)
            .unwrap();
        assert!(html.contains("<pre class=\"source\">本文"));
    }
}
