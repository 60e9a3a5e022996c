//! Converting selector results to cell values
//!
//! Element text follows rendering rules rather than raw concatenation:
//!
//! - comments and processing instructions are skipped
//! - a whitespace run containing a line break is source formatting and
//!   becomes one space; runs of plain spaces and tabs are kept
//! - in HTML, block elements (and `br`) are boundaries: whitespace next to a
//!   boundary is dropped and content on both sides is separated by one space
//! - `pre`-like HTML elements keep their text verbatim
//! - the result is trimmed

use std::borrow::Cow;

use sxd_document::dom;
use sxd_xpath::{nodeset, Value};

use crate::document::{Document, DocumentKind};
use crate::error::EvaluationError;
use crate::selector::Selector;

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "caption", "center", "dd",
    "details", "dialog", "dir", "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer",
    "form", "frameset", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr",
    "html", "legend", "li", "listing", "main", "menu", "nav", "ol", "optgroup", "option", "p",
    "plaintext", "pre", "section", "summary", "table", "tbody", "td", "textarea", "tfoot", "th",
    "thead", "title", "tr", "ul",
];

const VERBATIM_ELEMENTS: &[&str] = &["listing", "plaintext", "pre", "textarea"];

/// One item produced by a selector
#[derive(Debug, Clone, PartialEq)]
pub enum Selected {
    Text(String),
    /// Numeric scalar such as `count(//a)`
    Number(f64),
}

impl Selected {
    pub fn into_text(self) -> String {
        match self {
            Selected::Text(text) => text,
            Selected::Number(n) => format_number(n),
        }
    }
}

/// Evaluate `selector` with `context` as context node and convert every
/// result item.
///
/// Scalars always come back as exactly one item; a string result is never
/// split up.
pub fn select(
    document: &Document,
    selector: &Selector,
    context: nodeset::Node<'_>,
) -> Result<Vec<Selected>, EvaluationError> {
    let kind = document.kind();
    let selected = match selector.evaluate(context)? {
        Value::Nodeset(nodes) => nodes
            .document_order()
            .into_iter()
            .map(|node| Selected::Text(node_text(kind, node)))
            .collect(),
        Value::Boolean(b) => vec![Selected::Text(if b { "True" } else { "False" }.to_string())],
        Value::Number(n) => vec![Selected::Number(n)],
        Value::String(s) => vec![Selected::Text(s)],
    };
    Ok(selected)
}

/// Text of a single node
pub fn node_text(kind: DocumentKind, node: nodeset::Node<'_>) -> String {
    match node {
        nodeset::Node::Root(root) => {
            let mut writer = TextWriter::new(kind);
            for child in root.children() {
                if let dom::ChildOfRoot::Element(element) = child {
                    writer.write_element(element);
                }
            }
            writer.finish()
        }
        nodeset::Node::Element(element) => {
            let mut writer = TextWriter::new(kind);
            writer.write_element(element);
            writer.finish()
        }
        nodeset::Node::Attribute(attribute) => attribute.value().to_string(),
        nodeset::Node::Text(text) => text.text().to_string(),
        other => other.string_value(),
    }
}

/// XPath `string()` formatting: integral values have no fraction
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

enum Step<'d> {
    Open(dom::Element<'d>),
    Close(dom::Element<'d>),
    Text(dom::Text<'d>),
}

struct TextWriter {
    kind: DocumentKind,
    out: String,
    at_boundary: bool,
    verbatim_depth: usize,
}

impl TextWriter {
    fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            out: String::new(),
            at_boundary: true,
            verbatim_depth: 0,
        }
    }

    fn write_element(&mut self, element: dom::Element<'_>) {
        let mut steps = vec![Step::Open(element)];

        while let Some(step) = steps.pop() {
            match step {
                Step::Open(element) => {
                    self.open(element);
                    steps.push(Step::Close(element));
                    for child in element.children().into_iter().rev() {
                        match child {
                            dom::ChildOfElement::Element(child) => steps.push(Step::Open(child)),
                            dom::ChildOfElement::Text(text) => steps.push(Step::Text(text)),
                            _ => {}
                        }
                    }
                }
                Step::Close(element) => self.close(element),
                Step::Text(text) => self.text(text.text()),
            }
        }
    }

    fn open(&mut self, element: dom::Element<'_>) {
        if self.is_html(element, BLOCK_ELEMENTS) {
            self.boundary();
        }
        if self.is_html(element, VERBATIM_ELEMENTS) {
            self.verbatim_depth += 1;
        }
    }

    fn close(&mut self, element: dom::Element<'_>) {
        if self.is_html(element, VERBATIM_ELEMENTS) {
            self.verbatim_depth -= 1;
        }
        if self.is_html(element, BLOCK_ELEMENTS) {
            self.boundary();
        }
    }

    fn is_html(&self, element: dom::Element<'_>, names: &[&str]) -> bool {
        let name = element.name();
        self.kind == DocumentKind::Html
            && name.namespace_uri().is_none()
            && names.contains(&name.local_part())
    }

    fn boundary(&mut self) {
        let len = self.out.trim_end_matches(is_space).len();
        self.out.truncate(len);
        self.at_boundary = true;
    }

    fn text(&mut self, text: &str) {
        let text = if self.verbatim_depth > 0 {
            Cow::Borrowed(text)
        } else {
            collapse_line_breaks(text)
        };

        let mut piece: &str = &text;
        if self.at_boundary {
            piece = piece.trim_start_matches(is_space);
            if piece.is_empty() {
                return;
            }
            if !self.out.is_empty() {
                self.out.push(' ');
            }
            self.at_boundary = false;
        }
        self.out.push_str(piece);
    }

    fn finish(self) -> String {
        self.out.trim_matches(is_space).to_string()
    }
}

fn is_space(c: char) -> bool {
    c.is_ascii_whitespace()
}

fn collapse_line_breaks(text: &str) -> Cow<'_, str> {
    if !text.contains(['\n', '\r']) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut run_start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        if is_space(c) {
            run_start.get_or_insert(i);
            continue;
        }
        if let Some(start) = run_start.take() {
            push_whitespace_run(&mut out, &text[start..i]);
        }
        out.push(c);
    }
    if let Some(start) = run_start {
        push_whitespace_run(&mut out, &text[start..]);
    }
    Cow::Owned(out)
}

fn push_whitespace_run(out: &mut String, run: &str) {
    if run.contains(['\n', '\r']) {
        out.push(' ');
    } else {
        out.push_str(run);
    }
}
