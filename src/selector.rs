//! XPath selector compilation
//!
//! Selectors are compiled once and reused read-only across every document
//! and row of a run. HTML is parsed without a namespace and embedded SVG
//! lands in the SVG namespace, so selectors look like:
//!
//! - `//p` for all `<p>` tags in HTML
//! - `//order/@id` for all `<order>` id attributes in XML
//! - `//svg:path/@d` for `<path>` tags of SVG embedded in HTML

use sxd_xpath::{nodeset, Context, ExecutionError, Factory, Value, XPath};

use crate::document::SVG_NAMESPACE;
use crate::error::{EvaluationError, SelectorSyntaxError};

/// Prefixes bound in every evaluation
const NAMESPACES: &[(&str, &str)] = &[("svg", SVG_NAMESPACE)];

const UNDEFINED_PREFIX: &str = "Undefined namespace prefix";

/// A compiled XPath expression and the text it came from
pub struct Selector {
    source: String,
    xpath: XPath,
    /// First prefix with no namespace in [`NAMESPACES`]. sxd-xpath panics
    /// on these, so they are reported before evaluation.
    unbound_prefix: Option<String>,
}

impl std::fmt::Debug for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Selector").field(&self.source).finish()
    }
}

impl Selector {
    pub fn compile(source: &str) -> Result<Self, SelectorSyntaxError> {
        let syntax_error = |message: String| SelectorSyntaxError {
            selector: source.to_string(),
            message,
        };

        match Factory::new().build(source) {
            Ok(Some(xpath)) => Ok(Self {
                source: source.to_string(),
                xpath,
                unbound_prefix: prefixes(source)
                    .into_iter()
                    .find(|prefix| !NAMESPACES.iter().any(|(bound, _)| bound == prefix))
                    .map(str::to_string),
            }),
            Ok(None) => Err(syntax_error("Empty expression".to_string())),
            Err(err) => Err(syntax_error(err.to_string())),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Run against `node`, which becomes the context node
    pub fn evaluate<'d>(&self, node: nodeset::Node<'d>) -> Result<Value<'d>, EvaluationError> {
        if let Some(prefix) = &self.unbound_prefix {
            tracing::debug!(selector = %self.source, prefix = %prefix, "unbound namespace prefix");
            return Err(EvaluationError {
                selector: self.source.clone(),
                message: UNDEFINED_PREFIX.to_string(),
            });
        }

        let mut context = Context::new();
        for (prefix, uri) in NAMESPACES {
            context.set_namespace(prefix, uri);
        }

        self.xpath
            .evaluate(&context, node)
            .map_err(|err| EvaluationError {
                selector: self.source.clone(),
                message: describe(&err),
            })
    }
}

/// Namespace prefixes written in `source`, skipping string literals and
/// `::` axis separators
fn prefixes(source: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut chars = source.char_indices().peekable();
    let mut last_name: Option<&str> = None;

    while let Some((start, c)) = chars.next() {
        match c {
            '"' | '\'' => {
                for (_, d) in chars.by_ref() {
                    if d == c {
                        break;
                    }
                }
                last_name = None;
            }
            ':' => {
                if matches!(chars.peek(), Some((_, ':'))) {
                    chars.next();
                    last_name = None;
                } else if let Some(name) = last_name.take() {
                    found.push(name);
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, d)) = chars.peek() {
                    if !(d.is_alphanumeric() || matches!(d, '_' | '-' | '.')) {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                last_name = Some(&source[start..end]);
            }
            c if c.is_whitespace() => {}
            _ => last_name = None,
        }
    }

    found
}

/// sxd-xpath formats names with `Debug`; turn that into plain text
fn describe(err: &ExecutionError) -> String {
    let text = err.to_string();
    if let Some(name) = text.strip_prefix("unknown function ") {
        format!("Unknown function {}", prefixed_name(name))
    } else if let Some(name) = text.strip_prefix("unknown variable ") {
        format!("Undefined variable ${}", prefixed_name(name))
    } else if text.starts_with("unknown namespace prefix") {
        UNDEFINED_PREFIX.to_string()
    } else if let Some(inner) = text.strip_prefix("error while evaluating function: ") {
        format!("Function error: {inner}")
    } else if text == "expression did not evaluate to a nodeset" {
        "Expression must select nodes".to_string()
    } else {
        text
    }
}

/// `OwnedPrefixedName { prefix: Some("p"), local_part: "x" }` to `p:x`
fn prefixed_name(debug: &str) -> String {
    let quoted = |key: &str| debug.split(key).nth(1).and_then(|rest| rest.split('"').nth(1));
    match (quoted("prefix: Some("), quoted("local_part: ")) {
        (Some(prefix), Some(local)) => format!("{prefix}:{local}"),
        (None, Some(local)) => local.to_string(),
        _ => debug.to_string(),
    }
}
