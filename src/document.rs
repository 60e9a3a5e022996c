//! Markup parsing
//!
//! HTML goes through scraper (html5ever), which repairs malformed markup the
//! way browsers do. XML goes through quick-xml. Both end up in one
//! sxd-document package, so selectors see a single tree representation.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Serialize};
use sxd_document::{dom, Package, QName};
use sxd_xpath::nodeset;

use crate::error::ParseError;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// How markup text is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    #[default]
    Html,
    Xml,
}

/// A parsed document, owned by one extraction call
pub struct Document {
    package: Package,
    kind: DocumentKind,
}

impl Document {
    pub fn parse(text: &str, kind: DocumentKind) -> Result<Self, ParseError> {
        let package = Package::new();
        match kind {
            DocumentKind::Html => build_html(&package.as_document(), text),
            DocumentKind::Xml => build_xml(&package.as_document(), text)?,
        }
        Ok(Self { package, kind })
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Document root, the context node for top-level selectors
    pub fn root(&self) -> nodeset::Node<'_> {
        self.package.as_document().root().into()
    }
}

fn build_html(doc: &dom::Document<'_>, text: &str) {
    let html = Html::parse_document(text);

    // html5ever reports every repair it made; none of them matter to callers
    if !html.errors.is_empty() {
        tracing::trace!(count = html.errors.len(), "discarded HTML parse errors");
    }

    let root = doc.root();
    let mut pending = Vec::new();
    for child in html.tree.root().children() {
        match child.value() {
            Node::Element(_) => {
                if let Some(source) = ElementRef::wrap(child) {
                    let element = create_html_element(doc, source.value());
                    root.append_child(element);
                    pending.push((source, element));
                }
            }
            Node::Comment(comment) => root.append_child(doc.create_comment(&**comment)),
            _ => {}
        }
    }

    // Iterative so that absurdly deep markup cannot overflow the stack
    while let Some((source, target)) = pending.pop() {
        for child in source.children() {
            match child.value() {
                Node::Element(_) => {
                    if let Some(source) = ElementRef::wrap(child) {
                        let element = create_html_element(doc, source.value());
                        target.append_child(element);
                        pending.push((source, element));
                    }
                }
                Node::Text(text) => target.append_child(doc.create_text(&**text)),
                Node::Comment(comment) => target.append_child(doc.create_comment(&**comment)),
                _ => {}
            }
        }
    }
}

fn create_html_element<'d>(
    doc: &dom::Document<'d>,
    source: &scraper::node::Element,
) -> dom::Element<'d> {
    // HTML elements get no namespace; SVG and MathML keep theirs
    let namespace: &str = &source.name.ns;
    let element = if namespace.is_empty() || namespace == HTML_NAMESPACE {
        doc.create_element(source.name())
    } else {
        doc.create_element(QName::with_namespace_uri(Some(namespace), source.name()))
    };

    for (name, value) in source.attrs() {
        if name == "xmlns" || name.starts_with("xmlns:") {
            continue;
        }
        element.set_attribute_value(name, value);
    }

    element
}

fn build_xml(doc: &dom::Document<'_>, text: &str) -> Result<(), ParseError> {
    // quick-xml never loads DTDs and only expands predefined and character
    // references, so external entities cannot be reached from here
    let mut reader = NsReader::from_str(text);

    let mut open: Vec<dom::Element<'_>> = Vec::new();
    let mut has_root = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                let element = create_xml_element(doc, &reader, &e)?;
                attach(doc, &open, &mut has_root, element)?;
                open.push(element);
            }
            Event::Empty(e) => {
                let element = create_xml_element(doc, &reader, &e)?;
                attach(doc, &open, &mut has_root, element)?;
            }
            Event::End(_) => {
                open.pop();
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(xml_error)?;
                match open.last() {
                    Some(parent) => parent.append_child(doc.create_text(&text)),
                    None if text.trim().is_empty() => {}
                    None => return Err(ParseError::Xml("text outside the root element".into())),
                }
            }
            Event::CData(e) => {
                if let Some(parent) = open.last() {
                    parent.append_child(doc.create_text(&String::from_utf8_lossy(&e)));
                }
            }
            Event::Comment(e) => {
                let comment = doc.create_comment(&String::from_utf8_lossy(&e));
                match open.last() {
                    Some(parent) => parent.append_child(comment),
                    None => doc.root().append_child(comment),
                }
            }
            Event::Eof => break,
            // Declarations, doctypes and processing instructions
            _ => {}
        }
    }

    if let Some(element) = open.last() {
        return Err(ParseError::Xml(format!(
            "unclosed element <{}>",
            element.name().local_part()
        )));
    }
    if !has_root {
        return Err(ParseError::NoRootElement);
    }
    Ok(())
}

fn create_xml_element<'d>(
    doc: &dom::Document<'d>,
    reader: &NsReader<&[u8]>,
    start: &BytesStart<'_>,
) -> Result<dom::Element<'d>, ParseError> {
    let (ns, local) = reader.resolve_element(start.name());
    let local = String::from_utf8_lossy(local.as_ref()).into_owned();
    let element = match namespace_uri(ns)? {
        Some(uri) => doc.create_element(QName::with_namespace_uri(Some(uri.as_str()), &local)),
        None => doc.create_element(local.as_str()),
    };

    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (ns, local) = reader.resolve_attribute(attr.key);
        let local = String::from_utf8_lossy(local.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_error)?;
        match namespace_uri(ns)? {
            Some(uri) => element.set_attribute_value(
                QName::with_namespace_uri(Some(uri.as_str()), &local),
                &value,
            ),
            None => element.set_attribute_value(local.as_str(), &value),
        };
    }

    Ok(element)
}

fn attach<'d>(
    doc: &dom::Document<'d>,
    open: &[dom::Element<'d>],
    has_root: &mut bool,
    element: dom::Element<'d>,
) -> Result<(), ParseError> {
    match open.last() {
        Some(parent) => parent.append_child(element),
        None if *has_root => {
            return Err(ParseError::Xml("content after the root element".into()));
        }
        None => {
            doc.root().append_child(element);
            *has_root = true;
        }
    }
    Ok(())
}

fn namespace_uri(resolved: ResolveResult<'_>) -> Result<Option<String>, ParseError> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8_lossy(ns.as_ref()).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(ParseError::Xml(format!(
            "unknown namespace prefix {:?}",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn xml_error(err: impl std::fmt::Display) -> ParseError {
    ParseError::Xml(err.to_string())
}
