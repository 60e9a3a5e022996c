//! XPath table extraction for HTML and XML documents
//!
//! Turns a batch of documents into one columnar table:
//! - zip mode: each column is an XPath over the whole document
//! - record mode: a row XPath picks anchors, columns are relative to them
//! - table mode: literal `<table>` elements are read as grids
//!
//! Results come back with structured warnings and errors (see [`message`])
//! that the host localizes. A C ABI is exposed in [`ffi`].

pub mod aggregate;
pub mod document;
pub mod error;
pub mod extractors;
pub mod ffi;
pub mod message;
pub mod params;
pub mod render;
pub mod selector;
pub mod table;
pub mod text;

pub use aggregate::{run, run_tables, DocumentInput, Extraction};
pub use document::{Document, DocumentKind};
pub use error::*;
pub use extractors::ColumnParam;
pub use message::Message;
pub use params::{migrate_params, Method, Params};
pub use render::{render, InputTable, RenderResult};
pub use table::{Cell, ExtractedTable};
