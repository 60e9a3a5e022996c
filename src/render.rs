//! Host-facing entry point: input table + params in, table + messages out

use serde::{Deserialize, Serialize};

use crate::aggregate::{run, run_tables, DocumentInput, Extraction};
use crate::message::{Message, QuickFix, QuickFixAction};
use crate::params::{Method, Params};
use crate::table::{Cell, Column, ExtractedTable};

/// Column holding the markup of each document
pub const HTML_COLUMN: &str = "html";
/// Optional column naming each document in messages
pub const URL_COLUMN: &str = "url";

/// Table the host feeds in, typically produced by a URL scraper step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputTable {
    pub columns: Vec<InputColumn>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputColumn {
    pub name: String,
    pub values: Vec<Option<String>>,
}

impl InputTable {
    pub fn column(&self, name: &str) -> Option<&InputColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl From<&InputTable> for ExtractedTable {
    fn from(input: &InputTable) -> Self {
        ExtractedTable::from_columns(
            input
                .columns
                .iter()
                .map(|column| Column {
                    name: column.name.clone(),
                    cells: column.values.iter().cloned().map(Cell::from).collect(),
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderResult {
    /// `None` on error
    pub table: Option<ExtractedTable>,
    pub messages: Vec<Message>,
}

impl RenderResult {
    fn error(message: Message) -> Self {
        Self {
            table: None,
            messages: vec![message],
        }
    }
}

impl From<Extraction> for RenderResult {
    fn from(extraction: Extraction) -> Self {
        Self {
            table: Some(extraction.table),
            messages: extraction.warnings,
        }
    }
}

fn missing_html_column() -> Message {
    Message::new("error.missingHtmlColumn").quick_fix(QuickFix {
        text: "quickFix.addHtmlScraper".to_string(),
        action: QuickFixAction::PrependModule {
            module: "urlscraper".to_string(),
        },
    })
}

/// Run one extraction request.
///
/// Never fails: every problem becomes a message next to an empty result.
/// With no column selectors yet, the input table is passed through.
pub fn render(input: &InputTable, params: &Params) -> RenderResult {
    let Some(html) = input.column(HTML_COLUMN) else {
        return RenderResult::error(missing_html_column());
    };

    if params.method == Method::Xpath && params.columns.is_empty() {
        return RenderResult {
            table: Some(input.into()),
            messages: Vec::new(),
        };
    }

    let urls = input.column(URL_COLUMN);
    let documents: Vec<DocumentInput<'_>> = html
        .values
        .iter()
        .enumerate()
        .map(|(i, markup)| DocumentInput {
            markup: markup.as_deref(),
            label: urls
                .and_then(|column| column.values.get(i))
                .and_then(|url| url.as_deref()),
        })
        .collect();

    tracing::debug!(
        method = ?params.method,
        documents = documents.len(),
        "rendering"
    );

    let result = match params.method {
        Method::Xpath => run(
            &documents,
            params.kind,
            &params.columns,
            &params.row_selector,
        ),
        Method::Table => run_tables(&documents, params.table_index),
    };

    match result {
        Ok(extraction) => extraction.into(),
        Err(err) => {
            tracing::debug!(error = %err, "extraction failed");
            RenderResult::error(err.to_message())
        }
    }
}
