//! Multi-document runs
//!
//! Each input document is parsed and extracted on its own; the per-document
//! tables are stacked into one result. Configuration is checked once, up
//! front, before any document is touched.

use crate::document::{Document, DocumentKind};
use crate::error::{ConfigError, ExtractError};
use crate::extractors::{
    extract_by_record, extract_by_zip, extract_tables, validate_columns, validate_row_selector,
    ColumnParam, HtmlTable,
};
use crate::message::Message;
use crate::table::ExtractedTable;

/// One input document
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentInput<'a> {
    /// Markup text; `None` entries are skipped
    pub markup: Option<&'a str>,
    /// How messages refer to this document, e.g. its URL
    pub label: Option<&'a str>,
}

impl<'a> DocumentInput<'a> {
    pub fn new(markup: &'a str) -> Self {
        Self {
            markup: Some(markup),
            label: None,
        }
    }

    fn row_label(&self, position: usize) -> String {
        match self.label {
            Some(label) => label.to_string(),
            None => format!("row {position}"),
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub table: ExtractedTable,
    pub warnings: Vec<Message>,
}

/// Extract `columns` from every document with XPath selectors.
///
/// An empty `row_selector` selects zip mode, anything else record mode.
pub fn run(
    documents: &[DocumentInput<'_>],
    kind: DocumentKind,
    columns: &[ColumnParam],
    row_selector: &str,
) -> Result<Extraction, ExtractError> {
    let specs = validate_columns(columns)?;
    let row_selector = validate_row_selector(row_selector)?;

    let names: Vec<&str> = specs.iter().map(|spec| spec.name.as_str()).collect();
    let mut table = ExtractedTable::with_columns(&names);
    let mut first_mismatch: Option<usize> = None;
    let mut first_unparseable: Option<Message> = None;

    for (index, input) in documents.iter().enumerate() {
        let position = index + 1;
        let Some(markup) = input.markup else {
            continue;
        };

        let document = match Document::parse(markup, kind) {
            Ok(document) => document,
            Err(err) => {
                tracing::debug!(position, error = %err, "skipping unparseable document");
                first_unparseable.get_or_insert_with(|| {
                    Message::new("warning.unparseableDocument")
                        .param("row", position)
                        .param("error", err.to_string())
                });
                continue;
            }
        };

        let rows = match &row_selector {
            Some(row_selector) => extract_by_record(&document, row_selector, &specs)?,
            None => {
                let (rows, should_warn) = extract_by_zip(&document, &specs)?;
                if should_warn && first_mismatch.is_none() {
                    first_mismatch = Some(position);
                }
                rows
            }
        };

        tracing::debug!(position, rows = rows.num_rows(), "extracted document");
        table.append(rows);
    }

    let warnings = first_mismatch
        .map(|row| Message::new("warning.differentLengths").param("row", row))
        .into_iter()
        .chain(first_unparseable)
        .collect();

    Ok(Extraction { table, warnings })
}

/// Extract the `table_index`-th (1-based) `<table>` of every document.
///
/// A page without that table contributes no rows; the first such page is
/// reported as a warning, or as the error when no page had the table.
pub fn run_tables(
    documents: &[DocumentInput<'_>],
    table_index: i64,
) -> Result<Extraction, ExtractError> {
    if table_index < 1 {
        return Err(ConfigError::NonPositiveTableIndex.into());
    }
    let index = usize::try_from(table_index - 1).unwrap_or(usize::MAX);

    let mut table: Option<ExtractedTable> = None;
    let mut first_failure: Option<Message> = None;
    let mut first_rename: Option<Message> = None;

    for (i, input) in documents.iter().enumerate() {
        let Some(markup) = input.markup else {
            continue;
        };
        let row = input.row_label(i + 1);

        let mut tables = extract_tables(markup);
        if tables.is_empty() {
            first_failure.get_or_insert_with(|| Message::new("table.noTable").param("row", row));
            continue;
        }
        if index >= tables.len() {
            let n_tables = tables.len();
            first_failure.get_or_insert_with(|| {
                Message::new("table.indexTooBig")
                    .param("tablenum", table_index)
                    .param("n_tables", n_tables)
                    .param("row", row)
            });
            continue;
        }

        let HtmlTable { table: rows, renamed } = tables.swap_remove(index);
        if first_rename.is_none() {
            first_rename = renamed.first().map(|first| {
                Message::new("table.columnsRenamed")
                    .param("first", first.as_str())
                    .param("count", renamed.len())
            });
        }

        tracing::debug!(position = i + 1, rows = rows.num_rows(), "extracted table");
        table.get_or_insert_with(ExtractedTable::default).append(rows);
    }

    match (table, first_failure) {
        (Some(table), failure) => Ok(Extraction {
            table,
            warnings: failure.into_iter().chain(first_rename).collect(),
        }),
        (None, Some(failure)) => Err(ExtractError::NoTables(failure)),
        // No documents at all
        (None, None) => Ok(Extraction {
            table: ExtractedTable::default(),
            warnings: Vec::new(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    const DOC1: &str = r#"
        <!DOCTYPE html><html>
          <head>
            <meta charset="utf-16be">
            <title>Scrape me please</title>
            <link rel="stylesheet" href="/style.css"/>
            <script src="/script.js"></script>
          </head>
          <body>
            <h2>This is outside the l1</h2>
            <img src="/logo.png" alt="logo" />
            <ul>
                <li>
                    <h1>A title</h1>
                    <p>A description</p>
                </li>
                <li>
                    <h1>B title</h1>
                    <p>B description</p>
                </li>
            </ul>
          </body>"#;

    const DOC2: &str = r#"
        <!DOCTYPE html><html>
          <head>
            <title>Link scraping test</title>
          </head>
          <body>
            <ul>
                <li>
                    <h1>C title</h1>
                    <p>C description</p>
                    <p>D description</p>
                </li>
            </ul>
            <table>
                <tr>
                    <th>Name<th>
                    <th>link<th>
                </tr>
                <tr>
                    <td>Orange<td>
                    <td><a href='http://orange.com'>Orange link</a></td>
                </tr>
            </table>
          </body>"#;

    fn columns() -> Vec<ColumnParam> {
        vec![
            ColumnParam::new("Title", "//h1"),
            ColumnParam::new("Description", "//p"),
        ]
    }

    fn text_cells(values: &[Option<&str>]) -> Vec<Cell> {
        values.iter().map(|v| Cell::from(*v)).collect()
    }

    #[test]
    fn test_zip_unequal_lengths_warns_on_first_bad_document() {
        let docs = [DocumentInput::new(DOC1), DocumentInput::new(DOC2)];
        let out = run(&docs, DocumentKind::Html, &columns(), "").unwrap();

        assert_eq!(
            out.table.column("Title").unwrap().cells,
            text_cells(&[Some("A title"), Some("B title"), Some("C title"), None])
        );
        assert_eq!(
            out.table.column("Description").unwrap().cells,
            text_cells(&[
                Some("A description"),
                Some("B description"),
                Some("C description"),
                Some("D description"),
            ])
        );
        assert_eq!(
            out.warnings,
            vec![Message::new("warning.differentLengths").param("row", 2)]
        );
    }

    #[test]
    fn test_only_first_mismatch_is_reported() {
        let docs = [
            DocumentInput::new(DOC2),
            DocumentInput::new(DOC1),
            DocumentInput::new(DOC2),
        ];
        let out = run(&docs, DocumentKind::Html, &columns(), "").unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].params["row"], 1);
        assert_eq!(out.table.num_rows(), 6);
    }

    #[test]
    fn test_record_mode_across_documents() {
        let docs = [DocumentInput::new(DOC1), DocumentInput::new(DOC2)];
        let columns = vec![
            ColumnParam::new("Title", "h1"),
            ColumnParam::new("Description", "p"),
        ];
        let out = run(&docs, DocumentKind::Html, &columns, "//li").unwrap();

        assert!(out.warnings.is_empty());
        assert_eq!(
            out.table.column("Description").unwrap().cells,
            text_cells(&[
                Some("A description"),
                Some("B description"),
                Some("C description D description"),
            ])
        );
    }

    #[test]
    fn test_null_documents_are_skipped() {
        let docs = [
            DocumentInput::default(),
            DocumentInput::new("<h1>x</h1><p>y</p><p>z</p>"),
        ];
        let out = run(&docs, DocumentKind::Html, &columns(), "").unwrap();
        assert_eq!(out.table.num_rows(), 2);
        // Positions still count skipped entries
        assert_eq!(out.warnings[0].params["row"], 2);
    }

    #[test]
    fn test_no_documents_keeps_columns() {
        let out = run(&[], DocumentKind::Html, &columns(), "").unwrap();
        assert_eq!(out.table.num_rows(), 0);
        assert_eq!(out.table.column_names(), vec!["Title", "Description"]);
    }

    #[test]
    fn test_config_error_before_parsing() {
        // The document is not even XML, but the duplicate name wins
        let docs = [DocumentInput::new("<<not xml")];
        let dupes = vec![ColumnParam::new("A", "//a"), ColumnParam::new("A", "//b")];
        assert_eq!(
            run(&docs, DocumentKind::Xml, &dupes, "").unwrap_err(),
            ExtractError::Config(ConfigError::DuplicateColumnName("A".into()))
        );

        let err = run(&docs, DocumentKind::Html, &columns(), "//li[").unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Config(ConfigError::InvalidRowSelector { .. })
        ));
    }

    #[test]
    fn test_evaluation_error_aborts_run() {
        let docs = [DocumentInput::new("<p>foo</p>")];
        let columns = vec![ColumnParam::new("Title", "$nope")];
        match run(&docs, DocumentKind::Html, &columns, "") {
            Err(ExtractError::Column(err)) => assert_eq!(err.column, "Title"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_bad_markup_is_tolerated() {
        let docs = [
            DocumentInput::new("<a"),
            DocumentInput::new("<html><body>x</head></html>"),
        ];
        let columns = vec![ColumnParam::new("Body", "//body")];
        let out = run(&docs, DocumentKind::Html, &columns, "").unwrap();
        assert_eq!(
            out.table.column("Body").unwrap().cells,
            text_cells(&[Some(""), Some("x")])
        );
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_unparseable_xml_is_skipped_with_warning() {
        let docs = [
            DocumentInput::new("<a><b>x</b></a>"),
            DocumentInput::new("<a><b></a>"),
            DocumentInput::new("not xml at all"),
            DocumentInput::new("<a><b>y</b></a>"),
        ];
        let columns = vec![ColumnParam::new("B", "//b")];
        let out = run(&docs, DocumentKind::Xml, &columns, "").unwrap();
        assert_eq!(
            out.table.column("B").unwrap().cells,
            text_cells(&[Some("x"), Some("y")])
        );
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].code, "warning.unparseableDocument");
        assert_eq!(out.warnings[0].params["row"], 2);
    }

    #[test]
    fn test_undefined_namespace_prefix_aborts_run() {
        let docs = [DocumentInput::new("<p>foo</p>")];
        let columns = vec![ColumnParam::new("Title", "//badns:a")];
        let err = run(&docs, DocumentKind::Html, &columns, "").unwrap_err();
        assert_eq!(
            err.to_message(),
            Message::new("badXPath.eval")
                .param("colname", "Title")
                .param("error", "Undefined namespace prefix")
        );
    }

    #[test]
    fn test_rerun_is_identical() {
        let docs = [DocumentInput::new(DOC1), DocumentInput::new(DOC2)];
        let first = run(&docs, DocumentKind::Html, &columns(), "").unwrap();
        let second = run(&docs, DocumentKind::Html, &columns(), "").unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.table).unwrap(),
            serde_json::to_string(&second.table).unwrap()
        );
    }

    #[test]
    fn test_tables_column_union() {
        let docs = [
            DocumentInput::new("<table><tr><th>X</th></tr><tr><td>a</td></tr></table>"),
            DocumentInput::new(
                "<table><tr><th>X</th><th>Y</th></tr><tr><td>b</td><td>c</td></tr></table>",
            ),
        ];
        let out = run_tables(&docs, 1).unwrap();
        assert!(out.warnings.is_empty());
        assert_eq!(out.table.column_names(), vec!["X", "Y"]);
        assert_eq!(
            out.table.column("Y").unwrap().cells,
            text_cells(&[None, Some("c")])
        );
    }

    #[test]
    fn test_tables_first_failure_is_a_warning() {
        let docs = [
            DocumentInput::new("<table><tr><td>1</td></tr></table>"),
            DocumentInput {
                markup: Some("<p>no table</p>"),
                label: Some("http://example.com"),
            },
            DocumentInput::new("<p>none either</p>"),
        ];
        let out = run_tables(&docs, 1).unwrap();
        assert_eq!(out.table.num_rows(), 1);
        assert_eq!(
            out.warnings,
            vec![Message::new("table.noTable").param("row", "http://example.com")]
        );
    }

    #[test]
    fn test_tables_index_too_big_everywhere_is_an_error() {
        let docs = [DocumentInput::new("<table><tr><td>1</td></tr></table>")];
        assert_eq!(
            run_tables(&docs, 2).unwrap_err(),
            ExtractError::NoTables(
                Message::new("table.indexTooBig")
                    .param("tablenum", 2)
                    .param("n_tables", 1)
                    .param("row", "row 1")
            )
        );
    }

    #[test]
    fn test_tables_index_must_be_positive() {
        // Checked before the (missing) tables are looked for
        let docs = [DocumentInput::new("<p>no table</p>")];
        assert_eq!(
            run_tables(&docs, 0).unwrap_err(),
            ExtractError::Config(ConfigError::NonPositiveTableIndex)
        );
    }

    #[test]
    fn test_tables_rename_warning() {
        let docs = [DocumentInput::new(
            "<table><tr><th>A</th><th>A</th></tr><tr><td>1</td><td>2</td></tr></table>",
        )];
        let out = run_tables(&docs, 1).unwrap();
        assert_eq!(
            out.warnings,
            vec![Message::new("table.columnsRenamed")
                .param("first", "A 2")
                .param("count", 1)]
        );
    }
}
