//! Record extraction: one row per anchor node

use sxd_xpath::Value;

use crate::document::Document;
use crate::error::{ColumnExtractionError, ExtractError};
use crate::selector::Selector;
use crate::table::{Cell, Column, ExtractedTable};
use crate::text::{select, Selected};

use super::ColumnSpec;

/// Find anchors with `row_selector`, then evaluate every column relative to
/// each anchor.
///
/// Multiple matches in one cell are joined with a single space. A cell with
/// no match is an empty string, not null: the row is known to exist.
pub fn extract_by_record(
    document: &Document,
    row_selector: &Selector,
    columns: &[ColumnSpec],
) -> Result<ExtractedTable, ExtractError> {
    let anchors = match row_selector.evaluate(document.root()) {
        Ok(Value::Nodeset(nodes)) => nodes.document_order(),
        Ok(_) => {
            return Err(ExtractError::RowExtraction(
                "Row selector must select nodes".to_string(),
            ))
        }
        Err(err) => return Err(ExtractError::RowExtraction(err.message)),
    };

    let mut extracted: Vec<Column> = columns
        .iter()
        .map(|spec| Column {
            name: spec.name.clone(),
            cells: Vec::with_capacity(anchors.len()),
        })
        .collect();

    for anchor in anchors {
        for (spec, column) in columns.iter().zip(extracted.iter_mut()) {
            let values = select(document, &spec.selector, anchor).map_err(|err| {
                ColumnExtractionError {
                    column: spec.name.clone(),
                    message: err.message,
                }
            })?;

            let cell = values
                .into_iter()
                .map(Selected::into_text)
                .collect::<Vec<_>>()
                .join(" ");
            column.cells.push(Cell::Text(cell));
        }
    }

    Ok(ExtractedTable::from_columns(extracted))
}
