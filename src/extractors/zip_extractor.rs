//! Zip extraction: independent columns lined up by position

use crate::document::Document;
use crate::error::ColumnExtractionError;
use crate::table::{Cell, Column, ExtractedTable};
use crate::text::{select, Selected};

use super::ColumnSpec;

/// Run every column selector over the whole document and zip the results.
///
/// Short columns are padded with nulls. The flag is true when the columns
/// had different lengths, which usually means the rows don't line up.
pub fn extract_by_zip(
    document: &Document,
    columns: &[ColumnSpec],
) -> Result<(ExtractedTable, bool), ColumnExtractionError> {
    let mut extracted = Vec::with_capacity(columns.len());

    for spec in columns {
        let values = select(document, &spec.selector, document.root()).map_err(|err| {
            ColumnExtractionError {
                column: spec.name.clone(),
                message: err.message,
            }
        })?;

        let cells = values
            .into_iter()
            .map(|value| match value {
                Selected::Text(text) => Cell::Text(text),
                Selected::Number(n) => Cell::Number(n),
            })
            .collect();

        extracted.push(Column {
            name: spec.name.clone(),
            cells,
        });
    }

    let should_warn = extracted
        .windows(2)
        .any(|pair| pair[0].cells.len() != pair[1].cells.len());

    Ok((ExtractedTable::from_columns(extracted), should_warn))
}
