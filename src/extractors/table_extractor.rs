//! `<table>` extraction
//!
//! Reads literal HTML tables into grids, expanding `rowspan`/`colspan`,
//! flattening multi-row headers into single column names and turning
//! all-numeric columns into numbers.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};

use crate::table::{Cell, Column, ExtractedTable};

/// Span values are clamped to this to bound the grid size
const MAX_SPAN: usize = 1000;

/// Joins header texts of stacked header rows
const HEADER_SEPARATOR: &str = " - ";

/// One table read from a page
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlTable {
    pub table: ExtractedTable,
    /// Column names that had to be made unique, after renaming
    pub renamed: Vec<String>,
}

struct RowSource<'a> {
    element: ElementRef<'a>,
    in_head: bool,
    all_th: bool,
}

/// Read every `<table>` on the page, in document order
pub fn extract_tables(html: &str) -> Vec<HtmlTable> {
    let document = Html::parse_document(html);

    let selector = match Selector::parse("table") {
        Ok(s) => s,
        Err(_) => return vec![],
    };

    document.select(&selector).map(read_table).collect()
}

fn read_table(table: ElementRef<'_>) -> HtmlTable {
    let sources = table_rows(table);
    let grid = expand_spans(&sources);

    // Header rows: the <thead>, or else leading rows made only of <th>
    let has_head = sources.iter().any(|row| row.in_head);
    let leading_th = sources.iter().take_while(|row| row.all_th).count();
    let is_header: Vec<bool> = sources
        .iter()
        .enumerate()
        .map(|(i, row)| if has_head { row.in_head } else { i < leading_th })
        .collect();

    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    let (header_rows, data_rows): (Vec<_>, Vec<_>) = grid
        .iter()
        .zip(&is_header)
        .partition(|(_, header)| **header);
    let header_rows: Vec<&Vec<Option<String>>> =
        header_rows.into_iter().map(|(row, _)| row).collect();
    let data_rows: Vec<&Vec<Option<String>>> =
        data_rows.into_iter().map(|(row, _)| row).collect();

    let names = (0..width).map(|col| header_name(&header_rows, col)).collect();
    let (names, renamed) = dedupe_names(names);

    let columns = names
        .into_iter()
        .enumerate()
        .map(|(col, name)| {
            let cells = data_rows
                .iter()
                .map(|row| match row.get(col) {
                    Some(Some(text)) => Cell::Text(text.clone()),
                    _ => Cell::Null,
                })
                .collect();
            Column {
                name,
                cells: coerce_numeric(cells),
            }
        })
        .collect();

    HtmlTable {
        table: ExtractedTable::from_columns(columns),
        renamed,
    }
}

/// `tr` elements of this table, skipping rows of nested tables
fn table_rows(table: ElementRef<'_>) -> Vec<RowSource<'_>> {
    let mut rows = Vec::new();

    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(row_source(child, false)),
            section @ ("thead" | "tbody" | "tfoot") => {
                let in_head = section == "thead";
                for row in child.children().filter_map(ElementRef::wrap) {
                    if row.value().name() == "tr" {
                        rows.push(row_source(row, in_head));
                    }
                }
            }
            _ => {}
        }
    }
    rows
}

fn row_source(element: ElementRef<'_>, in_head: bool) -> RowSource<'_> {
    let mut cells = row_cells(element).peekable();
    let all_th = cells.peek().is_some() && cells.all(|c| c.value().name() == "th");
    RowSource {
        element,
        in_head,
        all_th,
    }
}

fn row_cells<'a>(row: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
}

/// Lay cells out on a grid, repeating spanned cells in every slot they cover
fn expand_spans(rows: &[RowSource<'_>]) -> Vec<Vec<Option<String>>> {
    // Per column: rows still covered by a rowspan above, and its text
    let mut carried: Vec<(usize, String)> = Vec::new();
    let mut grid = Vec::with_capacity(rows.len());

    for row in rows {
        let mut out: Vec<Option<String>> = Vec::new();
        let mut cells = row_cells(row.element);
        let mut col = 0;

        loop {
            if let Some((remaining, text)) = carried.get_mut(col).filter(|(n, _)| *n > 0) {
                *remaining -= 1;
                out.push(Some(text.clone()));
                col += 1;
                continue;
            }

            let Some(cell) = cells.next() else { break };
            let text = cell_text(cell);
            let colspan = span(cell, "colspan");
            let rowspan = span(cell, "rowspan");

            for _ in 0..colspan {
                if carried.len() <= col {
                    carried.resize(col + 1, (0, String::new()));
                }
                carried[col] = (rowspan - 1, text.clone());
                out.push(Some(text.clone()));
                col += 1;
            }
        }

        // Rowspans reaching past this row's last cell
        while col < carried.len() {
            match &mut carried[col] {
                (remaining, text) if *remaining > 0 => {
                    *remaining -= 1;
                    out.push(Some(text.clone()));
                }
                _ => out.push(None),
            }
            col += 1;
        }
        while matches!(out.last(), Some(None)) {
            out.pop();
        }

        grid.push(out);
    }

    grid
}

fn span(cell: ElementRef<'_>, attr: &str) -> usize {
    cell.value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_SPAN)
}

fn cell_text(cell: ElementRef<'_>) -> String {
    let text = cell.text().collect::<String>();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// "Outer - Inner" from stacked header rows; repeats from spans collapse
fn header_name(header_rows: &[&Vec<Option<String>>], col: usize) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for row in header_rows {
        if let Some(Some(text)) = row.get(col) {
            if !text.is_empty() && parts.last() != Some(&text.as_str()) {
                parts.push(text);
            }
        }
    }

    if parts.is_empty() {
        format!("Column {}", col + 1)
    } else {
        parts.join(HEADER_SEPARATOR)
    }
}

/// Make names unique by suffixing " 2", " 3", ...
fn dedupe_names(names: Vec<String>) -> (Vec<String>, Vec<String>) {
    let mut used: HashSet<String> = HashSet::new();
    let mut renamed = Vec::new();
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        if used.insert(name.clone()) {
            out.push(name);
            continue;
        }
        let mut n = 2;
        let unique = loop {
            let candidate = format!("{name} {n}");
            if !used.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        used.insert(unique.clone());
        renamed.push(unique.clone());
        out.push(unique);
    }

    (out, renamed)
}

/// Numbers when every non-empty value parses as one; empty cells become null
fn coerce_numeric(cells: Vec<Cell>) -> Vec<Cell> {
    let parsed: Vec<Option<f64>> = cells
        .iter()
        .filter_map(|cell| match cell {
            Cell::Text(text) if !text.is_empty() => Some(parse_number(text)),
            _ => None,
        })
        .collect();
    if parsed.is_empty() || parsed.iter().any(Option::is_none) {
        return cells;
    }

    cells
        .into_iter()
        .map(|cell| match cell {
            Cell::Text(text) => parse_number(&text).map_or(Cell::Null, Cell::Number),
            other => other,
        })
        .collect()
}

fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if !text.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    text.replace(',', "").parse::<f64>().ok()
}
