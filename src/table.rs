//! Columnar output table

use serde::Serialize;

/// One cell of an extracted table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::Text(text.to_string())
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::Text(text)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Null, Into::into)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

/// Named columns that all have the same length
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ExtractedTable {
    columns: Vec<Column>,
}

impl ExtractedTable {
    /// Empty table with the given column names
    pub fn with_columns<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            columns: names
                .iter()
                .map(|name| Column {
                    name: name.as_ref().to_string(),
                    cells: Vec::new(),
                })
                .collect(),
        }
    }

    /// Build from columns of any lengths, padding short ones with nulls
    pub fn from_columns(mut columns: Vec<Column>) -> Self {
        let rows = columns.iter().map(|c| c.cells.len()).max().unwrap_or(0);
        for column in &mut columns {
            column.cells.resize(rows, Cell::Null);
        }
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.cells.len())
    }

    /// Append the rows of `other` below this table.
    ///
    /// Columns are matched by name. A column only one side has is kept and
    /// null-filled on the other side; new columns go to the right.
    pub fn append(&mut self, other: ExtractedTable) {
        let existing_rows = self.num_rows();
        let added_rows = other.num_rows();

        for column in other.columns {
            match self.columns.iter_mut().find(|c| c.name == column.name) {
                Some(target) => target.cells.extend(column.cells),
                None => {
                    let mut cells = vec![Cell::Null; existing_rows];
                    cells.extend(column.cells);
                    self.columns.push(Column {
                        name: column.name,
                        cells,
                    });
                }
            }
        }

        let total = existing_rows + added_rows;
        for column in &mut self.columns {
            column.cells.resize(total, Cell::Null);
        }
    }
}
