//! Table extraction algorithms
//!
//! - zip: every column selector runs over the whole document and the
//!   results are lined up by position
//! - record: a row selector finds anchor nodes and every column selector
//!   runs once per anchor
//! - table: literal `<table>` elements are read as grids

mod record_extractor;
mod table_extractor;
mod zip_extractor;

pub use record_extractor::*;
pub use table_extractor::*;
pub use zip_extractor::*;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::selector::Selector;

/// Column as configured by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnParam {
    /// Output column name
    #[serde(rename = "colname", default)]
    pub name: String,
    /// XPath selector source
    #[serde(rename = "colxpath", default)]
    pub selector: String,
}

impl ColumnParam {
    pub fn new(name: &str, selector: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
        }
    }
}

/// A validated column with its compiled selector
#[derive(Debug)]
pub struct ColumnSpec {
    pub name: String,
    pub selector: Selector,
}

/// Check column params and compile their selectors.
///
/// Names are checked before selectors, so a request with both an empty
/// name and a bad selector reports the name.
pub fn validate_columns(params: &[ColumnParam]) -> Result<Vec<ColumnSpec>, ConfigError> {
    if params.iter().any(|p| p.name.is_empty()) {
        return Err(ConfigError::MissingColumnName);
    }

    let mut seen = HashSet::new();
    for param in params {
        if !seen.insert(param.name.as_str()) {
            return Err(ConfigError::DuplicateColumnName(param.name.clone()));
        }
    }

    if params.iter().any(|p| p.selector.is_empty()) {
        return Err(ConfigError::MissingColumnSelector);
    }

    params
        .iter()
        .map(|param| {
            let selector =
                Selector::compile(&param.selector).map_err(|err| ConfigError::InvalidSelector {
                    column: param.name.clone(),
                    message: err.message,
                })?;
            Ok(ColumnSpec {
                name: param.name.clone(),
                selector,
            })
        })
        .collect()
}

/// Compile the row selector; an empty source means zip mode
pub fn validate_row_selector(source: &str) -> Result<Option<Selector>, ConfigError> {
    if source.is_empty() {
        return Ok(None);
    }
    Selector::compile(source)
        .map(Some)
        .map_err(|err| ConfigError::InvalidRowSelector {
            message: err.message,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_columns() {
        let specs = validate_columns(&[
            ColumnParam::new("Title", "//h1"),
            ColumnParam::new("Link", "//a/@href"),
        ])
        .unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[1].name, "Link");
        assert_eq!(specs[1].selector.source(), "//a/@href");
    }

    #[test]
    fn test_missing_name() {
        let err = validate_columns(&[
            ColumnParam::new("Title", "."),
            ColumnParam::new("", "p"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::MissingColumnName);
    }

    #[test]
    fn test_duplicate_name() {
        let err = validate_columns(&[
            ColumnParam::new("Title", "//a"),
            ColumnParam::new("Title", "//p"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateColumnName("Title".into()));
    }

    #[test]
    fn test_missing_selector() {
        let err = validate_columns(&[
            ColumnParam::new("Title", ""),
            ColumnParam::new("Description", "p"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::MissingColumnSelector);
    }

    #[test]
    fn test_invalid_selector_names_column() {
        let err = validate_columns(&[
            ColumnParam::new("Title", "totes not an xpath"),
            ColumnParam::new("Description", "p"),
        ])
        .unwrap_err();
        match err {
            ConfigError::InvalidSelector { column, .. } => assert_eq!(column, "Title"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_row_selector() {
        assert!(validate_row_selector("").unwrap().is_none());
        assert!(validate_row_selector("//li").unwrap().is_some());
        assert!(matches!(
            validate_row_selector("//li["),
            Err(ConfigError::InvalidRowSelector { .. })
        ));
    }
}
