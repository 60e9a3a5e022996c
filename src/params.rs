//! Request parameters and their migrations

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::DocumentKind;
use crate::extractors::ColumnParam;

/// How rows are found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Column XPath selectors, with an optional row selector
    #[default]
    Xpath,
    /// Literal `<table>` elements
    Table,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub method: Method,
    /// Empty for zip mode
    #[serde(rename = "rowxpath")]
    pub row_selector: String,
    #[serde(rename = "colselectors")]
    pub columns: Vec<ColumnParam>,
    /// 1-based index of the `<table>` to read in table mode
    #[serde(rename = "tablenum")]
    pub table_index: i64,
    pub kind: DocumentKind,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            method: Method::Xpath,
            row_selector: String::new(),
            columns: Vec::new(),
            table_index: 1,
            kind: DocumentKind::Html,
        }
    }
}

impl Params {
    /// Migrate stored params to the current version, then deserialize
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(migrate_params(value))
    }
}

/// Bring params saved by older versions up to date.
///
/// v0 had no `method` (it only did XPath) and carried a
/// `first_row_is_header` flag that no longer exists.
pub fn migrate_params(value: Value) -> Value {
    let Value::Object(mut params) = value else {
        return value;
    };

    if !params.contains_key("method") {
        tracing::debug!("migrating params from v0");
        params.insert("method".to_string(), Value::from("xpath"));
        params.insert("tablenum".to_string(), Value::from(1));
        params.remove("first_row_is_header");
    }

    Value::Object(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let params = Params::from_json(json!({
            "method": "xpath",
            "rowxpath": "//li",
            "colselectors": [
                {"colname": "Title", "colxpath": "h1"},
                {"colname": "Link", "colxpath": "a/@href"},
            ],
            "tablenum": 2,
        }))
        .unwrap();

        assert_eq!(params.method, Method::Xpath);
        assert_eq!(params.row_selector, "//li");
        assert_eq!(params.columns[1], ColumnParam::new("Link", "a/@href"));
        assert_eq!(params.table_index, 2);
        assert_eq!(params.kind, DocumentKind::Html);
    }

    #[test]
    fn test_defaults() {
        let params = Params::from_json(json!({"method": "table", "kind": "xml"})).unwrap();
        assert_eq!(params.method, Method::Table);
        assert_eq!(params.kind, DocumentKind::Xml);
        assert_eq!(params.table_index, 1);
        assert!(params.columns.is_empty());
        assert!(params.row_selector.is_empty());
    }

    #[test]
    fn test_missing_column_fields_default_to_empty() {
        let params = Params::from_json(json!({
            "method": "xpath",
            "colselectors": [{"colname": "Title"}],
        }))
        .unwrap();
        assert_eq!(params.columns[0].selector, "");
    }

    #[test]
    fn test_migrate_v0() {
        let migrated = migrate_params(json!({
            "colselectors": [{"colname": "A", "colxpath": "//a"}],
            "first_row_is_header": true,
        }));
        assert_eq!(
            migrated,
            json!({
                "method": "xpath",
                "tablenum": 1,
                "colselectors": [{"colname": "A", "colxpath": "//a"}],
            })
        );
    }

    #[test]
    fn test_migrate_current_is_untouched() {
        let current = json!({"method": "table", "tablenum": 3, "first_row_is_header": true});
        assert_eq!(migrate_params(current.clone()), current);
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        assert!(Params::from_json(json!({"method": "css"})).is_err());
    }
}
