//! Error types for parsing, selector compilation and extraction

use thiserror::Error;

use crate::message::Message;

/// Markup that the parser could not turn into a tree
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("XML document has no root element")]
    NoRootElement,
}

/// Selector source that is not a well-formed XPath expression
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid XPath syntax in {selector:?}: {message}")]
pub struct SelectorSyntaxError {
    pub selector: String,
    pub message: String,
}

/// A well-formed selector that failed while running against a tree
#[derive(Error, Debug, Clone, PartialEq)]
#[error("XPath error in {selector:?}: {message}")]
pub struct EvaluationError {
    pub selector: String,
    pub message: String,
}

/// A column selector that failed against one specific document
#[derive(Error, Debug, Clone, PartialEq)]
#[error("XPath error for column \"{column}\": {message}")]
pub struct ColumnExtractionError {
    pub column: String,
    pub message: String,
}

/// Invalid request parameters, detected before any document is processed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing column name")]
    MissingColumnName,

    #[error("Duplicate column name \"{0}\"")]
    DuplicateColumnName(String),

    #[error("Missing column selector")]
    MissingColumnSelector,

    #[error("Invalid XPath syntax for column \"{column}\": {message}")]
    InvalidSelector { column: String, message: String },

    #[error("Invalid XPath syntax for row selector: {message}")]
    InvalidRowSelector { message: String },

    #[error("Table number must be at least 1")]
    NonPositiveTableIndex,
}

/// Everything that can stop an extraction run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Column(#[from] ColumnExtractionError),

    #[error("XPath error for row selector: {0}")]
    RowExtraction(String),

    /// Table mode: no document produced the requested table.
    /// Carries the first per-page failure.
    #[error("no table extracted: {}", .0.code)]
    NoTables(Message),
}

impl ExtractError {
    /// Structured form for the host to localize
    pub fn to_message(&self) -> Message {
        match self {
            ExtractError::Config(err) => match err {
                ConfigError::MissingColumnName => Message::new("badParam.colname.missing"),
                ConfigError::DuplicateColumnName(name) => {
                    Message::new("badParam.colname.duplicate").param("colname", name.as_str())
                }
                ConfigError::MissingColumnSelector => Message::new("badParam.colxpath.missing"),
                ConfigError::InvalidSelector { column, message } => {
                    Message::new("badParam.colxpath.invalid")
                        .param("colname", column.as_str())
                        .param("error", message.as_str())
                }
                ConfigError::InvalidRowSelector { message } => {
                    Message::new("badParam.rowxpath.invalid").param("error", message.as_str())
                }
                ConfigError::NonPositiveTableIndex => Message::new("badParam.tablenum.tooSmall"),
            },
            ExtractError::Column(err) => Message::new("badXPath.eval")
                .param("colname", err.column.as_str())
                .param("error", err.message.as_str()),
            ExtractError::RowExtraction(message) => {
                Message::new("badXPath.evalRow").param("error", message.as_str())
            }
            ExtractError::NoTables(message) => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_user_facing_text() {
        assert_eq!(
            ConfigError::DuplicateColumnName("Title".into()).to_string(),
            "Duplicate column name \"Title\""
        );
        let err = ColumnExtractionError {
            column: "Title".into(),
            message: "Undefined variable".into(),
        };
        assert_eq!(
            ExtractError::from(err).to_string(),
            "XPath error for column \"Title\": Undefined variable"
        );
    }

    #[test]
    fn test_to_message_codes() {
        let msg = ExtractError::from(ConfigError::InvalidSelector {
            column: "Title".into(),
            message: "bad".into(),
        })
        .to_message();
        assert_eq!(msg.code, "badParam.colxpath.invalid");
        assert_eq!(msg.params["colname"], "Title");
        assert_eq!(msg.params["error"], "bad");

        let msg = ExtractError::from(ConfigError::MissingColumnName).to_message();
        assert_eq!(msg.code, "badParam.colname.missing");
        assert!(msg.params.is_empty());
    }
}
