//! Structured messages returned to the host
//!
//! Messages carry a machine-readable code and interpolation parameters
//! instead of rendered text, so the host can localize them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One error or warning for the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub code: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quick_fixes: Vec<QuickFix>,
}

/// A corrective action the host can offer next to a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickFix {
    /// Code of the button label
    pub text: String,
    #[serde(flatten)]
    pub action: QuickFixAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "args", rename_all = "camelCase")]
pub enum QuickFixAction {
    /// Insert a step before the current one
    PrependModule { module: String },
}

impl Message {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            params: BTreeMap::new(),
            quick_fixes: Vec::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn quick_fix(mut self, fix: QuickFix) -> Self {
        self.quick_fixes.push(fix);
        self
    }
}
