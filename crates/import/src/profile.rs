use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tally_core::BankColumnType;

use crate::ImportError;

/// User-assigned column semantics for a bank export, keyed by header name.
///
/// ```toml
/// [columns]
/// Amount = "outflow"
/// Credit = "inflow"
/// ```
///
/// Unmapped columns default to `other`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnProfile {
    #[serde(default)]
    pub columns: BTreeMap<String, BankColumnType>,
}

impl ColumnProfile {
    pub fn from_toml(content: &str) -> Result<Self, ImportError> {
        toml::from_str(content).map_err(|e| ImportError::InvalidProfile(e.to_string()))
    }

    /// Align the profile with a parsed header, producing one column type per
    /// column name.
    pub fn resolve(&self, column_names: &[String]) -> Vec<BankColumnType> {
        column_names
            .iter()
            .map(|name| self.columns.get(name).copied().unwrap_or_default())
            .collect()
    }
}
