//! Export and import of the record list as a single JSON document.
//!
//! An import is checked in full before anything is applied: the document must carry
//! a `version` string and a `records` array whose every element parses.

use crate::{
    core::leave::LeaveRecord,
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A full backup of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Data version the export was written with
    pub version: String,
    /// When the export was taken
    pub timestamp: DateTime<Utc>,
    /// Every leave record, in store order
    pub records: Vec<LeaveRecord>,
    /// Opaque application settings carried alongside the records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
}

impl ExportDocument {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parses and validates an import document without applying it.
pub fn parse_import(raw: &str) -> Result<ExportDocument> {
    let mut document: Value = serde_json::from_str(raw).map_err(|e| Error::ImportFormat {
        message: format!("not valid JSON: {e}"),
    })?;

    let Some(fields) = document.as_object() else {
        return Err(Error::ImportFormat {
            message: "document must be a JSON object".to_string(),
        });
    };

    match fields.get("version") {
        Some(Value::String(_)) => {}
        Some(_) => {
            return Err(Error::ImportFormat {
                message: "`version` must be a string".to_string(),
            });
        }
        None => {
            return Err(Error::ImportFormat {
                message: "missing `version` field".to_string(),
            });
        }
    }

    match fields.get("records") {
        Some(Value::Array(_)) => {}
        Some(_) => {
            return Err(Error::ImportFormat {
                message: "`records` must be an array".to_string(),
            });
        }
        None => {
            return Err(Error::ImportFormat {
                message: "missing `records` field".to_string(),
            });
        }
    }

    // Older exports carried no timestamp; treat them as taken now.
    if !fields.contains_key("timestamp")
        && let Some(fields) = document.as_object_mut()
    {
        fields.insert("timestamp".to_string(), Value::String(Utc::now().to_rfc3339()));
    }

    serde_json::from_value(document).map_err(|e| Error::ImportFormat {
        message: format!("invalid record data: {e}"),
    })
}
