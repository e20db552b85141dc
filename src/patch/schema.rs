//! Parse-or-reject boundary between untyped payloads and [`Patch`].
//!
//! Every field is checked for presence and primitive type; nothing is coerced.

use crate::core::error::{PatchWardenError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const APPROVED: &str = "approved";

/// A single proposed line-range replacement in one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    pub status: String,
    pub rule_id: String,
    pub file_path: String,
    /// 1-indexed, inclusive
    pub line_start: i64,
    /// 1-indexed, inclusive
    pub line_end: i64,
    pub new_code: String,
    #[serde(default)]
    pub explanation: String,
}

impl Patch {
    pub fn is_approved(&self) -> bool {
        self.status == APPROVED
    }

    /// Number of lines in `[line_start, line_end]`, negative for an inverted range.
    /// Widened so arbitrary `i64` bounds cannot overflow.
    pub fn span(&self) -> i128 {
        i128::from(self.line_end) - i128::from(self.line_start) + 1
    }
}

fn required<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a Value> {
    object
        .get(key)
        .ok_or_else(|| PatchWardenError::malformed(format!("missing field '{key}'")))
}

fn required_str(object: &Map<String, Value>, key: &str) -> Result<String> {
    required(object, key)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| PatchWardenError::malformed(format!("field '{key}' must be a string")))
}

fn required_integer(object: &Map<String, Value>, key: &str) -> Result<i64> {
    required(object, key)?
        .as_i64()
        .ok_or_else(|| PatchWardenError::malformed(format!("field '{key}' must be an integer")))
}

/// Convert an untyped payload into a [`Patch`], or say why it is not one
pub fn parse_patch(raw: &Value) -> Result<Patch> {
    let object = raw
        .as_object()
        .ok_or_else(|| PatchWardenError::malformed("payload is not an object"))?;

    let explanation = match object.get("explanation") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(PatchWardenError::malformed(
                "field 'explanation' must be a string",
            ))
        }
    };

    Ok(Patch {
        status: required_str(object, "status")?,
        rule_id: required_str(object, "rule_id")?,
        file_path: required_str(object, "file_path")?,
        line_start: required_integer(object, "line_start")?,
        line_end: required_integer(object, "line_end")?,
        new_code: required_str(object, "new_code")?,
        explanation,
    })
}

/// [`parse_patch`] with the reason discarded
pub fn validate_patch_schema(raw: &Value) -> Option<Patch> {
    match parse_patch(raw) {
        Ok(patch) => Some(patch),
        Err(e) => {
            log::debug!("Schema rejected payload: {e}");
            None
        }
    }
}

/// Flatten a payload document into raw patch values, in document order.
///
/// Accepts a single patch object, an array of patches, or a scan report of the
/// form `{ "issues": [{ "id": ..., "patches": [...] }] }`. Entries are not
/// validated here.
pub fn load_payloads(document: &Value) -> Result<Vec<Value>> {
    match document {
        Value::Array(items) => Ok(items.clone()),
        Value::Object(object) => match object.get("issues") {
            Some(Value::Array(issues)) => {
                let mut patches = Vec::new();
                for issue in issues {
                    match issue.get("patches") {
                        Some(Value::Array(items)) => patches.extend(items.iter().cloned()),
                        Some(_) => {
                            return Err(PatchWardenError::malformed(
                                "issue 'patches' must be an array",
                            ))
                        }
                        None => {}
                    }
                }
                Ok(patches)
            }
            Some(_) => Err(PatchWardenError::malformed("'issues' must be an array")),
            None => Ok(vec![document.clone()]),
        },
        _ => Err(PatchWardenError::malformed(
            "payload must be a patch, an array of patches or a scan report",
        )),
    }
}
