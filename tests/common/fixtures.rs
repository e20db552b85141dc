//! Test data and predefined scenarios

#![allow(dead_code)]

use serde_json::{json, Value};

/// Ten numbered lines with a trailing newline
pub const TEN_LINE_FILE: &str = "l1\nl2\nl3\nl4\nl5\nl6\nl7\nl8\nl9\nl10\n";

/// An approved patch payload relative to the workspace root
pub fn approved_patch(file: &str, line_start: i64, line_end: i64, new_code: &str) -> Value {
    json!({
        "status": "approved",
        "rule_id": "PY-SEC-001",
        "file_path": file,
        "line_start": line_start,
        "line_end": line_end,
        "new_code": new_code,
        "explanation": "replace unsafe call",
    })
}

/// A scan report wrapping the given patches in one issue
pub fn scan_report(patches: Vec<Value>) -> Value {
    json!({
        "issues": [
            { "id": "issue-1", "severity": "high", "issue": "unsafe call", "patches": patches }
        ]
    })
}
