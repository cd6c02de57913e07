//! Human-readable dumps of backend records for logs.

use serde::Serialize;

use crate::backend::Assignment;

/// Render an assignment, extensions included, as compact JSON.
pub fn dump_assignment(assignment: &Assignment) -> String {
    dump(assignment)
}

/// Render any record as compact JSON, or a marker if it cannot be encoded.
pub fn dump<T: Serialize + ?Sized>(record: &T) -> String {
    match serde_json::to_string(record) {
        Ok(json) => json,
        Err(e) => format!("<!MARSHAL_ERROR: {}>", e),
    }
}
