//! Schema-validated decode at the record-store boundary.
//!
//! Raw rows cross the [`super::RecordStore`] seam as `serde_json::Value`
//! and are decoded into typed records here, so shape mismatches surface
//! as [`DataError::Parse`] instead of undefined fields propagating
//! silently into the pipelines.

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::error::{DataError, DataResult};

/// Decode a batch of rows, skipping rows that fail.
///
/// A malformed row is scoped to itself: it is logged and excluded, never
/// fatal to the batch.
pub fn rows<T: DeserializeOwned>(table: &str, raw: Vec<JsonValue>) -> Vec<T> {
    let mut decoded = Vec::with_capacity(raw.len());
    for row in raw {
        match serde_json::from_value(row) {
            Ok(record) => decoded.push(record),
            Err(err) => {
                warn!(table, error = %err, "skipping malformed record");
            }
        }
    }
    decoded
}

/// Decode a required single row, propagating shape mismatches.
pub fn row<T: DeserializeOwned>(table: &str, raw: JsonValue) -> DataResult<T> {
    serde_json::from_value(raw).map_err(|err| DataError::parse(table, err))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pet {
        name: String,
        legs: u8,
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let raw = vec![
            json!({"name": "Rex", "legs": 4}),
            json!({"name": "Blob"}),
            json!({"name": "Tripod", "legs": 3}),
        ];

        let pets: Vec<Pet> = rows("pets", raw);
        assert_eq!(pets.len(), 2);
        assert_eq!(pets[0].name, "Rex");
        assert_eq!(pets[1].legs, 3);
    }

    #[test]
    fn required_row_propagates_parse_error() {
        let err = row::<Pet>("pets", json!({"legs": 4})).unwrap_err();
        assert!(matches!(err, DataError::Parse { ref table, .. } if table == "pets"));
    }
}
