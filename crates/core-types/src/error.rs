use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Malformed {record} record: missing required field '{field}'")]
    MalformedRecord {
        record: &'static str,
        field: &'static str,
    },
}

/// Unwraps a field read from a loosely-typed source (a nullable column, a
/// request body), rejecting the whole record when the field is absent.
pub fn require<T>(value: Option<T>, record: &'static str, field: &'static str) -> Result<T, CoreError> {
    value.ok_or(CoreError::MalformedRecord { record, field })
}
