use thiserror::Error;

/// Failures raised by the feature deriver and by constraint construction.
///
/// Zero income is deliberately absent: ratios over it are stored as missing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("required column `{column}` is missing")]
    MissingField { column: String },

    #[error("row {row}: column `{column}` has invalid value `{value}`")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("invalid {field} range [{lower}, {upper}]: bounds must be finite and ordered")]
    InvalidRange {
        field: &'static str,
        lower: f64,
        upper: f64,
    },
}
