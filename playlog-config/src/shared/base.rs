use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A field holds a value outside of its accepted range.
    #[error("Invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
    /// A required field is empty.
    #[error("`{0}` cannot be empty")]
    EmptyField(String),
    /// The store and the operational log would be written to the same file.
    #[error("`store.data_path` and `store.log_path` must point to different files")]
    StorePathsCollide,
}
