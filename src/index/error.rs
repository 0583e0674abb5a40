/// Errors raised by the index structures when a caller breaks their contract.
///
/// Absent keys are never errors; lookups report them as `false` or `None`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndexError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid range [{left}, {right}) for length {len}")]
    InvalidRange { left: usize, right: usize, len: usize },

    #[error("Bloom filters have different sizes, probe counts or seeds")]
    IncompatibleFilters,
}

impl IndexError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        IndexError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
