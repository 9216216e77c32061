use thiserror::Error;

#[derive(Debug, Error)]
pub enum RdSapError {
    #[error("Request was considered invalid due to error: {0}")]
    InvalidRequest(#[from] anyhow::Error),
    #[error("Dwelling input could not be completed: {0}")]
    InvalidInput(#[from] InputError),
    #[error("Uncaught error while processing dwelling: {0}")]
    PanicInProcessing(String),
    #[error("Error writing output: {0}")]
    ErrorInOutput(anyhow::Error),
}

/// The single error kind raised while completing or reading a dwelling record: missing data with
/// no inference path, a value outside a lookup table's domain, an inconsistent combination of
/// fields, or a malformed enumeration.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{0}")]
pub struct InputError(String);

impl InputError {
    pub fn new(message: impl Into<String>) -> Self {
        InputError(message.into())
    }

    pub(crate) fn missing(field: &str) -> Self {
        Self::new(format!("{field} is required but was not provided"))
    }

    pub(crate) fn wrong_type(field: &str, expected: &str) -> Self {
        Self::new(format!("{field} was expected to be {expected}"))
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}
