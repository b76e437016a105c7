use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Storage operation on key '{0}' failed ({1})")]
    Storage(String, String),

    #[error("Regulations endpoint or delete-API source ID is not configured")]
    MissingRegulationsConfig,

    #[error("Regulation API request failed ({0})")]
    Http(#[from] reqwest::Error),

    #[error("Regulation API response is missing the '{0}' field")]
    MalformedRegulationResponse(&'static str),

    #[error("Transport flush failed ({0})")]
    Flush(String),
}

impl Error {
    /// Wrap a backend-specific failure on `key` into an [`Error::Storage`].
    pub fn storage<K: AsRef<str>, E: fmt::Display>(key: K, e: E) -> Self {
        Error::Storage(key.as_ref().to_owned(), e.to_string())
    }

    pub fn flush<E: fmt::Display>(e: E) -> Self {
        Error::Flush(e.to_string())
    }
}
