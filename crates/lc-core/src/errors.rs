use std::error::Error as StdError;

use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A region code with no entry in the region directory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Region '{0}' is not supported")]
pub struct RegionNotSupported(pub String);

/// Malformed payload, always chained to the underlying cause
#[derive(Error, Debug)]
#[error("Failed to parse {what}")]
pub struct ParseError {
    what: String,
    #[source]
    source: BoxError,
}

impl ParseError {
    pub fn new(what: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            what: what.into(),
            source: source.into(),
        }
    }

    /// A required field was absent from an otherwise well-formed payload
    pub fn missing(what: impl Into<String>, field: &str) -> Self {
        Self::new(what, MissingField(field.to_string()))
    }

    /// What was being parsed when the failure happened
    pub fn what(&self) -> &str {
        &self.what
    }
}

#[derive(Error, Debug)]
#[error("missing field '{0}'")]
struct MissingField(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_keeps_source_chain() {
        let err = ParseError::missing("redirect fragment", "access_token");

        assert_eq!(err.what(), "redirect fragment");
        let source = err.source().expect("source is chained");
        assert_eq!(source.to_string(), "missing field 'access_token'");
    }
}
