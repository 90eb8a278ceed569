use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures internal to an engine adapter. Never propagated past the adapter
/// boundary: each adapter encodes these into `ScrapeOutput.error` plus a
/// status code before returning.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("ConnectionError: {0}")]
    Connect(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("{0} not set in environment")]
    MissingConfig(&'static str),
}

impl EngineError {
    /// Status code recorded on the `ScrapeOutput` when this error is encoded.
    pub fn status_code(&self) -> u16 {
        match self {
            EngineError::Timeout(_) => 408,
            EngineError::Connect(_) => 503,
            EngineError::Api { status, .. } => *status,
            _ => 500,
        }
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EngineError::Timeout(err.to_string())
        } else if err.is_connect() {
            EngineError::Connect(err.to_string())
        } else {
            EngineError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_class() {
        assert_eq!(EngineError::Timeout("t".into()).status_code(), 408);
        assert_eq!(EngineError::Connect("c".into()).status_code(), 503);
        assert_eq!(
            EngineError::Api {
                status: 429,
                message: "rate limited".into()
            }
            .status_code(),
            429
        );
        assert_eq!(EngineError::Parse("p".into()).status_code(), 500);
        assert_eq!(EngineError::Process("p".into()).status_code(), 500);
    }
}
