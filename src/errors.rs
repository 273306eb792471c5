use crate::config::ConfigError;
use crate::net::Response;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The service answered with a non-2xx status.
    #[error("HTTP {status} {status_text}{}", body_suffix(.body))]
    Http {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Decode error: {0}")]
    Decode(String),

    /// A request body could not be serialized; nothing was sent.
    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Cached session is corrupt: {0}")]
    CorruptCache(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(" - {body}")
    }
}

impl TrackerError {
    /// Builds an [`TrackerError::Http`] from a buffered non-success response.
    pub fn from_response(resp: &Response) -> Self {
        TrackerError::Http {
            status: resp.status,
            status_text: resp.status_text.clone(),
            body: resp.text(),
        }
    }

    /// Status code of an HTTP failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            TrackerError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TrackerError {
    fn from(e: reqwest::Error) -> Self {
        TrackerError::Network(e.to_string())
    }
}
