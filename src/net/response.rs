//! Minimal HTTP response model.
//!
//! This struct represents a **fully buffered** HTTP response returned by the
//! network layer. It contains the final URL, status code + reason and the raw
//! body bytes.
//!
//! ## Notes
//! - The body is stored as raw `Vec<u8>`. Use [`Response::text`] for a lossy
//!   string view and [`Response::json`] to decode a typed payload.
//! - `status_text` is derived from the status code's canonical reason phrase
//!   and is `"Unknown"` for non-standard codes.
//!
use serde::de::DeserializeOwned;

use crate::errors::TrackerError;

/// Simple structure for HTTP responses.
#[derive(Debug)]
pub struct Response {
    /// Final URL of the response (after redirects, if any).
    pub url: url::Url,

    /// Numeric HTTP status code (e.g., `200`, `404`).
    pub status: u16,

    /// Human-readable reason phrase (e.g., `"OK"`, `"Not Found"`).
    pub status_text: String,

    /// Raw response body bytes. Empty when the body of a failed response
    /// could not be read.
    pub body: Vec<u8>,
}

impl Response {
    /// True for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TrackerError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| TrackerError::Decode(format!("{} (from {})", e, self.url)))
    }

    /// Turns a non-2xx response into [`TrackerError::Http`], then decodes the body.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, TrackerError> {
        if !self.is_success() {
            return Err(TrackerError::from_response(&self));
        }
        self.json()
    }
}
