//! Error types for the FMP client.

/// Errors that can occur when calling the FMP API.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The API key is missing, a placeholder, or was rejected (HTTP 401/403).
    #[error("Invalid or missing FMP API key")]
    InvalidApiKey,
    /// FMP throttled the request (HTTP 429).
    #[error("Rate limited by FMP (HTTP 429)")]
    RateLimited,
    /// The API returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// FMP answered 200 with an `{"Error Message": ...}` payload.
    #[error("FMP error message: {0}")]
    ApiMessage(String),
    /// The body could not be deserialized into the expected type.
    #[error("Failed to parse response: {0}")]
    ParseFailed(String),
    /// Network failure, timeout, or client construction error.
    #[error("Request failed")]
    RequestFailed,
}
