use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheerIdError {
    #[error("verification service unreachable: {0}")]
    Unreachable(String),

    #[error("HTTP request to verification service failed: {0}")]
    RequestFailed(String),

    #[error("verification step rejected with HTTP {status}: {body}")]
    Protocol { status: u16, body: String },

    #[error("invalid response from verification service: {0}")]
    InvalidResponse(String),
}
