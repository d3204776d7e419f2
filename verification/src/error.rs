use thiserror::Error;

/// The user-supplied verification URL carried no usable session identifier.
/// User-correctable; nothing was sent anywhere.
#[derive(Debug, Error)]
#[error("no verification session id found in the supplied URL")]
pub struct ExtractionError;
