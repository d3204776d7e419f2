use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("code not redeemable: {0}")]
    CodeInvalid(String),

    #[error("no identity record available: {0}")]
    RecordExhausted(String),

    #[error("gateway unreachable: {0}")]
    Unreachable(String),

    #[error("gateway request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response from gateway: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Ineligibility reported by the gateway, as opposed to a transport
    /// problem. Terminal: retrying the same code cannot help.
    pub fn is_ineligible(&self) -> bool {
        matches!(
            self,
            GatewayError::CodeInvalid(_) | GatewayError::RecordExhausted(_)
        )
    }
}
