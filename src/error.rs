use alloy::primitives::Address;
use thiserror::Error;

/// Decoding the factory creation call failed. Fatal for that Safe: we never
/// guess at an unrecognized selector.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unknown factory method 0x{}", hex::encode(.selector))]
    UnknownMethod { selector: [u8; 4] },
    #[error("malformed factory call data: {0}")]
    MalformedInput(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("transaction service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("transaction service returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// A target-chain precondition is unmet. Recoverable by picking a different
/// target chain.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("singleton {0} has no code on the target chain")]
    SingletonMissing(Address),
    #[error("callback contract {0} has no code on the target chain")]
    CallbackMissing(Address),
    #[error("rpc error: {0}")]
    Rpc(String),
}

#[derive(Debug, Error)]
pub enum ReplayError {
    /// The connected node serves a different chain than the requested target.
    /// The CLI analogue of a refused wallet_switchEthereumChain.
    #[error("connected node is on chain {actual}, expected chain {expected}")]
    ChainMismatch { expected: u64, actual: u64 },
    #[error("deployment reverted: {}", display_reason(.reason))]
    Reverted { reason: String },
    #[error("transaction rejected by the signer")]
    UserRejected,
    #[error("network error: {0}")]
    Network(String),
}

const MAX_REASON_LEN: usize = 160;

/// Revert reasons can carry kilobytes of ABI-encoded junk. Cap what we show;
/// the full text goes to the diagnostic log.
pub fn display_reason(reason: &str) -> String {
    if reason.chars().count() <= MAX_REASON_LEN {
        return reason.to_string();
    }
    let truncated: String = reason.chars().take(MAX_REASON_LEN).collect();
    format!("{truncated}…")
}
