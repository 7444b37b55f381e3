use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("Wallet connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authorization declined: {0}")]
    AuthorizationDeclined(String),

    #[error("Contract call failed: {0}")]
    ContractError(String),

    #[error("Token approval failed: {0}")]
    ApprovalFailed(String),

    #[error("Purchase failed after approval was granted: {0}")]
    PurchaseFailed(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Stale target: {0}")]
    StaleTarget(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MarketError>;
