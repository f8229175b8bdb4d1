pub mod horizon;
pub mod transaction;

pub use horizon::{HorizonGateway, RetryPolicy};
pub use transaction::{PaymentOperation, TransactionRecord};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The asset a tourney is funded and payed out in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub code: String,
    pub issuer: String,
}

impl Asset {
    pub fn new(code: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            issuer: issuer.into(),
        }
    }
}

/// Error type for gateway operations.
///
/// "Transaction not found" is not an error: lookups return `Ok(None)` so the
/// confirmation loop can treat propagation delay as the expected transient
/// state it is.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("ledger returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("invalid ledger response: {0}")]
    InvalidResponse(String),
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl GatewayError {
    /// Whether a retry at a later time could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Transport(err) => err.is_timeout() || err.is_connect(),
            GatewayError::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            GatewayError::InvalidResponse(_) | GatewayError::Url(_) => false,
        }
    }
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// The payment network, reduced to what the tourney controller needs:
/// look up a funding transaction and push prize payments out.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Fetch a transaction by hash. `Ok(None)` means the ledger does not
    /// know the transaction (yet).
    async fn fetch_transaction(&self, hash: &str) -> Result<Option<TransactionRecord>>;

    /// Send `amount` of the configured asset to `destination` with a text
    /// memo. Returns the hash of the outgoing transaction.
    async fn send_payment(&self, destination: &str, amount: f64, memo: &str) -> Result<String>;
}

#[async_trait]
impl<T: LedgerGateway + ?Sized> LedgerGateway for std::sync::Arc<T> {
    async fn fetch_transaction(&self, hash: &str) -> Result<Option<TransactionRecord>> {
        (**self).fetch_transaction(hash).await
    }

    async fn send_payment(&self, destination: &str, amount: f64, memo: &str) -> Result<String> {
        (**self).send_payment(destination, amount, memo).await
    }
}
