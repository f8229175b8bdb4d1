use thiserror::Error;

/// Domain rule violations raised by the tourney entity operations.
///
/// A closed set of tagged variants rather than an open error hierarchy: the
/// request boundary dispatches on the variant to build the response shape,
/// and `code()` is the stable machine-readable name exposed to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TourneyError {
    #[error("transaction hash {0} is invalid")]
    TransactionHash(String),
    #[error("tourney for transaction {0} is already created")]
    DuplicateTransaction(String),
    #[error("wallet address {0} is invalid")]
    WalletAddress(String),
    #[error("{0}")]
    UserAlreadyJoined(String),
    #[error("tourney is not joinable (status {0})")]
    NotJoinable(String),
}

impl TourneyError {
    pub fn code(&self) -> &'static str {
        match self {
            TourneyError::TransactionHash(_) => "TransactionHashError",
            TourneyError::DuplicateTransaction(_) => "DuplicateTransactionError",
            TourneyError::WalletAddress(_) => "WalletAddressError",
            TourneyError::UserAlreadyJoined(_) => "UserAlreadyJoinedError",
            TourneyError::NotJoinable(_) => "TourneyNotJoinableError",
        }
    }
}
