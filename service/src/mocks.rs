use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use podium_ledger::{GatewayError, LedgerGateway, PaymentOperation, Result, TransactionRecord};

#[derive(Clone, Debug, PartialEq)]
pub struct SentPayment {
    pub destination: String,
    pub amount: f64,
    pub memo: String,
}

/// Scripted ledger gateway. Lookups hit a staged transaction map, sends are
/// recorded, and individual wallets or whole lookups can be made to fail.
#[derive(Default)]
pub struct MockGateway {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    transactions: HashMap<String, TransactionRecord>,
    failing_wallets: HashSet<String>,
    failing_lookups: u32,
    sent: Vec<SentPayment>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage_transaction(&self, record: TransactionRecord) {
        let mut inner = self.inner.lock().unwrap();
        inner.transactions.insert(record.hash.clone(), record);
    }

    pub fn fail_wallet(&self, wallet: &str) {
        self.inner
            .lock()
            .unwrap()
            .failing_wallets
            .insert(wallet.to_string());
    }

    /// The next `count` lookups fail with a retryable status error.
    pub fn fail_next_lookups(&self, count: u32) {
        self.inner.lock().unwrap().failing_lookups = count;
    }

    pub fn sent_payments(&self) -> Vec<SentPayment> {
        self.inner.lock().unwrap().sent.clone()
    }
}

#[async_trait]
impl LedgerGateway for MockGateway {
    async fn fetch_transaction(&self, hash: &str) -> Result<Option<TransactionRecord>> {
        let mut inner = self.inner.lock().unwrap();
        if inner.failing_lookups > 0 {
            inner.failing_lookups -= 1;
            return Err(GatewayError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "scripted lookup failure".to_string(),
            });
        }
        Ok(inner.transactions.get(hash).cloned())
    }

    async fn send_payment(&self, destination: &str, amount: f64, memo: &str) -> Result<String> {
        let mut inner = self.inner.lock().unwrap();
        if inner.failing_wallets.contains(destination) {
            return Err(GatewayError::Status {
                status: StatusCode::BAD_REQUEST,
                body: "destination has no trust line".to_string(),
            });
        }
        inner.sent.push(SentPayment {
            destination: destination.to_string(),
            amount,
            memo: memo.to_string(),
        });
        Ok(format!("mock-tx-{}", inner.sent.len()))
    }
}

/// A funding transaction carrying a single qualifying payment.
pub fn funding_transaction(
    hash: &str,
    asset_code: &str,
    asset_issuer: &str,
    destination: &str,
    amount: f64,
) -> TransactionRecord {
    TransactionRecord {
        hash: hash.to_string(),
        operations: vec![PaymentOperation {
            kind: "payment".to_string(),
            amount,
            asset_code: Some(asset_code.to_string()),
            asset_issuer: Some(asset_issuer.to_string()),
            from: Some("GSENDER".to_string()),
            to: Some(destination.to_string()),
        }],
    }
}
