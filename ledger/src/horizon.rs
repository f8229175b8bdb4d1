use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use url::Url;

use crate::{Asset, GatewayError, LedgerGateway, PaymentOperation, Result, TransactionRecord};

/// Retry behavior for gateway calls.
///
/// Lookups are idempotent and retried on transient failures; payment sends
/// are not retried unless explicitly opted in, since a timed-out send may
/// still have gone through.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub retry_non_idempotent: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
            retry_non_idempotent: false,
        }
    }
}

/// Ledger gateway over a Horizon-style REST API.
///
/// Lookup goes to `GET {base}/transactions/{hash}/operations`; payouts go to
/// `POST {base}/payments`, a bridge endpoint that signs with the service
/// wallet (optionally authorized with a bearer secret).
#[derive(Clone)]
pub struct HorizonGateway {
    http: reqwest::Client,
    base_url: Url,
    asset: Asset,
    auth_token: Option<String>,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct OperationsPage {
    #[serde(rename = "_embedded")]
    embedded: EmbeddedRecords,
}

#[derive(Deserialize)]
struct EmbeddedRecords {
    records: Vec<PaymentOperation>,
}

#[derive(Deserialize)]
struct SendResponse {
    hash: String,
}

impl HorizonGateway {
    pub fn new(base_url: &str, asset: Asset) -> Result<Self> {
        let base_url = normalize_base(base_url)?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            asset,
            auth_token: None,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn get_with_retry(&self, url: Url) -> Result<reqwest::Response> {
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.http.get(url.clone()).send().await {
                Ok(response)
                    if response.status().is_success()
                        || response.status() == StatusCode::NOT_FOUND =>
                {
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status();
                    if attempt >= self.retry.max_attempts || !retryable_status(status) {
                        let body = response.text().await.unwrap_or_default();
                        return Err(GatewayError::Status { status, body });
                    }
                    warn!(%url, %status, attempt, "ledger lookup failed, retrying");
                }
                Err(err) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(GatewayError::Transport(err));
                    }
                    warn!(%url, attempt, "ledger lookup transport error, retrying: {err}");
                }
            }
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(self.retry.max_backoff);
        }
    }

    async fn post_with_retry(&self, url: Url, body: serde_json::Value) -> Result<reqwest::Response> {
        let max_attempts = if self.retry.retry_non_idempotent {
            self.retry.max_attempts
        } else {
            1
        };
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut request = self.http.post(url.clone()).json(&body);
            if let Some(token) = &self.auth_token {
                request = request.bearer_auth(token);
            }
            match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    if attempt >= max_attempts || !retryable_status(status) {
                        let body = response.text().await.unwrap_or_default();
                        return Err(GatewayError::Status { status, body });
                    }
                    warn!(%url, %status, attempt, "payment send failed, retrying");
                }
                Err(err) => {
                    if attempt >= max_attempts {
                        return Err(GatewayError::Transport(err));
                    }
                    warn!(%url, attempt, "payment send transport error, retrying: {err}");
                }
            }
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(self.retry.max_backoff);
        }
    }
}

#[async_trait]
impl LedgerGateway for HorizonGateway {
    async fn fetch_transaction(&self, hash: &str) -> Result<Option<TransactionRecord>> {
        let url = self
            .base_url
            .join(&format!("transactions/{hash}/operations"))?;
        let response = self.get_with_retry(url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let page: OperationsPage = response
            .json()
            .await
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
        Ok(Some(TransactionRecord {
            hash: hash.to_string(),
            operations: page.embedded.records,
        }))
    }

    async fn send_payment(&self, destination: &str, amount: f64, memo: &str) -> Result<String> {
        let url = self.base_url.join("payments")?;
        let body = json!({
            "destination": destination,
            "amount": amount,
            "asset_code": self.asset.code,
            "asset_issuer": self.asset.issuer,
            "memo": memo,
        });
        let response = self.post_with_retry(url, body).await?;
        let sent: SendResponse = response
            .json()
            .await
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
        Ok(sent.hash)
    }
}

fn retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn normalize_base(raw: &str) -> Result<Url> {
    // Url::join drops the last path segment without a trailing slash.
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Ok(Url::parse(&normalized)?)
}
