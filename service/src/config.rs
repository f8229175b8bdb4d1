use std::time::Duration;

use podium_ledger::Asset;
use podium_types::tourney::{CONFIRM_INTERVAL_SECS, PAY_TIMEOUT_SECS, SCHEDULER_IDLE_SECS};

/// Everything the service needs to run, resolved once at startup and passed
/// down explicitly. Components never reach for process-wide state.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Bind address for the HTTP surface.
    pub host: String,
    pub port: u16,
    /// Redis connection string. `None` selects the in-memory store, which
    /// only makes sense for local development.
    pub redis_url: Option<String>,
    /// Base URL of the Horizon-style ledger API.
    pub horizon_url: String,
    /// Asset that funds tourneys and pays prizes out.
    pub asset: Asset,
    /// Wallet that funding transactions must pay into.
    pub receiving_public_key: String,
    /// Bearer token for the payment-send endpoint, if the gateway wants one.
    pub ledger_auth_token: Option<String>,
    /// Template for the public tourney link; `{id}` is substituted.
    pub tourney_url_template: String,
    /// Poll interval of the payment confirmation loop.
    pub confirm_interval: Duration,
    /// How long to wait for a funding transaction before giving up.
    pub pay_timeout: Duration,
    /// Scheduler sleep when no paid tourney is running.
    pub scheduler_idle: Duration,
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            redis_url: None,
            horizon_url: "https://horizon-kik.kininfrastructure.com".to_string(),
            asset: Asset::new(
                "KIN",
                "GBQ3DQOA7NF52FVV7ES3CR3ZMHUEY4LTHDAQKDTO6S546JCLFPEQGCPK",
            ),
            receiving_public_key: String::new(),
            ledger_auth_token: None,
            tourney_url_template: "http://127.0.0.1/api/v1/tourneys/{id}".to_string(),
            confirm_interval: Duration::from_secs(CONFIRM_INTERVAL_SECS),
            pay_timeout: Duration::from_secs(PAY_TIMEOUT_SECS),
            scheduler_idle: Duration::from_secs(SCHEDULER_IDLE_SECS),
        }
    }
}
