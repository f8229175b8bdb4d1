use serde::Deserialize;

use crate::Asset;

/// One operation of a ledger transaction as reported by the gateway.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PaymentOperation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "amount_from_string")]
    pub amount: f64,
    #[serde(default)]
    pub asset_code: Option<String>,
    #[serde(default)]
    pub asset_issuer: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

/// A fetched transaction with its operations.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionRecord {
    pub hash: String,
    pub operations: Vec<PaymentOperation>,
}

impl TransactionRecord {
    /// Total of all payment operations carrying `asset` to `destination`.
    /// Non-payment operations, other assets, and payments to other
    /// addresses do not qualify.
    pub fn received_amount(&self, asset: &Asset, destination: &str) -> f64 {
        self.operations
            .iter()
            .filter(|op| op.kind == "payment")
            .filter(|op| op.asset_code.as_deref() == Some(asset.code.as_str()))
            .filter(|op| op.asset_issuer.as_deref() == Some(asset.issuer.as_str()))
            .filter(|op| op.to.as_deref() == Some(destination))
            .map(|op| op.amount)
            .sum()
    }
}

// Horizon reports amounts as decimal strings.
fn amount_from_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        Some(raw) => raw.parse::<f64>().map_err(serde::de::Error::custom),
        None => Ok(0.0),
    }
}
