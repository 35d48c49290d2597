use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /payment/initiate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest {
    pub plan_id: String,
    /// Amount in minor currency units (cents, paise, ...).
    pub amount: u64,
    pub currency: String,
}

/// Gateway handoff returned when a payment is started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct PaymentInitiation {
    pub payment_id: String,
    #[serde(default)]
    pub checkout_url: Option<String>,
    #[serde(default)]
    pub status: PaymentState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatus {
    pub payment_id: String,
    pub status: PaymentState,
    #[serde(default)]
    pub amount: Option<u64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    #[default]
    Pending,
    Completed,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl PaymentState {
    /// Whether the gateway will not move this payment any further.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentState::Completed | PaymentState::Failed | PaymentState::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Pending => "pending",
            PaymentState::Completed => "completed",
            PaymentState::Failed => "failed",
            PaymentState::Cancelled => "cancelled",
            PaymentState::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
