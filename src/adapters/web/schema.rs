use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PaymentRequest {
	#[serde(rename = "correlationId")]
	pub correlation_id: String,
	pub amount:         f64,
}

#[derive(Debug, Deserialize)]
pub struct PaymentsSummaryFilter {
	#[serde(default)]
	pub from: Option<DateTime<Utc>>,
	#[serde(default)]
	pub to:   Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
	pub message: &'static str,
}
