use chrono::{DateTime, Utc};
use derive_more::derive::{Display, Error};
use serde::{Deserialize, Serialize};

use crate::domain::gateway::GatewayType;

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum InvalidPayment {
	#[display("correlation id is required")]
	MissingCorrelationId,
	#[display("payment amount must be positive")]
	NonPositiveAmount,
}

/// A payment submission as accepted on ingress. The correlation id is the
/// client-assigned idempotency key.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
	pub correlation_id: String,
	pub amount:         f64,
}

impl Payment {
	pub fn validate(&self) -> Result<(), InvalidPayment> {
		if self.correlation_id.is_empty() {
			return Err(InvalidPayment::MissingCorrelationId);
		}
		if self.amount <= 0.0 {
			return Err(InvalidPayment::NonPositiveAmount);
		}
		Ok(())
	}
}

/// A payment after a successful downstream submission. `requested_at` is
/// stamped by the worker just before the processor call, never by the client.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedPayment {
	pub correlation_id: String,
	pub amount:         f64,
	pub requested_at:   DateTime<Utc>,
	#[serde(rename = "paymentGatewayType")]
	pub gateway:        GatewayType,
}
