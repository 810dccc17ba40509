use serde::{Deserialize, Serialize};

use crate::domain::gateway::GatewayType;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct Summary {
	#[serde(rename = "totalRequests")]
	pub total_requests: i64,
	#[serde(rename = "totalAmount")]
	pub total_amount:   f64,
}

/// Per-gateway totals over a time range. Amounts are rounded half-up to two
/// decimals on emission; counts are exact.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct AggregatedSummary {
	pub default:  Summary,
	pub fallback: Summary,
}

impl AggregatedSummary {
	pub fn record(&mut self, gateway: GatewayType, amount: f64) {
		let entry = match gateway {
			GatewayType::Default => &mut self.default,
			GatewayType::Fallback => &mut self.fallback,
		};
		entry.total_requests += 1;
		entry.total_amount += amount;
	}

	pub fn merge(&mut self, other: AggregatedSummary) {
		self.default.total_requests += other.default.total_requests;
		self.default.total_amount += other.default.total_amount;
		self.fallback.total_requests += other.fallback.total_requests;
		self.fallback.total_amount += other.fallback.total_amount;
	}

	pub fn round_amounts(&mut self) {
		self.default.total_amount = round_half_up(self.default.total_amount);
		self.fallback.total_amount = round_half_up(self.fallback.total_amount);
	}
}

fn round_half_up(amount: f64) -> f64 {
	(amount * 100.0 + 0.5).floor() / 100.0
}
