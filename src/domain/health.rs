use chrono::{DateTime, Utc};

use crate::domain::gateway::GatewayType;

/// The fallback gateway is costlier, so it only wins when the default is
/// markedly slower. Keeping the threshold below 2.0 adds hysteresis against
/// flapping when the two latencies are close.
pub const FALLBACK_LATENCY_RATIO: f64 = 1.9;

/// Snapshot of one processor's health, overwritten on every prober tick.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayHealth {
	pub gateway:              GatewayType,
	pub healthy:              bool,
	pub min_response_time_ms: u64,
	pub last_check:           DateTime<Utc>,
}

impl GatewayHealth {
	pub fn unhealthy(gateway: GatewayType) -> Self {
		Self {
			gateway,
			healthy: false,
			min_response_time_ms: 1,
			last_check: Utc::now(),
		}
	}
}

/// Picks the gateway all workers should route to, given the latest health
/// snapshots. Rules are evaluated top to bottom:
///
/// 1. neither healthy: no gateway;
/// 2. both healthy and the default is at least 1.9x slower: fallback;
/// 3. default healthy: default;
/// 4. fallback healthy: fallback.
pub fn choose_best(
	def: &GatewayHealth,
	fb: &GatewayHealth,
) -> Option<GatewayType> {
	if !def.healthy && !fb.healthy {
		return None;
	}

	if def.healthy &&
		fb.healthy &&
		def.min_response_time_ms as f64 >=
			FALLBACK_LATENCY_RATIO * fb.min_response_time_ms as f64
	{
		return Some(GatewayType::Fallback);
	}

	if def.healthy {
		return Some(GatewayType::Default);
	}

	Some(GatewayType::Fallback)
}
