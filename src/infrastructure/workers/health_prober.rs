use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use crate::domain::gateway::GatewayType;
use crate::domain::health::choose_best;
use crate::domain::shared_state::SharedStateStore;
use crate::infrastructure::config::keys::HEALTH_LOCK_KEY;
use crate::infrastructure::processors::client::ProcessorClients;
use crate::infrastructure::routing::gateway_selector::GatewaySelector;

/// Probes both processors on a fixed timer and publishes the best-gateway
/// decision. The distributed lock keeps the probing single-writer across
/// replicas; when another replica holds it, the tick is skipped and its
/// published decision reaches local workers through the selector refresh.
pub async fn health_prober_loop<S: SharedStateStore>(
	shared_state: Arc<S>,
	clients: Arc<ProcessorClients>,
	selector: GatewaySelector,
	probe_interval: Duration,
	lock_ttl: Duration,
	mut shutdown: watch::Receiver<bool>,
) {
	let mut ticker = time::interval(probe_interval);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		tokio::select! {
			_ = shutdown.changed() => return,
			_ = ticker.tick() => {}
		}

		run_probe_tick(shared_state.as_ref(), &clients, &selector, lock_ttl).await;
	}
}

/// One prober tick: acquire the lock, probe both gateways concurrently,
/// publish the decision, release the lock.
pub async fn run_probe_tick<S: SharedStateStore>(
	shared_state: &S,
	clients: &ProcessorClients,
	selector: &GatewaySelector,
	lock_ttl: Duration,
) {
	match shared_state.try_acquire_lock(HEALTH_LOCK_KEY, lock_ttl).await {
		Ok(true) => {}
		Ok(false) => {
			debug!("Health check lock held by another replica, skipping tick");
			return;
		}
		Err(e) => {
			error!("Failed to acquire health check lock: {e}");
			return;
		}
	}

	let (default_health, fallback_health) = tokio::join!(
		clients.get(GatewayType::Default).probe(),
		clients.get(GatewayType::Fallback).probe(),
	);

	for health in [&default_health, &fallback_health] {
		info!(
			"[health] {} {} ({} ms)",
			health.gateway,
			if health.healthy { "UP" } else { "DOWN" },
			health.min_response_time_ms
		);
	}

	let decision = choose_best(&default_health, &fallback_health);
	if let Err(e) = shared_state.publish_best_gateway(decision).await {
		error!("Failed to publish best gateway decision: {e}");
	}
	selector.publish(decision);

	if let Err(e) = shared_state.release_lock(HEALTH_LOCK_KEY).await {
		warn!("Failed to release health check lock: {e}");
	}
}
