use std::sync::{Arc, RwLock};
use std::time::Duration;

use log::debug;
use tokio::sync::{Notify, watch};
use tokio::time;

use crate::domain::gateway::GatewayType;
use crate::domain::shared_state::SharedStateStore;

/// Cheap read-side of the best-gateway decision. Workers read an in-process
/// mirror of the shared KV entry; a background task refreshes the mirror well
/// inside the 500 ms staleness bound, and the local prober pushes into it
/// directly after publishing. The shared KV stays the source of truth across
/// replicas.
#[derive(Clone)]
pub struct GatewaySelector {
	mirror:  Arc<RwLock<Option<GatewayType>>>,
	changed: Arc<Notify>,
}

impl GatewaySelector {
	pub fn new() -> Self {
		Self {
			mirror:  Arc::new(RwLock::new(None)),
			changed: Arc::new(Notify::new()),
		}
	}

	pub fn current(&self) -> Option<GatewayType> {
		*self.mirror.read().unwrap()
	}

	/// Replaces the mirrored decision, waking waiting workers when a gateway
	/// becomes available.
	pub fn publish(&self, decision: Option<GatewayType>) {
		let mut current = self.mirror.write().unwrap();
		if *current == decision {
			return;
		}
		*current = decision;
		drop(current);

		if decision.is_some() {
			self.changed.notify_waiters();
		}
	}

	/// Parks the caller until a gateway becomes available or `max_wait`
	/// elapses, whichever comes first. Keeps workers off a busy loop while
	/// both processors are down.
	pub async fn wait_for_gateway(&self, max_wait: Duration) {
		if self.current().is_some() {
			return;
		}
		let _ = time::timeout(max_wait, self.changed.notified()).await;
	}
}

impl Default for GatewaySelector {
	fn default() -> Self {
		Self::new()
	}
}

/// Keeps the selector mirror in sync with the shared KV entry, so decisions
/// published by other replicas' probers reach local workers.
pub async fn selector_refresh_loop<S: SharedStateStore>(
	selector: GatewaySelector,
	shared_state: Arc<S>,
	refresh: Duration,
	mut shutdown: watch::Receiver<bool>,
) {
	loop {
		tokio::select! {
			_ = shutdown.changed() => return,
			_ = time::sleep(refresh) => {}
		}

		match shared_state.read_best_gateway().await {
			Ok(decision) => selector.publish(decision),
			Err(e) => debug!("Failed to refresh best gateway from shared state: {e}"),
		}
	}
}
