use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use payment_proxy::domain::gateway::GatewayType;
use payment_proxy::domain::shared_state::SharedStateStore;

/// In-memory stand-in for the Redis-backed shared state, with a scriptable
/// lock so tests can exercise the skipped-tick path.
#[derive(Default)]
pub struct FakeSharedState {
	best:           Mutex<Option<GatewayType>>,
	pub published:  Mutex<Vec<Option<GatewayType>>>,
	lock_available: AtomicBool,
	lock_acquired:  AtomicUsize,
	lock_released:  AtomicUsize,
}

impl FakeSharedState {
	pub fn new() -> Self {
		Self {
			lock_available: AtomicBool::new(true),
			..Default::default()
		}
	}

	pub fn with_unavailable_lock() -> Self {
		Self::default()
	}

	pub fn published_decisions(&self) -> Vec<Option<GatewayType>> {
		self.published.lock().unwrap().clone()
	}

	pub fn lock_acquired(&self) -> usize {
		self.lock_acquired.load(Ordering::SeqCst)
	}

	pub fn lock_released(&self) -> usize {
		self.lock_released.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl SharedStateStore for FakeSharedState {
	async fn publish_best_gateway(
		&self,
		decision: Option<GatewayType>,
	) -> Result<(), Box<dyn std::error::Error + Send>> {
		*self.best.lock().unwrap() = decision;
		self.published.lock().unwrap().push(decision);
		Ok(())
	}

	async fn read_best_gateway(
		&self,
	) -> Result<Option<GatewayType>, Box<dyn std::error::Error + Send>> {
		Ok(*self.best.lock().unwrap())
	}

	async fn try_acquire_lock(
		&self,
		_key: &str,
		_ttl: Duration,
	) -> Result<bool, Box<dyn std::error::Error + Send>> {
		if !self.lock_available.load(Ordering::SeqCst) {
			return Ok(false);
		}
		self.lock_acquired.fetch_add(1, Ordering::SeqCst);
		Ok(true)
	}

	async fn release_lock(
		&self,
		_key: &str,
	) -> Result<(), Box<dyn std::error::Error + Send>> {
		self.lock_released.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}
