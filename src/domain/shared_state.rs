use std::time::Duration;

use async_trait::async_trait;

use crate::domain::gateway::GatewayType;

/// Cluster-wide shared state: the best-gateway KV entry and the distributed
/// lock that serialises probing across replicas. Single-writer discipline on
/// the decision is enforced by the lock, not by this trait.
#[async_trait]
pub trait SharedStateStore: Send + Sync + 'static {
	async fn publish_best_gateway(
		&self,
		decision: Option<GatewayType>,
	) -> Result<(), Box<dyn std::error::Error + Send>>;

	async fn read_best_gateway(
		&self,
	) -> Result<Option<GatewayType>, Box<dyn std::error::Error + Send>>;

	/// Returns true when this instance now holds the lock. The lock expires
	/// on its own after `ttl` if the holder dies before releasing it.
	async fn try_acquire_lock(
		&self,
		key: &str,
		ttl: Duration,
	) -> Result<bool, Box<dyn std::error::Error + Send>>;

	async fn release_lock(
		&self,
		key: &str,
	) -> Result<(), Box<dyn std::error::Error + Send>>;
}
