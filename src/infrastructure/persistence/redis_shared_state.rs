use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, Script};
use uuid::Uuid;

use crate::domain::gateway::{GatewayType, decode_decision, encode_decision};
use crate::domain::shared_state::SharedStateStore;
use crate::infrastructure::config::keys::BEST_GATEWAY_KEY;

/// Redis-backed shared state: the `best_gateway` entry plus a TTL'd lock
/// (`SET NX PX` with an owner token, compare-and-delete release) that keeps
/// probing single-writer across replicas.
#[derive(Clone)]
pub struct RedisSharedState {
	client:      Client,
	owner_token: String,
}

impl RedisSharedState {
	pub fn new(client: Client) -> Self {
		Self {
			client,
			owner_token: Uuid::new_v4().to_string(),
		}
	}

	async fn connection(
		&self,
	) -> Result<redis::aio::MultiplexedConnection, Box<dyn std::error::Error + Send>>
	{
		self.client
			.get_multiplexed_async_connection()
			.await
			.map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send>)
	}
}

#[async_trait]
impl SharedStateStore for RedisSharedState {
	async fn publish_best_gateway(
		&self,
		decision: Option<GatewayType>,
	) -> Result<(), Box<dyn std::error::Error + Send>> {
		let mut con = self.connection().await?;

		let _: () = con
			.set(BEST_GATEWAY_KEY, encode_decision(decision))
			.await
			.map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send>)?;

		Ok(())
	}

	async fn read_best_gateway(
		&self,
	) -> Result<Option<GatewayType>, Box<dyn std::error::Error + Send>> {
		let mut con = self.connection().await?;

		let value: Option<String> = con
			.get(BEST_GATEWAY_KEY)
			.await
			.map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send>)?;

		Ok(value.as_deref().and_then(decode_decision))
	}

	async fn try_acquire_lock(
		&self,
		key: &str,
		ttl: Duration,
	) -> Result<bool, Box<dyn std::error::Error + Send>> {
		let mut con = self.connection().await?;

		let acquired: Option<String> = redis::cmd("SET")
			.arg(key)
			.arg(&self.owner_token)
			.arg("NX")
			.arg("PX")
			.arg(ttl.as_millis() as u64)
			.query_async(&mut con)
			.await
			.map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send>)?;

		Ok(acquired.is_some())
	}

	async fn release_lock(
		&self,
		key: &str,
	) -> Result<(), Box<dyn std::error::Error + Send>> {
		let mut con = self.connection().await?;

		// Only the holder may delete the lock, otherwise a slow tick could
		// release a lock another replica has since acquired.
		let script = Script::new(
			r#"
            if redis.call("GET", KEYS[1]) == ARGV[1] then
                return redis.call("DEL", KEYS[1])
            else
                return 0
            end
        "#,
		);

		let _: i32 = script
			.key(key)
			.arg(&self.owner_token)
			.invoke_async(&mut con)
			.await
			.map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send>)?;

		Ok(())
	}
}
