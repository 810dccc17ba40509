use serde::Deserialize;

/// The literal `CONN_STRING` value that selects the in-memory payment store
/// instead of Postgres.
pub const IN_MEMORY_STORE: &str = "memory";

/// Runtime configuration, read from the environment. The four connection
/// settings have no defaults and are fatal at start-up when missing; the
/// tuning knobs default to the values the system is load-tested with.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
	pub conn_string: String,
	pub redis_url: String,
	pub gateway_default_url: String,
	pub gateway_fallback_url: String,

	pub server_port: u16,
	pub worker_multiplier: usize,
	pub queue_capacity: usize,
	pub retry_capacity: usize,
	pub admission_timeout_ms: u64,
	pub retry_admission_timeout_ms: u64,
	pub max_retry_attempts: u32,
	pub base_retry_delay_ms: u64,
	pub max_retry_delay_ms: u64,
	pub probe_interval_secs: u64,
	pub lock_ttl_secs: u64,
	pub selector_refresh_ms: u64,
	pub processor_timeout_secs: u64,
	pub shutdown_grace_secs: u64,
}

impl Settings {
	pub fn load() -> Result<Self, config::ConfigError> {
		let config_builder = config::Config::builder()
			.set_default("server_port", 9999_i64)?
			.set_default("worker_multiplier", 3_i64)?
			.set_default("queue_capacity", 50_000_i64)?
			.set_default("retry_capacity", 16_384_i64)?
			.set_default("admission_timeout_ms", 100_i64)?
			.set_default("retry_admission_timeout_ms", 200_i64)?
			.set_default("max_retry_attempts", 10_000_i64)?
			.set_default("base_retry_delay_ms", 100_i64)?
			.set_default("max_retry_delay_ms", 2_000_i64)?
			.set_default("probe_interval_secs", 5_i64)?
			.set_default("lock_ttl_secs", 60_i64)?
			.set_default("selector_refresh_ms", 300_i64)?
			.set_default("processor_timeout_secs", 10_i64)?
			.set_default("shutdown_grace_secs", 5_i64)?
			.add_source(config::Environment::default())
			.build()?;

		config_builder.try_deserialize()
	}

	pub fn uses_in_memory_store(&self) -> bool {
		self.conn_string == IN_MEMORY_STORE
	}
}
