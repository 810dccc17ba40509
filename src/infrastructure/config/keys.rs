/// Shared KV entry holding the current best-gateway decision: `"0"` default,
/// `"1"` fallback, `""` none. Written only by the prober holding the lock.
pub const BEST_GATEWAY_KEY: &str = "best_gateway";

/// Distributed lock serialising health probes across replicas.
pub const HEALTH_LOCK_KEY: &str = "health-check-pp";
