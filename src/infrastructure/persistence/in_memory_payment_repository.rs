use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::payment::ProcessedPayment;
use crate::domain::repository::PaymentRepository;
use crate::domain::summary::AggregatedSummary;

const SHARD_COUNT: usize = 256;

/// Below this record count the fan-out overhead of a parallel scan costs more
/// than it saves.
const PARALLEL_SCAN_THRESHOLD: usize = 10_000;

struct Shard {
	store: RwLock<HashMap<String, ProcessedPayment>>,
}

/// In-memory store of processed payments, sharded by a hash of the
/// correlation id to keep writer contention low. Saves take the writer lock
/// of one shard; summaries take reader locks shard by shard in index order.
#[derive(Clone)]
pub struct InMemoryPaymentRepository {
	shards: Arc<Vec<Shard>>,
}

impl InMemoryPaymentRepository {
	pub fn new() -> Self {
		let shards = (0..SHARD_COUNT)
			.map(|_| Shard {
				store: RwLock::new(HashMap::new()),
			})
			.collect();
		Self {
			shards: Arc::new(shards),
		}
	}

	fn shard_for(&self, correlation_id: &str) -> &Shard {
		let mut hasher = DefaultHasher::new();
		correlation_id.hash(&mut hasher);
		&self.shards[(hasher.finish() as usize) % SHARD_COUNT]
	}

	fn record_count(&self) -> usize {
		self.shards
			.iter()
			.map(|shard| shard.store.read().unwrap().len())
			.sum()
	}
}

impl Default for InMemoryPaymentRepository {
	fn default() -> Self {
		Self::new()
	}
}

fn scan_shards(
	shards: &[Shard],
	from: Option<DateTime<Utc>>,
	to: Option<DateTime<Utc>>,
) -> AggregatedSummary {
	let mut acc = AggregatedSummary::default();
	for shard in shards {
		let store = shard.store.read().unwrap();
		for payment in store.values() {
			if from.is_some_and(|from| payment.requested_at < from) {
				continue;
			}
			if to.is_some_and(|to| payment.requested_at > to) {
				continue;
			}
			acc.record(payment.gateway, payment.amount);
		}
	}
	acc
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
	async fn save(
		&self,
		payment: &ProcessedPayment,
	) -> Result<(), Box<dyn std::error::Error + Send>> {
		let shard = self.shard_for(&payment.correlation_id);
		shard
			.store
			.write()
			.unwrap()
			.insert(payment.correlation_id.clone(), payment.clone());
		Ok(())
	}

	async fn summary(
		&self,
		from: Option<DateTime<Utc>>,
		to: Option<DateTime<Utc>>,
	) -> Result<AggregatedSummary, Box<dyn std::error::Error + Send>> {
		if self.record_count() < PARALLEL_SCAN_THRESHOLD {
			return Ok(scan_shards(&self.shards, from, to));
		}

		let shards = Arc::clone(&self.shards);
		let merged = tokio::task::spawn_blocking(move || {
			let workers = std::thread::available_parallelism()
				.map(|n| n.get())
				.unwrap_or(4);
			let chunk_size = shards.len().div_ceil(workers);

			let mut total = AggregatedSummary::default();
			std::thread::scope(|scope| {
				let handles: Vec<_> = shards
					.chunks(chunk_size)
					.map(|chunk| scope.spawn(move || scan_shards(chunk, from, to)))
					.collect();
				for handle in handles {
					total.merge(handle.join().expect("summary scan thread panicked"));
				}
			});
			total
		})
		.await
		.map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send>)?;

		Ok(merged)
	}

	async fn clear(&self) -> Result<(), Box<dyn std::error::Error + Send>> {
		for shard in self.shards.iter() {
			shard.store.write().unwrap().clear();
		}
		Ok(())
	}
}
