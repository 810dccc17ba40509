use std::collections::{BinaryHeap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use derive_more::derive::{Display, Error};
use log::warn;
use tokio::sync::mpsc;
use tokio::sync::Notify;
use tokio::time::{self, Instant};

use crate::domain::payment::Payment;
use crate::domain::queue::PendingPayment;
use crate::infrastructure::config::settings::Settings;

/// How long a blocked consumer sleeps between wake-up checks. Bounds the
/// latency of observing `close()` from an idle worker.
const DEQUEUE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum EnqueueError {
	#[display("payment queue full")]
	Full,
	#[display("payment queue closed")]
	Closed,
}

#[derive(Debug, Clone)]
pub struct QueueSettings {
	pub fresh_capacity:          usize,
	pub retry_capacity:          usize,
	pub admission_timeout:       Duration,
	pub retry_admission_timeout: Duration,
	pub max_retry_attempts:      u32,
	pub base_retry_delay:        Duration,
	pub max_retry_delay:         Duration,
}

impl Default for QueueSettings {
	fn default() -> Self {
		Self {
			fresh_capacity:          50_000,
			retry_capacity:          16_384,
			admission_timeout:       Duration::from_millis(100),
			retry_admission_timeout: Duration::from_millis(200),
			max_retry_attempts:      10_000,
			base_retry_delay:        Duration::from_millis(100),
			max_retry_delay:         Duration::from_millis(2_000),
		}
	}
}

impl QueueSettings {
	pub fn from_settings(settings: &Settings) -> Self {
		Self {
			fresh_capacity:          settings.queue_capacity,
			retry_capacity:          settings.retry_capacity,
			admission_timeout:       Duration::from_millis(
				settings.admission_timeout_ms,
			),
			retry_admission_timeout: Duration::from_millis(
				settings.retry_admission_timeout_ms,
			),
			max_retry_attempts:      settings.max_retry_attempts,
			base_retry_delay:        Duration::from_millis(
				settings.base_retry_delay_ms,
			),
			max_retry_delay:         Duration::from_millis(
				settings.max_retry_delay_ms,
			),
		}
	}
}

struct Lane {
	items:    Mutex<VecDeque<PendingPayment>>,
	capacity: usize,
	space:    Notify,
}

impl Lane {
	fn new(capacity: usize) -> Self {
		Self {
			items: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
			capacity,
			space: Notify::new(),
		}
	}

	fn try_push(&self, item: PendingPayment) -> Result<(), PendingPayment> {
		let mut items = self.items.lock().unwrap();
		if items.len() >= self.capacity {
			return Err(item);
		}
		items.push_back(item);
		Ok(())
	}

	fn pop(&self) -> Option<PendingPayment> {
		self.items.lock().unwrap().pop_front()
	}

	fn len(&self) -> usize {
		self.items.lock().unwrap().len()
	}

	fn clear(&self) {
		self.items.lock().unwrap().clear();
		self.space.notify_waiters();
	}
}

/// A retry waiting for its due time in the scheduler heap. Ordered so the
/// earliest due item sits on top of the max-heap.
struct ScheduledRetry {
	item:  PendingPayment,
	due:   Instant,
	epoch: u64,
}

impl PartialEq for ScheduledRetry {
	fn eq(&self, other: &Self) -> bool {
		self.due == other.due
	}
}

impl Eq for ScheduledRetry {}

impl PartialOrd for ScheduledRetry {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for ScheduledRetry {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		other.due.cmp(&self.due)
	}
}

/// Two-lane bounded queue of pending payments: a primary FIFO fed by ingress
/// and a retry FIFO fed by the workers through a backoff scheduler. Consumers
/// alternate between the lanes so retries cannot starve fresh payments.
///
/// The queue's bounded capacity is the sole backpressure signal: a full fresh
/// lane rejects ingress after a short admission wait, a full retry lane drops
/// the retry after a bounded wait and records the drop.
pub struct PaymentQueue {
	fresh:            Lane,
	retry:            Lane,
	arrival:          Notify,
	closed_notify:    Notify,
	take_retry_first: AtomicBool,
	closed:           AtomicBool,
	dropped:          AtomicU64,
	epoch:            AtomicU64,
	retry_tx:         mpsc::Sender<ScheduledRetry>,
	settings:         QueueSettings,
}

impl PaymentQueue {
	/// Builds the queue and spawns its retry scheduler task. Must run inside
	/// a tokio runtime.
	pub fn start(settings: QueueSettings) -> Arc<Self> {
		let (retry_tx, retry_rx) = mpsc::channel(settings.retry_capacity.max(1));

		let queue = Arc::new(Self {
			fresh: Lane::new(settings.fresh_capacity),
			retry: Lane::new(settings.retry_capacity),
			arrival: Notify::new(),
			closed_notify: Notify::new(),
			take_retry_first: AtomicBool::new(false),
			closed: AtomicBool::new(false),
			dropped: AtomicU64::new(0),
			epoch: AtomicU64::new(0),
			retry_tx,
			settings,
		});

		tokio::spawn(retry_scheduler_loop(Arc::clone(&queue), retry_rx));

		queue
	}

	/// Admits a fresh payment. Waits at most the admission timeout for space
	/// when the lane is full, so ingress latency stays bounded regardless of
	/// downstream processor latency.
	pub async fn enqueue(&self, payment: Payment) -> Result<(), EnqueueError> {
		if self.closed.load(Ordering::Acquire) {
			return Err(EnqueueError::Closed);
		}

		match self.fresh.try_push(PendingPayment::new(payment)) {
			Ok(()) => {
				self.arrival.notify_one();
				Ok(())
			}
			Err(returned) => {
				let mut returned = Some(returned);
				let admitted =
					time::timeout(self.settings.admission_timeout, async {
						loop {
							self.fresh.space.notified().await;
							match self.fresh.try_push(returned.take().unwrap()) {
								Ok(()) => return,
								Err(back) => returned = Some(back),
							}
						}
					})
					.await;

				match admitted {
					Ok(()) => {
						self.arrival.notify_one();
						Ok(())
					}
					Err(_) => Err(EnqueueError::Full),
				}
			}
		}
	}

	/// Awaits the next pending payment, preferring whichever lane the last
	/// call did not serve. Returns `None` once the queue has been closed.
	pub async fn dequeue(&self) -> Option<PendingPayment> {
		loop {
			if self.closed.load(Ordering::Acquire) {
				return None;
			}
			if let Some(item) = self.pop_any() {
				return Some(item);
			}
			let _ = time::timeout(DEQUEUE_POLL, self.arrival.notified()).await;
		}
	}

	fn pop_any(&self) -> Option<PendingPayment> {
		let retry_first = self.take_retry_first.fetch_xor(true, Ordering::Relaxed);
		let (first, second) = if retry_first {
			(&self.retry, &self.fresh)
		} else {
			(&self.fresh, &self.retry)
		};

		if let Some(item) = first.pop() {
			first.space.notify_one();
			return Some(item);
		}
		if let Some(item) = second.pop() {
			second.space.notify_one();
			return Some(item);
		}
		None
	}

	/// Schedules a failed payment for another attempt after an exponential
	/// backoff keyed on the attempt count. Beyond the configured cap the
	/// payment is dropped and the drop recorded. Never blocks the caller.
	pub fn requeue(&self, payment: Payment, prior_attempts: u32) {
		let attempt_count = prior_attempts.saturating_add(1);
		if attempt_count > self.settings.max_retry_attempts {
			warn!(
				"Dropping payment {} after {} failed attempts (retry cap {})",
				payment.correlation_id,
				prior_attempts,
				self.settings.max_retry_attempts
			);
			self.dropped.fetch_add(1, Ordering::Relaxed);
			return;
		}

		let delay = self.backoff_delay(attempt_count);
		self.schedule(
			PendingPayment {
				payment,
				attempt_count,
			},
			delay,
		);
	}

	/// Re-admits a payment whose attempt never reached a processor (no
	/// gateway was available), keeping its attempt count unchanged.
	pub fn requeue_unattempted(&self, item: PendingPayment) {
		self.schedule(item, self.settings.base_retry_delay);
	}

	fn schedule(&self, item: PendingPayment, delay: Duration) {
		let scheduled = ScheduledRetry {
			item,
			due: Instant::now() + delay,
			epoch: self.epoch.load(Ordering::Relaxed),
		};

		if let Err(rejected) = self.retry_tx.try_send(scheduled) {
			let scheduled = rejected.into_inner();
			warn!(
				"Retry scheduler backlog full, dropping payment {}",
				scheduled.item.payment.correlation_id
			);
			self.dropped.fetch_add(1, Ordering::Relaxed);
		}
	}

	fn backoff_delay(&self, attempt_count: u32) -> Duration {
		let shift = attempt_count.saturating_sub(1).min(5);
		let base_ms = self.settings.base_retry_delay.as_millis() as u64;
		let max_ms = self.settings.max_retry_delay.as_millis() as u64;
		Duration::from_millis((base_ms << shift).min(max_ms).max(1))
	}

	async fn admit_scheduled(&self, item: PendingPayment) {
		if self.closed.load(Ordering::Acquire) {
			return;
		}

		match self.retry.try_push(item) {
			Ok(()) => self.arrival.notify_one(),
			Err(returned) => {
				let correlation_id = returned.payment.correlation_id.clone();
				let mut returned = Some(returned);
				let admitted =
					time::timeout(self.settings.retry_admission_timeout, async {
						loop {
							self.retry.space.notified().await;
							match self.retry.try_push(returned.take().unwrap()) {
								Ok(()) => return,
								Err(back) => returned = Some(back),
							}
						}
					})
					.await;

				match admitted {
					Ok(()) => self.arrival.notify_one(),
					Err(_) => {
						warn!(
							"Retry lane full, dropping payment {correlation_id} \
							 after bounded wait"
						);
						self.dropped.fetch_add(1, Ordering::Relaxed);
					}
				}
			}
		}
	}

	/// Drains both lanes and invalidates retries still waiting in the
	/// scheduler, so nothing admitted before the purge resurfaces after it.
	pub fn clear(&self) {
		self.epoch.fetch_add(1, Ordering::Relaxed);
		self.fresh.clear();
		self.retry.clear();
	}

	/// Stops admission and wakes every blocked producer and consumer.
	/// Payments still queued are abandoned; shutdown is not a drain.
	pub fn close(&self) {
		self.closed.store(true, Ordering::Release);
		self.arrival.notify_waiters();
		self.closed_notify.notify_waiters();
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::Acquire)
	}

	pub fn len(&self) -> usize {
		self.fresh.len() + self.retry.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn dropped(&self) -> u64 {
		self.dropped.load(Ordering::Relaxed)
	}
}

/// Holds scheduled retries in a heap ordered by due time and feeds them into
/// the retry lane as they come due. A single task keeps retry memory bounded
/// without spawning one timer task per failed payment.
async fn retry_scheduler_loop(
	queue: Arc<PaymentQueue>,
	mut retry_rx: mpsc::Receiver<ScheduledRetry>,
) {
	let mut heap: BinaryHeap<ScheduledRetry> = BinaryHeap::new();

	loop {
		if queue.closed.load(Ordering::Acquire) {
			return;
		}

		let now = Instant::now();
		while heap.peek().is_some_and(|scheduled| scheduled.due <= now) {
			let scheduled = heap.pop().unwrap();
			if scheduled.epoch != queue.epoch.load(Ordering::Relaxed) {
				continue;
			}
			queue.admit_scheduled(scheduled.item).await;
		}

		let next_due = heap.peek().map(|scheduled| scheduled.due);

		tokio::select! {
			received = retry_rx.recv() => match received {
				Some(scheduled) => heap.push(scheduled),
				None => return,
			},
			_ = async {
				match next_due {
					Some(due) => time::sleep_until(due).await,
					None => std::future::pending().await,
				}
			} => {}
			_ = queue.closed_notify.notified() => return,
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;

	fn payment(correlation_id: &str) -> Payment {
		Payment {
			correlation_id: correlation_id.to_string(),
			amount:         10.0,
		}
	}

	fn fast_settings() -> QueueSettings {
		QueueSettings {
			fresh_capacity:          4,
			retry_capacity:          4,
			admission_timeout:       Duration::from_millis(20),
			retry_admission_timeout: Duration::from_millis(20),
			max_retry_attempts:      3,
			base_retry_delay:        Duration::from_millis(10),
			max_retry_delay:         Duration::from_millis(40),
		}
	}

	#[tokio::test]
	async fn test_enqueue_then_dequeue_fifo() {
		let queue = PaymentQueue::start(fast_settings());

		queue.enqueue(payment("a")).await.unwrap();
		queue.enqueue(payment("b")).await.unwrap();

		let first = queue.dequeue().await.unwrap();
		let second = queue.dequeue().await.unwrap();

		assert_eq!(first.payment.correlation_id, "a");
		assert_eq!(first.attempt_count, 0);
		assert_eq!(second.payment.correlation_id, "b");
	}

	#[tokio::test]
	async fn test_enqueue_fails_when_full() {
		let settings = QueueSettings {
			fresh_capacity: 2,
			..fast_settings()
		};
		let queue = PaymentQueue::start(settings);

		queue.enqueue(payment("a")).await.unwrap();
		queue.enqueue(payment("b")).await.unwrap();

		let result = queue.enqueue(payment("c")).await;
		assert_eq!(result, Err(EnqueueError::Full));
		assert_eq!(queue.len(), 2);
	}

	#[tokio::test]
	async fn test_enqueue_admits_once_space_frees_up() {
		let settings = QueueSettings {
			fresh_capacity: 1,
			admission_timeout: Duration::from_millis(500),
			..fast_settings()
		};
		let queue = PaymentQueue::start(settings);
		queue.enqueue(payment("a")).await.unwrap();

		let consumer = {
			let queue = Arc::clone(&queue);
			tokio::spawn(async move {
				tokio::time::sleep(Duration::from_millis(30)).await;
				queue.dequeue().await
			})
		};

		queue.enqueue(payment("b")).await.unwrap();
		let popped = consumer.await.unwrap().unwrap();
		assert_eq!(popped.payment.correlation_id, "a");
		assert_eq!(queue.dequeue().await.unwrap().payment.correlation_id, "b");
	}

	#[tokio::test]
	async fn test_requeue_increments_attempts_and_redelivers() {
		let queue = PaymentQueue::start(fast_settings());

		queue.requeue(payment("r"), 0);

		let start = Instant::now();
		let item = queue.dequeue().await.unwrap();
		assert_eq!(item.payment.correlation_id, "r");
		assert_eq!(item.attempt_count, 1);
		assert!(start.elapsed() >= Duration::from_millis(5));
	}

	#[tokio::test]
	async fn test_requeue_beyond_cap_drops() {
		let queue = PaymentQueue::start(fast_settings());

		queue.requeue(payment("dead"), 3);

		assert_eq!(queue.dropped(), 1);
		tokio::time::sleep(Duration::from_millis(50)).await;
		assert!(queue.is_empty());
	}

	#[tokio::test]
	async fn test_requeue_unattempted_keeps_attempt_count() {
		let queue = PaymentQueue::start(fast_settings());

		queue.requeue_unattempted(PendingPayment {
			payment:       payment("idle"),
			attempt_count: 2,
		});

		let item = queue.dequeue().await.unwrap();
		assert_eq!(item.attempt_count, 2);
	}

	#[tokio::test]
	async fn test_lanes_alternate_so_retries_do_not_starve_fresh() {
		let queue = PaymentQueue::start(fast_settings());

		queue.requeue(payment("retry-1"), 0);
		queue.requeue(payment("retry-2"), 0);
		tokio::time::sleep(Duration::from_millis(30)).await;
		queue.enqueue(payment("fresh-1")).await.unwrap();

		let first_two = [
			queue.dequeue().await.unwrap().payment.correlation_id,
			queue.dequeue().await.unwrap().payment.correlation_id,
		];
		assert!(
			first_two.iter().any(|id| id.starts_with("fresh")),
			"fresh payment starved by retries: {first_two:?}"
		);
	}

	#[tokio::test]
	async fn test_clear_drains_lanes_and_scheduled_retries() {
		let queue = PaymentQueue::start(fast_settings());

		queue.enqueue(payment("a")).await.unwrap();
		queue.enqueue(payment("b")).await.unwrap();
		queue.requeue(payment("scheduled"), 0);

		queue.clear();

		tokio::time::sleep(Duration::from_millis(60)).await;
		assert!(queue.is_empty());
	}

	#[tokio::test]
	async fn test_close_stops_producers_and_consumers() {
		let queue = PaymentQueue::start(fast_settings());
		queue.enqueue(payment("a")).await.unwrap();

		queue.close();

		assert_eq!(queue.dequeue().await, None);
		assert_eq!(
			queue.enqueue(payment("late")).await,
			Err(EnqueueError::Closed)
		);
	}

	#[tokio::test]
	async fn test_dequeue_blocks_until_arrival() {
		let queue = PaymentQueue::start(fast_settings());

		let consumer = {
			let queue = Arc::clone(&queue);
			tokio::spawn(async move { queue.dequeue().await })
		};

		tokio::time::sleep(Duration::from_millis(20)).await;
		queue.enqueue(payment("late-arrival")).await.unwrap();

		let item = consumer.await.unwrap().unwrap();
		assert_eq!(item.payment.correlation_id, "late-arrival");
	}
}
