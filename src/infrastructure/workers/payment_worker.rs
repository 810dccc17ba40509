use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use log::{error, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::repository::PaymentRepository;
use crate::infrastructure::queue::payment_queue::PaymentQueue;
use crate::infrastructure::routing::gateway_selector::GatewaySelector;
use crate::use_cases::process_payment::ProcessPaymentUseCase;

/// Upper bound on how long a worker parks when no gateway is available
/// before re-checking the selector.
const NO_GATEWAY_WAIT: Duration = Duration::from_millis(200);

pub fn pool_size(multiplier: usize) -> usize {
	let cpus = std::thread::available_parallelism()
		.map(|n| n.get())
		.unwrap_or(4);
	(cpus * multiplier).max(1)
}

pub fn spawn_worker_pool<R>(
	count: usize,
	queue: Arc<PaymentQueue>,
	selector: GatewaySelector,
	process_payment: ProcessPaymentUseCase<R>,
	shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>>
where
	R: PaymentRepository + Clone,
{
	(0..count)
		.map(|id| {
			tokio::spawn(payment_worker_loop(
				id,
				Arc::clone(&queue),
				selector.clone(),
				process_payment.clone(),
				shutdown.clone(),
			))
		})
		.collect()
}

/// Consumes the queue until shutdown. Routing belongs to the selector: on a
/// processor failure the item goes back to the queue rather than straight to
/// the other gateway, so a transient blip cannot stampede every worker onto
/// the fallback at once.
pub async fn payment_worker_loop<R>(
	id: usize,
	queue: Arc<PaymentQueue>,
	selector: GatewaySelector,
	process_payment: ProcessPaymentUseCase<R>,
	mut shutdown: watch::Receiver<bool>,
) where
	R: PaymentRepository + Clone,
{
	info!("[worker {id}] started");

	loop {
		let item = tokio::select! {
			_ = shutdown.changed() => break,
			item = queue.dequeue() => match item {
				Some(item) => item,
				None => break,
			},
		};

		let Some(gateway) = selector.current() else {
			// The attempt never happened, so the attempt count stays put.
			queue.requeue_unattempted(item);
			selector.wait_for_gateway(NO_GATEWAY_WAIT).await;
			continue;
		};

		let attempt = AssertUnwindSafe(
			process_payment.execute(item.payment.clone(), gateway),
		)
		.catch_unwind()
		.await;

		match attempt {
			Ok(Ok(())) => {}
			Ok(Err(e)) => {
				warn!(
					"[worker {id}] payment {} failed via {gateway} (attempt {}): {e}",
					item.payment.correlation_id,
					item.attempt_count + 1
				);
				queue.requeue(item.payment, item.attempt_count);
			}
			Err(_) => {
				error!(
					"[worker {id}] panicked while processing payment {}, \
					 re-queueing",
					item.payment.correlation_id
				);
				queue.requeue(item.payment, item.attempt_count);
			}
		}
	}

	info!("[worker {id}] stopped");
}
