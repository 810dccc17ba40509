use std::sync::Arc;

use crate::domain::repository::PaymentRepository;
use crate::infrastructure::queue::payment_queue::PaymentQueue;

/// Administrative reset: empties the persistent store and drains both queue
/// lanes, including retries still waiting in the scheduler.
#[derive(Clone)]
pub struct PurgePaymentsUseCase<R: PaymentRepository> {
	payment_repo:  R,
	payment_queue: Arc<PaymentQueue>,
}

impl<R: PaymentRepository> PurgePaymentsUseCase<R> {
	pub fn new(payment_repo: R, payment_queue: Arc<PaymentQueue>) -> Self {
		Self {
			payment_repo,
			payment_queue,
		}
	}

	pub async fn execute(&self) -> Result<(), Box<dyn std::error::Error + Send>> {
		self.payment_repo.clear().await?;
		self.payment_queue.clear();
		Ok(())
	}
}
