use std::sync::Arc;

use chrono::Utc;
use log::error;

use crate::domain::gateway::GatewayType;
use crate::domain::payment::{Payment, ProcessedPayment};
use crate::domain::repository::PaymentRepository;
use crate::infrastructure::processors::client::{
	ProcessorClients, ProcessorError,
};

/// Processes one payment against one gateway: stamps the request time,
/// submits, and persists the outcome. The caller owns routing and retries.
#[derive(Clone)]
pub struct ProcessPaymentUseCase<R: PaymentRepository> {
	payment_repo: R,
	clients:      Arc<ProcessorClients>,
}

impl<R: PaymentRepository> ProcessPaymentUseCase<R> {
	pub fn new(payment_repo: R, clients: Arc<ProcessorClients>) -> Self {
		Self {
			payment_repo,
			clients,
		}
	}

	pub async fn execute(
		&self,
		payment: Payment,
		gateway: GatewayType,
	) -> Result<(), ProcessorError> {
		let requested_at = Utc::now();

		self.clients
			.get(gateway)
			.submit(&payment, requested_at)
			.await?;

		let processed = ProcessedPayment {
			correlation_id: payment.correlation_id,
			amount: payment.amount,
			requested_at,
			gateway,
		};

		// The processor accepted the payment; a store failure here must not
		// push it back into the retry loop. The upsert on the correlation id
		// keeps an eventual duplicate delivery idempotent.
		if let Err(e) = self.payment_repo.save(&processed).await {
			error!(
				"Failed to persist payment {} after successful submission: {e}",
				processed.correlation_id
			);
		}

		Ok(())
	}
}
