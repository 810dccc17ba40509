use std::sync::Arc;

use derive_more::derive::{Display, Error};

use crate::domain::payment::{InvalidPayment, Payment};
use crate::infrastructure::queue::payment_queue::{EnqueueError, PaymentQueue};
use crate::use_cases::dto::CreatePaymentCommand;

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum CreatePaymentError {
	#[display("{_0}")]
	Invalid(InvalidPayment),
	#[display("payment queue full")]
	Overloaded,
	#[display("service is shutting down")]
	ShuttingDown,
}

/// The ingress adapter: validates and enqueues, nothing else. Returns within
/// the queue admission timeout regardless of downstream processor latency;
/// an accepted payment is queued, not yet processed.
#[derive(Clone)]
pub struct CreatePaymentUseCase {
	payment_queue: Arc<PaymentQueue>,
}

impl CreatePaymentUseCase {
	pub fn new(payment_queue: Arc<PaymentQueue>) -> Self {
		Self { payment_queue }
	}

	pub async fn execute(
		&self,
		command: CreatePaymentCommand,
	) -> Result<(), CreatePaymentError> {
		let payment = Payment {
			correlation_id: command.correlation_id,
			amount:         command.amount,
		};
		payment.validate().map_err(CreatePaymentError::Invalid)?;

		self.payment_queue
			.enqueue(payment)
			.await
			.map_err(|e| match e {
				EnqueueError::Full => CreatePaymentError::Overloaded,
				EnqueueError::Closed => CreatePaymentError::ShuttingDown,
			})
	}
}
