#![allow(dead_code)]

pub mod shared_state;
pub mod stub_processor;

use std::sync::Arc;
use std::time::Duration;

use payment_proxy::domain::repository::DynPaymentRepository;
use payment_proxy::domain::summary::AggregatedSummary;
use payment_proxy::infrastructure::persistence::in_memory_payment_repository::InMemoryPaymentRepository;
use payment_proxy::infrastructure::queue::payment_queue::{
	PaymentQueue, QueueSettings,
};
use payment_proxy::use_cases::create_payment::CreatePaymentUseCase;
use payment_proxy::use_cases::get_payment_summary::GetPaymentSummaryUseCase;
use payment_proxy::use_cases::purge_payments::PurgePaymentsUseCase;

pub struct TestContext {
	pub queue:   Arc<PaymentQueue>,
	pub repo:    DynPaymentRepository,
	pub create:  CreatePaymentUseCase,
	pub summary: GetPaymentSummaryUseCase<DynPaymentRepository>,
	pub purge:   PurgePaymentsUseCase<DynPaymentRepository>,
}

pub fn test_context(queue_settings: QueueSettings) -> TestContext {
	let queue = PaymentQueue::start(queue_settings);
	let repo: DynPaymentRepository = Arc::new(InMemoryPaymentRepository::new());

	TestContext {
		create:  CreatePaymentUseCase::new(Arc::clone(&queue)),
		summary: GetPaymentSummaryUseCase::new(repo.clone()),
		purge:   PurgePaymentsUseCase::new(repo.clone(), Arc::clone(&queue)),
		queue,
		repo,
	}
}

/// Polls the store until the total request count reaches `expected` or the
/// deadline passes.
pub async fn wait_for_total(
	summary: &GetPaymentSummaryUseCase<DynPaymentRepository>,
	expected: i64,
	deadline: Duration,
) -> AggregatedSummary {
	let started = tokio::time::Instant::now();
	loop {
		let result = summary.execute(Default::default()).await.unwrap();
		let total = result.default.total_requests + result.fallback.total_requests;
		if total >= expected {
			return result;
		}
		if started.elapsed() > deadline {
			panic!(
				"store never reached {expected} payments within {deadline:?}: \
				 {result:?}"
			);
		}
		tokio::time::sleep(Duration::from_millis(25)).await;
	}
}
