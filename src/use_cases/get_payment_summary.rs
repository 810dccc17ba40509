use crate::domain::repository::PaymentRepository;
use crate::domain::summary::AggregatedSummary;
use crate::use_cases::dto::SummaryQuery;

#[derive(Clone)]
pub struct GetPaymentSummaryUseCase<R: PaymentRepository> {
	payment_repo: R,
}

impl<R: PaymentRepository> GetPaymentSummaryUseCase<R> {
	pub fn new(payment_repo: R) -> Self {
		Self { payment_repo }
	}

	pub async fn execute(
		&self,
		query: SummaryQuery,
	) -> Result<AggregatedSummary, Box<dyn std::error::Error + Send>> {
		let mut summary = self.payment_repo.summary(query.from, query.to).await?;
		summary.round_amounts();
		Ok(summary)
	}
}
