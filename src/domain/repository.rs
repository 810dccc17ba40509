use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::payment::ProcessedPayment;
use crate::domain::summary::AggregatedSummary;

/// The persistent store of processed payments. Writes upsert on the
/// correlation id, so delivering the same payment twice stores one row.
#[async_trait]
pub trait PaymentRepository: Send + Sync + 'static {
	async fn save(
		&self,
		payment: &ProcessedPayment,
	) -> Result<(), Box<dyn std::error::Error + Send>>;

	/// Per-gateway totals over the inclusive `[from, to]` window. A missing
	/// bound is unbounded on that side; an empty window yields zeros.
	async fn summary(
		&self,
		from: Option<DateTime<Utc>>,
		to: Option<DateTime<Utc>>,
	) -> Result<AggregatedSummary, Box<dyn std::error::Error + Send>>;

	async fn clear(&self) -> Result<(), Box<dyn std::error::Error + Send>>;
}

pub type DynPaymentRepository = Arc<dyn PaymentRepository>;

#[async_trait]
impl PaymentRepository for DynPaymentRepository {
	async fn save(
		&self,
		payment: &ProcessedPayment,
	) -> Result<(), Box<dyn std::error::Error + Send>> {
		self.as_ref().save(payment).await
	}

	async fn summary(
		&self,
		from: Option<DateTime<Utc>>,
		to: Option<DateTime<Utc>>,
	) -> Result<AggregatedSummary, Box<dyn std::error::Error + Send>> {
		self.as_ref().summary(from, to).await
	}

	async fn clear(&self) -> Result<(), Box<dyn std::error::Error + Send>> {
		self.as_ref().clear().await
	}
}
