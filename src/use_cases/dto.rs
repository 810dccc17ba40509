use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct CreatePaymentCommand {
	pub correlation_id: String,
	pub amount:         f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryQuery {
	pub from: Option<DateTime<Utc>>,
	pub to:   Option<DateTime<Utc>>,
}
