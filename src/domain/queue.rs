use crate::domain::payment::Payment;

/// A queued payment together with the number of processing attempts already
/// performed against a gateway. Re-admission after a "no gateway" round does
/// not count as an attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPayment {
	pub payment:       Payment,
	pub attempt_count: u32,
}

impl PendingPayment {
	pub fn new(payment: Payment) -> Self {
		Self {
			payment,
			attempt_count: 0,
		}
	}
}
