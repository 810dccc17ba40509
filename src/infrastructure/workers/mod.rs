pub mod health_prober;
pub mod payment_worker;
