pub mod gateway;
pub mod health;
pub mod payment;
pub mod queue;
pub mod repository;
pub mod shared_state;
pub mod summary;
