pub mod config;
pub mod persistence;
pub mod processors;
pub mod queue;
pub mod routing;
pub mod workers;
