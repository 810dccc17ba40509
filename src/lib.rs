use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use anyhow::Result;
use log::{info, warn};
use tokio::sync::watch;

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod use_cases;

use crate::adapters::web::health_handler::health;
use crate::adapters::web::payments_handler::payments;
use crate::adapters::web::payments_purge_handler::payments_purge;
use crate::adapters::web::payments_summary_handler::payments_summary;
use crate::domain::repository::DynPaymentRepository;
use crate::infrastructure::config::settings::Settings;
use crate::infrastructure::persistence::in_memory_payment_repository::InMemoryPaymentRepository;
use crate::infrastructure::persistence::postgres_payment_repository::PostgresPaymentRepository;
use crate::infrastructure::persistence::redis_shared_state::RedisSharedState;
use crate::infrastructure::processors::client::ProcessorClients;
use crate::infrastructure::queue::payment_queue::{PaymentQueue, QueueSettings};
use crate::infrastructure::routing::gateway_selector::{
	GatewaySelector, selector_refresh_loop,
};
use crate::infrastructure::workers::health_prober::health_prober_loop;
use crate::infrastructure::workers::payment_worker::{
	pool_size, spawn_worker_pool,
};
use crate::use_cases::create_payment::CreatePaymentUseCase;
use crate::use_cases::get_payment_summary::GetPaymentSummaryUseCase;
use crate::use_cases::process_payment::ProcessPaymentUseCase;
use crate::use_cases::purge_payments::PurgePaymentsUseCase;

pub async fn run(settings: Settings) -> Result<()> {
	let worker_count = pool_size(settings.worker_multiplier);

	let payment_repo: DynPaymentRepository = if settings.uses_in_memory_store() {
		info!("Using in-memory payment store");
		Arc::new(InMemoryPaymentRepository::new())
	} else {
		Arc::new(
			PostgresPaymentRepository::connect(
				&settings.conn_string,
				worker_count + 4,
			)
			.await?,
		)
	};

	let redis_client = redis::Client::open(settings.redis_url.clone())?;
	let shared_state = Arc::new(RedisSharedState::new(redis_client));

	let http_client = reqwest::Client::builder()
		.timeout(Duration::from_secs(settings.processor_timeout_secs))
		.build()?;
	let processor_clients = Arc::new(ProcessorClients::new(
		http_client,
		&settings.gateway_default_url,
		&settings.gateway_fallback_url,
	));

	let payment_queue = PaymentQueue::start(QueueSettings::from_settings(&settings));
	let selector = GatewaySelector::new();
	let (shutdown_tx, shutdown_rx) = watch::channel(false);

	let mut background_tasks = Vec::new();

	info!("Starting gateway selector refresh task");
	background_tasks.push(tokio::spawn(selector_refresh_loop(
		selector.clone(),
		Arc::clone(&shared_state),
		Duration::from_millis(settings.selector_refresh_ms),
		shutdown_rx.clone(),
	)));

	info!("Starting health prober");
	background_tasks.push(tokio::spawn(health_prober_loop(
		Arc::clone(&shared_state),
		Arc::clone(&processor_clients),
		selector.clone(),
		Duration::from_secs(settings.probe_interval_secs),
		Duration::from_secs(settings.lock_ttl_secs),
		shutdown_rx.clone(),
	)));

	info!("Starting {worker_count} payment workers");
	let process_payment_use_case = ProcessPaymentUseCase::new(
		payment_repo.clone(),
		Arc::clone(&processor_clients),
	);
	background_tasks.extend(spawn_worker_pool(
		worker_count,
		Arc::clone(&payment_queue),
		selector.clone(),
		process_payment_use_case,
		shutdown_rx.clone(),
	));

	let create_payment_use_case =
		CreatePaymentUseCase::new(Arc::clone(&payment_queue));
	let get_payment_summary_use_case =
		GetPaymentSummaryUseCase::new(payment_repo.clone());
	let purge_payments_use_case = PurgePaymentsUseCase::new(
		payment_repo.clone(),
		Arc::clone(&payment_queue),
	);

	info!("Starting HTTP server on 0.0.0.0:{}", settings.server_port);
	HttpServer::new(move || {
		App::new()
			.app_data(web::Data::new(create_payment_use_case.clone()))
			.app_data(web::Data::new(get_payment_summary_use_case.clone()))
			.app_data(web::Data::new(purge_payments_use_case.clone()))
			.service(payments)
			.service(payments_summary)
			.service(payments_purge)
			.service(health)
	})
	.bind(("0.0.0.0", settings.server_port))?
	.run()
	.await?;

	info!("HTTP server stopped, shutting down background tasks");
	payment_queue.close();
	let _ = shutdown_tx.send(true);

	let grace = Duration::from_secs(settings.shutdown_grace_secs);
	if tokio::time::timeout(grace, futures::future::join_all(background_tasks))
		.await
		.is_err()
	{
		warn!(
			"Background tasks still running after the {}s shutdown grace period",
			settings.shutdown_grace_secs
		);
	}

	Ok(())
}
