use chrono::{DateTime, Utc};
use derive_more::derive::{Display, Error};
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::gateway::GatewayType;
use crate::domain::health::GatewayHealth;
use crate::domain::payment::Payment;

#[derive(Debug, Display, Error)]
pub enum ProcessorError {
	#[display("processor returned status {_0}")]
	Status(#[error(not(source))] u16),
	#[display("processor request failed: {_0}")]
	Transport(reqwest::Error),
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
	#[serde(rename = "correlationId")]
	correlation_id: &'a str,
	amount:         f64,
	#[serde(rename = "requestedAt")]
	requested_at:   DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ServiceHealthResponse {
	failing:           bool,
	#[serde(rename = "minResponseTime")]
	min_response_time: i64,
}

/// Stateless wrapper around one remote processor's HTTP API. Retries are the
/// work queue's responsibility, never the client's.
#[derive(Clone)]
pub struct ProcessorClient {
	gateway:  GatewayType,
	base_url: String,
	http:     Client,
}

impl ProcessorClient {
	pub fn new(gateway: GatewayType, base_url: &str, http: Client) -> Self {
		Self {
			gateway,
			base_url: base_url.trim_end_matches('/').to_string(),
			http,
		}
	}

	pub fn gateway(&self) -> GatewayType {
		self.gateway
	}

	/// Submits one payment. Any non-2xx status or transport error is a
	/// processor failure; the timestamp must already be stamped by the caller.
	pub async fn submit(
		&self,
		payment: &Payment,
		requested_at: DateTime<Utc>,
	) -> Result<(), ProcessorError> {
		let body = SubmitRequest {
			correlation_id: &payment.correlation_id,
			amount:         payment.amount,
			requested_at,
		};

		let response = self
			.http
			.post(format!("{}/payments", self.base_url))
			.json(&body)
			.send()
			.await
			.map_err(ProcessorError::Transport)?;

		if response.status().is_success() {
			Ok(())
		} else {
			Err(ProcessorError::Status(response.status().as_u16()))
		}
	}

	/// Probes the processor's health endpoint. Any failure to reach or parse
	/// it counts as an unhealthy tick; a reported `minResponseTime` of zero
	/// or less is clamped to one.
	pub async fn probe(&self) -> GatewayHealth {
		let health_url = format!("{}/payments/service-health", self.base_url);

		let response = match self.http.get(&health_url).send().await {
			Ok(response) if response.status().is_success() => response,
			Ok(response) => {
				error!(
					"Health probe for {} returned status {}",
					self.gateway,
					response.status()
				);
				return GatewayHealth::unhealthy(self.gateway);
			}
			Err(e) => {
				error!("Health probe for {} failed: {e}", self.gateway);
				return GatewayHealth::unhealthy(self.gateway);
			}
		};

		match response.json::<ServiceHealthResponse>().await {
			Ok(body) => GatewayHealth {
				gateway:              self.gateway,
				healthy:              !body.failing,
				min_response_time_ms: body.min_response_time.max(1) as u64,
				last_check:           Utc::now(),
			},
			Err(e) => {
				error!("Health probe for {} returned malformed body: {e}", self.gateway);
				GatewayHealth::unhealthy(self.gateway)
			}
		}
	}
}

/// The pair of processor clients the workers and the prober share.
pub struct ProcessorClients {
	default:  ProcessorClient,
	fallback: ProcessorClient,
}

impl ProcessorClients {
	pub fn new(http: Client, default_url: &str, fallback_url: &str) -> Self {
		Self {
			default:  ProcessorClient::new(GatewayType::Default, default_url, http.clone()),
			fallback: ProcessorClient::new(GatewayType::Fallback, fallback_url, http),
		}
	}

	pub fn get(&self, gateway: GatewayType) -> &ProcessorClient {
		match gateway {
			GatewayType::Default => &self.default,
			GatewayType::Fallback => &self.fallback,
		}
	}
}
