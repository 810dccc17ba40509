use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use actix_web::{App, HttpResponse, web};
use serde_json::json;

/// Scripted behaviour of a stub payment processor.
pub struct StubProcessorState {
	pub failing:           AtomicBool,
	pub min_response_time: AtomicI64,
	pub health_http_error: AtomicBool,
	pub fail_first:        AtomicUsize,
	pub submits:           AtomicUsize,
	pub accepted:          AtomicUsize,
	pub health_hits:       AtomicUsize,
	pub last_submit:       Mutex<Option<serde_json::Value>>,
}

impl StubProcessorState {
	pub fn healthy(min_response_time: i64) -> Arc<Self> {
		Arc::new(Self {
			failing:           AtomicBool::new(false),
			min_response_time: AtomicI64::new(min_response_time),
			health_http_error: AtomicBool::new(false),
			fail_first:        AtomicUsize::new(0),
			submits:           AtomicUsize::new(0),
			accepted:          AtomicUsize::new(0),
			health_hits:       AtomicUsize::new(0),
			last_submit:       Mutex::new(None),
		})
	}

	pub fn down() -> Arc<Self> {
		let state = Self::healthy(1);
		state.failing.store(true, Ordering::SeqCst);
		state
	}

	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}

	pub fn set_fail_first(&self, failures: usize) {
		self.fail_first.store(failures, Ordering::SeqCst);
	}

	pub fn submits(&self) -> usize {
		self.submits.load(Ordering::SeqCst)
	}

	pub fn accepted(&self) -> usize {
		self.accepted.load(Ordering::SeqCst)
	}

	pub fn health_hits(&self) -> usize {
		self.health_hits.load(Ordering::SeqCst)
	}
}

/// An in-process payment processor speaking the real wire protocol on an
/// ephemeral loopback port.
pub struct StubProcessor {
	server:    actix_test::TestServer,
	pub state: Arc<StubProcessorState>,
}

impl StubProcessor {
	pub async fn start(state: Arc<StubProcessorState>) -> Self {
		let app_state = Arc::clone(&state);
		let server = actix_test::start(move || {
			App::new()
				.app_data(web::Data::from(Arc::clone(&app_state)))
				.route("/payments", web::post().to(submit))
				.route("/payments/service-health", web::get().to(service_health))
		});

		Self { server, state }
	}

	pub fn url(&self) -> String {
		format!("http://{}", self.server.addr())
	}
}

async fn submit(
	state: web::Data<StubProcessorState>,
	body: web::Json<serde_json::Value>,
) -> HttpResponse {
	state.submits.fetch_add(1, Ordering::SeqCst);
	*state.last_submit.lock().unwrap() = Some(body.into_inner());

	if state.failing.load(Ordering::SeqCst) {
		return HttpResponse::InternalServerError().finish();
	}

	if state.fail_first.load(Ordering::SeqCst) > 0 {
		state.fail_first.fetch_sub(1, Ordering::SeqCst);
		return HttpResponse::InternalServerError().finish();
	}

	state.accepted.fetch_add(1, Ordering::SeqCst);
	HttpResponse::Ok().json(json!({"message": "payment processed successfully"}))
}

async fn service_health(state: web::Data<StubProcessorState>) -> HttpResponse {
	state.health_hits.fetch_add(1, Ordering::SeqCst);

	if state.health_http_error.load(Ordering::SeqCst) {
		return HttpResponse::InternalServerError().finish();
	}

	HttpResponse::Ok().json(json!({
		"failing": state.failing.load(Ordering::SeqCst),
		"minResponseTime": state.min_response_time.load(Ordering::SeqCst),
	}))
}
