use actix_web::{HttpResponse, Responder, ResponseError, post, web};
use log::{error, info};

use crate::adapters::web::errors::ApiError;
use crate::adapters::web::schema::PurgeResponse;
use crate::domain::repository::DynPaymentRepository;
use crate::use_cases::purge_payments::PurgePaymentsUseCase;

#[post("/purge-payments")]
pub async fn payments_purge(
	purge_payments_use_case: web::Data<PurgePaymentsUseCase<DynPaymentRepository>>,
) -> impl Responder {
	info!("Received request to purge payments");

	match purge_payments_use_case.execute().await {
		Ok(()) => HttpResponse::Ok().json(PurgeResponse {
			message: "payments purged",
		}),
		Err(e) => {
			error!("Failed to purge payments: {e}");
			ApiError::Internal.error_response()
		}
	}
}
