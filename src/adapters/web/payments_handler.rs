use actix_web::{HttpResponse, Responder, ResponseError, post, web};
use log::{info, warn};

use crate::adapters::web::errors::ApiError;
use crate::adapters::web::schema::PaymentRequest;
use crate::use_cases::create_payment::CreatePaymentUseCase;
use crate::use_cases::dto::CreatePaymentCommand;

#[post("/payments")]
pub async fn payments(
	payload: web::Json<PaymentRequest>,
	create_payment_use_case: web::Data<CreatePaymentUseCase>,
) -> impl Responder {
	let command = CreatePaymentCommand {
		correlation_id: payload.0.correlation_id,
		amount:         payload.0.amount,
	};

	match create_payment_use_case.execute(command).await {
		Ok(()) => {
			info!("Payment accepted and queued");
			HttpResponse::Ok().finish()
		}
		Err(e) => {
			warn!("Payment rejected: {e}");
			ApiError::from(e).error_response()
		}
	}
}
