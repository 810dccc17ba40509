use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, error};
use derive_more::derive::{Display, Error};
use serde::Serialize;

use crate::use_cases::create_payment::CreatePaymentError;

#[derive(Serialize)]
struct ErrorResponse {
	#[serde(rename = "statusCode")]
	status_code: u16,
	error:       String,
	message:     String,
}

#[derive(Debug, Display, Error)]
pub enum ApiError {
	#[display("Request data is invalid.")]
	BadClientData,
	#[display("The payment queue is at capacity.")]
	Overloaded,
	#[display("The service is shutting down.")]
	ShuttingDown,
	#[display("Internal server error.")]
	Internal,
}

impl ApiError {
	pub fn name(&self) -> String {
		match self {
			ApiError::BadClientData => "Bad Request".to_string(),
			ApiError::Overloaded => "Service Unavailable".to_string(),
			ApiError::ShuttingDown => "Service Unavailable".to_string(),
			ApiError::Internal => "Internal Server Error".to_string(),
		}
	}
}

impl error::ResponseError for ApiError {
	fn error_response(&self) -> HttpResponse {
		HttpResponse::build(self.status_code())
			.content_type(ContentType::json())
			.json(ErrorResponse {
				status_code: self.status_code().as_u16(),
				error:       self.to_string(),
				message:     self.name(),
			})
	}

	fn status_code(&self) -> StatusCode {
		match self {
			ApiError::BadClientData => StatusCode::BAD_REQUEST,
			ApiError::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
			ApiError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
			ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl From<CreatePaymentError> for ApiError {
	fn from(e: CreatePaymentError) -> Self {
		match e {
			CreatePaymentError::Invalid(_) => ApiError::BadClientData,
			CreatePaymentError::Overloaded => ApiError::Overloaded,
			CreatePaymentError::ShuttingDown => ApiError::ShuttingDown,
		}
	}
}
