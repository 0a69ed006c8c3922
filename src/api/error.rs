use actix_web::error::{JsonPayloadError, PathError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};

use crate::domain::cart::CartError;
use crate::domain::order::OrderError;

// ============================================================================
// API Errors - Domain errors mapped to HTTP responses
// ============================================================================
//
// Every error body is `{"message": "..."}`.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication credentials were not provided.")]
    NotAuthenticated,

    #[error("You are not authorized to perform this action.")]
    NotAuthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("The order could not be placed, please retry.")]
    TransactionFailure,

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ApiError::NotAuthorized => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::TransactionFailure => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "message": self.to_string()
        }))
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotAuthorized => ApiError::NotAuthorized,
            OrderError::NotFound(_) => ApiError::NotFound("Not found.".to_string()),
            OrderError::EmptyCart
            | OrderError::InvalidBody(_)
            | OrderError::TotalTooLarge(_)
            | OrderError::NotDeliveryCrew(_) => ApiError::BadRequest(err.to_string()),
            OrderError::TransactionFailure(source) => {
                tracing::error!(error = %source, "Checkout transaction failed");
                ApiError::TransactionFailure
            }
            OrderError::Storage(source) => {
                tracing::error!(error = %source, "Order storage error");
                ApiError::Internal(source)
            }
        }
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::MenuItemNotFound(_)
            | CartError::InvalidQuantity(_)
            | CartError::AmountTooLarge(_) => ApiError::BadRequest(err.to_string()),
            CartError::Storage(source) => {
                tracing::error!(error = %source, "Cart storage error");
                ApiError::Internal(source)
            }
        }
    }
}

/// `JsonConfig` error handler: body extraction failures get the usual body.
pub fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(err.to_string()).into()
}

/// `PathConfig` error handler.
pub fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(err.to_string()).into()
}
