use crate::application::booking::BookingApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー
///
/// アプリケーション層のエラー、または境界で検出した不正なリクエストを包み、
/// HTTPレスポンスに変換する。
#[derive(Debug)]
pub enum ApiError {
    Application(BookingApplicationError),
    BadRequest(String),
}

impl From<BookingApplicationError> for ApiError {
    fn from(err: BookingApplicationError) -> Self {
        ApiError::Application(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::BadRequest(message) => {
                let body = Json(ErrorResponse::new("BAD_REQUEST", message));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            ApiError::Application(err) => err,
        };

        let slot = err.slot();
        let (status, error_type) = match &err {
            // 409 Conflict - 枠の現在の状態では変更できない
            BookingApplicationError::SlotUnavailable(_) => (StatusCode::CONFLICT, "SLOT_UNAVAILABLE"),
            BookingApplicationError::AlreadyBlocked(_) => (StatusCode::CONFLICT, "ALREADY_BLOCKED"),
            BookingApplicationError::SlotInPast(_) => (StatusCode::CONFLICT, "SLOT_IN_PAST"),

            // 404 Not Found
            BookingApplicationError::SlotNotBlocked(_) => (StatusCode::NOT_FOUND, "SLOT_NOT_BLOCKED"),
            BookingApplicationError::AppointmentNotFound(_)
            | BookingApplicationError::PromotionNotFound(_)
            | BookingApplicationError::ServiceNotFound(_)
            | BookingApplicationError::ProductNotFound(_)
            | BookingApplicationError::BarberNotFound(_)
            | BookingApplicationError::CustomerNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),

            BookingApplicationError::InvalidRange => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_RANGE")
            }
            BookingApplicationError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),

            // 500 - 詳細はログにのみ残す
            BookingApplicationError::LedgerStoreError(e) => {
                tracing::error!("Ledger store error: {}", e);
                return internal_error("LEDGER_STORE_ERROR", "Failed to persist the change");
            }
            BookingApplicationError::CatalogServiceError(e) => {
                tracing::error!("Catalog service error: {}", e);
                return internal_error("CATALOG_SERVICE_ERROR", "Catalog service error");
            }
            BookingApplicationError::UserDirectoryError(e) => {
                tracing::error!("User directory error: {}", e);
                return internal_error("USER_DIRECTORY_ERROR", "User directory error");
            }
            BookingApplicationError::PromotionCatalogError(e) => {
                tracing::error!("Promotion catalog error: {}", e);
                return internal_error("PROMOTION_CATALOG_ERROR", "Promotion catalog error");
            }
        };

        let body = Json(ErrorResponse::new(error_type, err.to_string()).with_slot(slot));
        (status, body).into_response()
    }
}

fn internal_error(error_type: &str, message: &str) -> Response {
    let body = Json(ErrorResponse::new(error_type, message));
    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}
