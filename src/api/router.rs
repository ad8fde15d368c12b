use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, cancel_appointment, change_appointment_status, create_appointment, create_block,
    create_promotion, delete_block, delete_promotion, get_applicable_promotion, get_appointment,
    get_availability, get_promotion, get_quote, list_appointments, list_blocks, list_promotions,
    stream_events, update_promotion,
};

/// APIルーターを作成
///
/// コマンド:
/// - POST /appointments, POST /appointments/:id/cancel, POST /appointments/:id/status
/// - POST /blocks, DELETE /blocks
/// - POST /promotions, PATCH /promotions/:id, DELETE /promotions/:id
///
/// クエリ:
/// - GET /availability, GET /appointments, GET /appointments/:id, GET /blocks
/// - GET /promotions, GET /promotions/applicable, GET /promotions/:id, GET /pricing/quote
/// - GET /events (Server-Sent Events)
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/availability", get(get_availability))
        .route(
            "/appointments",
            post(create_appointment).get(list_appointments),
        )
        .route("/appointments/:id", get(get_appointment))
        .route("/appointments/:id/cancel", post(cancel_appointment))
        .route("/appointments/:id/status", post(change_appointment_status))
        .route(
            "/blocks",
            post(create_block).delete(delete_block).get(list_blocks),
        )
        .route("/promotions", get(list_promotions).post(create_promotion))
        .route("/promotions/applicable", get(get_applicable_promotion))
        .route(
            "/promotions/:id",
            get(get_promotion)
                .patch(update_promotion)
                .delete(delete_promotion),
        )
        .route("/pricing/quote", get(get_quote))
        .route("/events", get(stream_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// ヘルスチェックエンドポイント
async fn health_check() -> &'static str {
    "OK"
}
