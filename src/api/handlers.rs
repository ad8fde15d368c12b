use crate::application::booking::{self as booking, ServiceDependencies};
use crate::domain::{
    Appointment, AppointmentId, BarberId, BlockedSlot, CustomerId, PriceQuote, Promotion,
    PromotionId,
    commands::{CancelAppointment, ChangeAppointmentStatus},
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use super::{
    error::ApiError,
    extract::{JsonBody, PathParam, QueryParams},
    types::{
        AppointmentCreatedResponse, AvailabilityQuery, BarberQuery, BlockSlotRequest,
        ChangeStatusRequest, CreatePromotionRequest, ListAppointmentsQuery, ReserveSlotRequest,
        SelectionQuery, SlotAvailabilityResponse, UnblockSlotRequest, UpdatePromotionRequest,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Availability
// ============================================================================

/// GET /availability - 理容師の1週間の全枠を分類
///
/// 日付順、時刻順に並んだ7 × 11のグリッドを返す。
/// 今週より前の週は拒否する。
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<AvailabilityQuery>,
) -> Result<Json<Vec<SlotAvailabilityResponse>>, ApiError> {
    let reference = query
        .week_start
        .unwrap_or_else(|| state.service_deps.clock.local_now().date());

    let week = booking::weekly_availability(
        &state.service_deps,
        BarberId::new(query.barber_id),
        reference,
    )
    .await?;

    Ok(Json(
        week.slots
            .into_iter()
            .map(SlotAvailabilityResponse::from)
            .collect(),
    ))
}

// ============================================================================
// Appointments
// ============================================================================

/// POST /appointments - 枠を予約
///
/// 枠が予約済み、ブロック済み、または経過済みなら409。
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<ReserveSlotRequest>,
) -> Result<(StatusCode, Json<AppointmentCreatedResponse>), ApiError> {
    let confirmation = booking::reserve_slot(&state.service_deps, req.to_command()).await?;
    Ok((StatusCode::CREATED, Json(confirmation.into())))
}

/// POST /appointments/:id/cancel
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    PathParam(appointment_id): PathParam<i64>,
) -> Result<Json<Appointment>, ApiError> {
    let cmd = CancelAppointment {
        appointment_id: AppointmentId::new(appointment_id),
    };
    let appointment = booking::cancel_appointment(&state.service_deps, cmd).await?;
    Ok(Json(appointment))
}

/// POST /appointments/:id/status
pub async fn change_appointment_status(
    State(state): State<Arc<AppState>>,
    PathParam(appointment_id): PathParam<i64>,
    JsonBody(req): JsonBody<ChangeStatusRequest>,
) -> Result<Json<Appointment>, ApiError> {
    let cmd = ChangeAppointmentStatus {
        appointment_id: AppointmentId::new(appointment_id),
        status: req.status,
    };
    let appointment = booking::change_appointment_status(&state.service_deps, cmd).await?;
    Ok(Json(appointment))
}

/// GET /appointments/:id
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    PathParam(appointment_id): PathParam<i64>,
) -> Result<Json<Appointment>, ApiError> {
    let appointment =
        booking::get_appointment(&state.service_deps, AppointmentId::new(appointment_id)).await?;
    Ok(Json(appointment))
}

/// GET /appointments - 理容師別または顧客別
///
/// `barberId`と`customerId`のどちらか一方だけが必要。
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<ListAppointmentsQuery>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let appointments = match (query.barber_id, query.customer_id) {
        (Some(barber_id), None) => {
            booking::appointments_for_barber(&state.service_deps, BarberId::new(barber_id)).await
        }
        (None, Some(customer_id)) => {
            booking::appointments_for_customer(&state.service_deps, CustomerId::new(customer_id))
                .await
        }
        _ => {
            return Err(ApiError::BadRequest(
                "exactly one of barberId and customerId is required".to_string(),
            ));
        }
    };
    Ok(Json(appointments))
}

// ============================================================================
// Blocks
// ============================================================================

/// POST /blocks - 枠を予約対象から外す
pub async fn create_block(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<BlockSlotRequest>,
) -> Result<(StatusCode, Json<BlockedSlot>), ApiError> {
    let block = booking::block_slot(&state.service_deps, req.to_command()).await?;
    Ok((StatusCode::CREATED, Json(block)))
}

/// DELETE /blocks - ブロックを解除
///
/// ブロックがなければ404、枠が開始済みなら409。
pub async fn delete_block(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<UnblockSlotRequest>,
) -> Result<StatusCode, ApiError> {
    booking::unblock_slot(&state.service_deps, req.to_command()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /blocks?barberId
pub async fn list_blocks(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<BarberQuery>,
) -> Result<Json<Vec<BlockedSlot>>, ApiError> {
    let barber_id = query
        .barber_id
        .ok_or_else(|| ApiError::BadRequest("barberId query parameter is required".to_string()))?;

    let blocks = booking::blocks_for_barber(&state.service_deps, BarberId::new(barber_id)).await;
    Ok(Json(blocks))
}

// ============================================================================
// Promotions and pricing
// ============================================================================

/// GET /promotions/applicable - 選択内容に適用されるプロモーション、なければnull
pub async fn get_applicable_promotion(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<SelectionQuery>,
) -> Result<Json<Option<Promotion>>, ApiError> {
    let product_ids = query.product_ids().map_err(ApiError::BadRequest)?;
    let promotion =
        booking::find_applicable_promotion(&state.service_deps, query.service_id(), &product_ids)
            .await?;
    Ok(Json(promotion))
}

/// GET /promotions
pub async fn list_promotions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Promotion>>, ApiError> {
    Ok(Json(booking::list_promotions(&state.service_deps).await?))
}

/// GET /promotions/:id
pub async fn get_promotion(
    State(state): State<Arc<AppState>>,
    PathParam(promotion_id): PathParam<i64>,
) -> Result<Json<Promotion>, ApiError> {
    let promotion =
        booking::get_promotion(&state.service_deps, PromotionId::new(promotion_id)).await?;
    Ok(Json(promotion))
}

/// POST /promotions
///
/// 期間の終了が開始より前なら422。
pub async fn create_promotion(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreatePromotionRequest>,
) -> Result<(StatusCode, Json<Promotion>), ApiError> {
    let promotion =
        booking::register_promotion(&state.service_deps, req.to_new_promotion()).await?;
    Ok((StatusCode::CREATED, Json(promotion)))
}

/// PATCH /promotions/:id - 割引率、期間、有効フラグを編集
///
/// 編集後のプロモーションは新規登録と同じく検証する。
pub async fn update_promotion(
    State(state): State<Arc<AppState>>,
    PathParam(promotion_id): PathParam<i64>,
    JsonBody(req): JsonBody<UpdatePromotionRequest>,
) -> Result<Json<Promotion>, ApiError> {
    let promotion = booking::update_promotion(
        &state.service_deps,
        PromotionId::new(promotion_id),
        req.to_changes(),
    )
    .await?;
    Ok(Json(promotion))
}

/// DELETE /promotions/:id
pub async fn delete_promotion(
    State(state): State<Arc<AppState>>,
    PathParam(promotion_id): PathParam<i64>,
) -> Result<StatusCode, ApiError> {
    booking::delete_promotion(&state.service_deps, PromotionId::new(promotion_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /pricing/quote
pub async fn get_quote(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<SelectionQuery>,
) -> Result<Json<PriceQuote>, ApiError> {
    let product_ids = query.product_ids().map_err(ApiError::BadRequest)?;
    let quote = booking::quote_price(&state.service_deps, query.service_id(), &product_ids).await?;
    Ok(Json(quote))
}

// ============================================================================
// Change events
// ============================================================================

/// GET /events - 台帳の変更ごとに1件のServer-Sent Events
///
/// `barberId`で1人の理容師に絞り込む。遅れた購読者は
/// 取りこぼしたイベントを読み飛ばす。
pub async fn stream_events(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<BarberQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let barber_id = query.barber_id.map(BarberId::new);
    let rx = state.service_deps.ledger.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("event subscriber lagged: {}", e);
                return None;
            }
        };
        if barber_id.is_some_and(|id| event.key().barber_id != id) {
            return None;
        }
        match Event::default().event(event.event_type()).json_data(&event) {
            Ok(sse_event) => Some(Ok::<Event, Infallible>(sse_event)),
            Err(e) => {
                tracing::error!("failed to encode change event: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
