use crate::domain::{
    Appointment, BarberId, BlockedSlot, BookingFacts, PriceQuote, SlotKey, calendar, commands::*,
};
use crate::ports::*;
use std::sync::Arc;

use super::errors::{BookingApplicationError, Result};
use super::ledger::AppointmentLedger;
use super::pricing::{price_selection, resolve_products, resolve_service};

/// サービスの依存関係
///
/// 各ユースケース関数に渡すデータ構造。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub ledger: Arc<AppointmentLedger>,
    pub catalog: Arc<dyn CatalogService>,
    pub user_directory: Arc<dyn UserDirectory>,
    pub promotions: Arc<dyn PromotionCatalog>,
    pub calendar_notifier: Arc<dyn CalendarNotifier>,
    pub clock: Arc<dyn Clock>,
}

/// 予約成功時の結果
#[derive(Debug, Clone)]
pub struct BookingConfirmation {
    pub appointment: Appointment,
    pub quote: PriceQuote,
    /// 外部カレンダーの参照。通知に失敗した場合は`None`
    pub calendar_reference: Option<String>,
}

/// 09:00〜19:00のグリッド外のキーを拒否する。
fn ensure_on_grid(key: &SlotKey) -> Result<()> {
    if !calendar::is_bookable_time(key.time) {
        return Err(BookingApplicationError::InvalidRequest(format!(
            "{} is outside opening hours",
            key.time
        )));
    }
    Ok(())
}

/// 予約を受け付けている理容師を取得する。
pub(super) async fn resolve_barber(
    deps: &ServiceDependencies,
    barber_id: BarberId,
) -> Result<Barber> {
    let barber = deps
        .catalog
        .get_barber(barber_id)
        .await
        .map_err(BookingApplicationError::CatalogServiceError)?
        .ok_or(BookingApplicationError::BarberNotFound(barber_id))?;

    if !barber.active {
        return Err(BookingApplicationError::InvalidRequest(format!(
            "barber {} is not taking bookings",
            barber_id
        )));
    }
    Ok(barber)
}

/// 枠を予約する。
///
/// ビジネスルール:
/// - 枠が営業時間のグリッド上にあること
/// - サービス、商品、理容師、顧客が存在し利用可能であること
/// - 枠がFreeであること（経過済み・予約済み・ブロック済みでない）
///
/// 名前と価格は予約時点でカタログから複写する。価格は
/// 予約の確定前に見積もる。カレンダーへの通知は確定後に行い、
/// 失敗してもログに残すだけで予約は取り消さない。
pub async fn reserve_slot(deps: &ServiceDependencies, cmd: ReserveSlot) -> Result<BookingConfirmation> {
    ensure_on_grid(&cmd.key)?;

    // 1. 外部コンテキストの参照
    let service = resolve_service(deps, cmd.service_id).await?;
    let products = resolve_products(deps, &cmd.product_ids).await?;
    let barber = resolve_barber(deps, cmd.key.barber_id).await?;
    let customer = deps
        .user_directory
        .get_customer(cmd.customer_id)
        .await
        .map_err(BookingApplicationError::UserDirectoryError)?
        .ok_or(BookingApplicationError::CustomerNotFound(cmd.customer_id))?;

    // 2. 価格
    let quote = price_selection(deps, &service, &products).await?;

    // 3. 台帳で確定
    let facts = BookingFacts {
        customer_id: customer.id,
        customer_name: customer.name.clone(),
        barber_name: barber.name.clone(),
        service_name: service.name.clone(),
        products,
        note: cmd.note,
    };
    let appointment = deps.ledger.reserve(cmd.key, facts).await?;

    // 4. カレンダー通知
    let calendar_reference = notify_calendar(deps, &appointment, &service, &customer).await;

    Ok(BookingConfirmation {
        appointment,
        quote,
        calendar_reference,
    })
}

async fn notify_calendar(
    deps: &ServiceDependencies,
    appointment: &Appointment,
    service: &Service,
    customer: &Customer,
) -> Option<String> {
    let barber_calendar_identity = match deps
        .user_directory
        .barber_calendar_identity(appointment.barber_id)
        .await
    {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(barber_id = %appointment.barber_id, "calendar identity lookup failed: {}", e);
            None
        }
    };

    let event = BookedEvent {
        appointment_id: appointment.id,
        service_name: service.name.clone(),
        customer_name: customer.name.clone(),
        customer_email: customer.email.clone(),
        barber_name: appointment.barber_name.clone(),
        barber_calendar_identity,
        starts_at: appointment.key().starts_at(),
        duration_minutes: service.duration_minutes,
    };

    match deps.calendar_notifier.booking_created(event).await {
        Ok(reference) => Some(reference),
        Err(e) => {
            tracing::warn!(
                appointment_id = %appointment.id,
                "calendar notification failed: {}",
                e
            );
            None
        }
    }
}

/// 枠をブロックする。
///
/// ビジネスルール:
/// - 枠がグリッド上にあり、理容師が存在すること
/// - 枠にまだブロックがないこと（`AlreadyBlocked`）
/// - 枠が予約済みでも経過済みでもないこと（`SlotUnavailable`）
pub async fn block_slot(deps: &ServiceDependencies, cmd: BlockSlot) -> Result<BlockedSlot> {
    ensure_on_grid(&cmd.key)?;
    resolve_barber(deps, cmd.key.barber_id).await?;

    deps.ledger.block(cmd.key, cmd.reason).await
}

/// ブロックを解除する。
///
/// ビジネスルール:
/// - 枠にブロックが存在すること（`SlotNotBlocked`）
/// - 枠がまだ開始していないこと（`SlotInPast`）
pub async fn unblock_slot(deps: &ServiceDependencies, cmd: UnblockSlot) -> Result<BlockedSlot> {
    deps.ledger.unblock(cmd.key).await
}

/// 予約をキャンセルする。キャンセル済みの予約のキャンセルは成功し、
/// 何も変更しない。
pub async fn cancel_appointment(
    deps: &ServiceDependencies,
    cmd: CancelAppointment,
) -> Result<Appointment> {
    deps.ledger.cancel(cmd.appointment_id).await
}

/// 予約のステータスを書き込む。CancelledまたはCompletedの予約を
/// 再度有効にするには枠がFreeである必要がある。
pub async fn change_appointment_status(
    deps: &ServiceDependencies,
    cmd: ChangeAppointmentStatus,
) -> Result<Appointment> {
    deps.ledger
        .change_status(cmd.appointment_id, cmd.status)
        .await
}
