use crate::domain::{
    Appointment, AppointmentId, BarberId, BlockedSlot, CustomerId, SlotKey, SlotStatus,
    availability, calendar,
};
use chrono::NaiveDate;

use super::booking_service::{ServiceDependencies, resolve_barber};
use super::errors::{BookingApplicationError, Result};

/// グリッド上の1枠の分類
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAvailability {
    pub key: SlotKey,
    pub status: SlotStatus,
}

/// 理容師の1週間の空き状況
#[derive(Debug, Clone)]
pub struct WeeklyAvailability {
    pub barber_id: BarberId,
    pub week_start: NaiveDate,
    /// 日ごと、時刻ごとの順：7 × 11件
    pub slots: Vec<SlotAvailability>,
}

/// `reference`を含む週の全枠を分類する。
///
/// 全枠を1つのスナップショットと1回の時刻読み取りで分類する。
///
/// # エラー
/// - `InvalidRequest`: 今週より前の週
/// - `BarberNotFound`: 存在しない理容師
pub async fn weekly_availability(
    deps: &ServiceDependencies,
    barber_id: BarberId,
    reference: NaiveDate,
) -> Result<WeeklyAvailability> {
    let week_start = calendar::week_start(reference);
    let now = deps.clock.local_now();

    calendar::ensure_not_past_week(week_start, now.date()).map_err(|_| {
        BookingApplicationError::InvalidRequest(format!(
            "week of {} is before the current week",
            week_start
        ))
    })?;

    resolve_barber(deps, barber_id).await?;

    let days = calendar::days_of(week_start);
    let times = calendar::time_slots();
    let slots: Vec<SlotAvailability> = deps
        .ledger
        .read(|schedule| {
            days.iter()
                .flat_map(|date| times.iter().map(move |time| SlotKey::new(barber_id, *date, *time)))
                .map(|key| SlotAvailability {
                    key,
                    status: availability::classify(schedule, &key, now),
                })
                .collect()
        })
        .await;

    Ok(WeeklyAvailability {
        barber_id,
        week_start,
        slots,
    })
}

pub async fn get_appointment(
    deps: &ServiceDependencies,
    appointment_id: AppointmentId,
) -> Result<Appointment> {
    deps.ledger
        .appointment(appointment_id)
        .await
        .ok_or(BookingApplicationError::AppointmentNotFound(appointment_id))
}

/// 理容師の全予約（ID順）
pub async fn appointments_for_barber(
    deps: &ServiceDependencies,
    barber_id: BarberId,
) -> Vec<Appointment> {
    deps.ledger
        .read(|schedule| schedule.appointments_for_barber(barber_id))
        .await
}

pub async fn appointments_for_customer(
    deps: &ServiceDependencies,
    customer_id: CustomerId,
) -> Vec<Appointment> {
    deps.ledger
        .read(|schedule| schedule.appointments_for_customer(customer_id))
        .await
}

pub async fn blocks_for_barber(deps: &ServiceDependencies, barber_id: BarberId) -> Vec<BlockedSlot> {
    deps.ledger
        .read(|schedule| schedule.blocks_for_barber(barber_id))
        .await
}
