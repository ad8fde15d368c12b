//! 理容師・日付・時刻ごとに有効な予約を最大1件、ブロックを最大1件に
//! 保つための検査。
//!
//! スケジュールのスナップショットに対する純粋な読み取り。呼び出し側は
//! 検査から確定まで枠の排他ロックを保持すること。

use chrono::NaiveDateTime;

use super::{
    Appointment, AppointmentStatus, BlockedSlot, Schedule, SlotConflict, SlotKey, appointment,
    availability::{classify, is_past},
};

/// 予約にはFreeの枠が必要。
pub fn check_reservable(
    schedule: &Schedule,
    key: &SlotKey,
    now: NaiveDateTime,
) -> Result<(), SlotConflict> {
    if !classify(schedule, key, now).is_free() {
        return Err(SlotConflict::SlotUnavailable(*key));
    }
    Ok(())
}

/// ブロックには、まずブロックがないこと、次に予約済みでも経過済みでもないことが必要。
pub fn check_blockable(
    schedule: &Schedule,
    key: &SlotKey,
    now: NaiveDateTime,
) -> Result<(), SlotConflict> {
    if schedule.block_at(key).is_some() {
        return Err(SlotConflict::AlreadyBlocked(*key));
    }
    if !classify(schedule, key, now).is_free() {
        return Err(SlotConflict::SlotUnavailable(*key));
    }
    Ok(())
}

/// ブロック解除には、経過していない枠に既存のブロックが必要。
pub fn check_unblockable(
    schedule: &Schedule,
    key: &SlotKey,
    now: NaiveDateTime,
) -> Result<BlockedSlot, SlotConflict> {
    let block = schedule
        .block_at(key)
        .ok_or(SlotConflict::SlotNotBlocked(*key))?;
    if is_past(key, now) {
        return Err(SlotConflict::SlotInPast(*key));
    }
    Ok(block.clone())
}

/// CancelledまたはCompletedの予約を再度有効にするステータス書き込みは、
/// 枠がFreeである必要がある。その他の書き込みは制限しない。
pub fn check_status_change(
    schedule: &Schedule,
    current: &Appointment,
    status: AppointmentStatus,
    now: NaiveDateTime,
) -> Result<(), SlotConflict> {
    if appointment::reactivates(current, status) {
        check_reservable(schedule, &current.key(), now)?;
    }
    Ok(())
}
