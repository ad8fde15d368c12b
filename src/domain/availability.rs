use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Appointment, BlockedSlot, Schedule, SlotKey};

/// 枠の空き状況の判定。
///
/// `Past`は時計から導出され永続化されない。`Booked`と`Blocked`は
/// 枠を占有しているレコードを持つ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotStatus {
    Past,
    Booked(Appointment),
    Blocked(BlockedSlot),
    Free,
}

/// ペイロードを除いた判定の外部表現
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    Past,
    Booked,
    Blocked,
    Free,
}

impl SlotStatus {
    pub fn state(&self) -> SlotState {
        match self {
            SlotStatus::Past => SlotState::Past,
            SlotStatus::Booked(_) => SlotState::Booked,
            SlotStatus::Blocked(_) => SlotState::Blocked,
            SlotStatus::Free => SlotState::Free,
        }
    }

    /// 新規予約を受け付けるのは空き枠だけ。
    pub fn is_free(&self) -> bool {
        matches!(self, SlotStatus::Free)
    }
}

/// 枠の開始が`now`（店舗の現地時刻）より厳密に前かどうか。
pub fn is_past(key: &SlotKey, now: NaiveDateTime) -> bool {
    key.starts_at() < now
}

/// 枠を分類する。Past、Booked、Blocked、Freeの順に最初に一致したもの。
pub fn classify(schedule: &Schedule, key: &SlotKey, now: NaiveDateTime) -> SlotStatus {
    if is_past(key, now) {
        return SlotStatus::Past;
    }
    if let Some(appointment) = schedule.active_appointment_at(key) {
        return SlotStatus::Booked(appointment.clone());
    }
    if let Some(block) = schedule.block_at(key) {
        return SlotStatus::Blocked(block.clone());
    }
    SlotStatus::Free
}
