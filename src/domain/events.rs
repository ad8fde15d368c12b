use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AppointmentId, AppointmentStatus, BlockId, CustomerId, SlotKey};

/// イベント：予約が作成された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentBooked {
    pub appointment_id: AppointmentId,
    pub key: SlotKey,
    pub customer_id: CustomerId,
    pub occurred_at: DateTime<Utc>,
}

/// イベント：予約のステータスが書き込まれた
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentStatusChanged {
    pub appointment_id: AppointmentId,
    pub key: SlotKey,
    pub from: AppointmentStatus,
    pub to: AppointmentStatus,
    pub occurred_at: DateTime<Utc>,
}

/// イベント：枠がブロックされた
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotBlocked {
    pub block_id: BlockId,
    pub key: SlotKey,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// イベント：ブロックが解除された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotUnblocked {
    pub block_id: BlockId,
    pub key: SlotKey,
    pub occurred_at: DateTime<Utc>,
}

/// 台帳が発行する変更通知。対象の枠をキーとする
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    AppointmentBooked(AppointmentBooked),
    AppointmentStatusChanged(AppointmentStatusChanged),
    SlotBlocked(SlotBlocked),
    SlotUnblocked(SlotUnblocked),
}

impl DomainEvent {
    pub fn key(&self) -> SlotKey {
        match self {
            DomainEvent::AppointmentBooked(e) => e.key,
            DomainEvent::AppointmentStatusChanged(e) => e.key,
            DomainEvent::SlotBlocked(e) => e.key,
            DomainEvent::SlotUnblocked(e) => e.key,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::AppointmentBooked(_) => "AppointmentBooked",
            DomainEvent::AppointmentStatusChanged(_) => "AppointmentStatusChanged",
            DomainEvent::SlotBlocked(_) => "SlotBlocked",
            DomainEvent::SlotUnblocked(_) => "SlotUnblocked",
        }
    }
}
