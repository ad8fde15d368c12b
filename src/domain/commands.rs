use serde::{Deserialize, Serialize};

use super::{AppointmentId, AppointmentStatus, CustomerId, ProductId, ServiceId, SlotKey};

/// コマンド：枠を予約
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveSlot {
    pub key: SlotKey,
    pub service_id: ServiceId,
    pub product_ids: Vec<ProductId>,
    pub customer_id: CustomerId,
    pub note: Option<String>,
}

/// コマンド：枠を予約対象から外す
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSlot {
    pub key: SlotKey,
    pub reason: Option<String>,
}

/// コマンド：ブロックを解除
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnblockSlot {
    pub key: SlotKey,
}

/// コマンド：予約をキャンセル
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelAppointment {
    pub appointment_id: AppointmentId,
}

/// コマンド：予約のステータスを書き込む
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeAppointmentStatus {
    pub appointment_id: AppointmentId,
    pub status: AppointmentStatus,
}
