use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::application::booking::{BookingConfirmation, SlotAvailability};
use crate::domain::{
    Appointment, AppointmentStatus, BarberId, CustomerId, NewPromotion, PriceQuote, ProductId,
    PromotionChanges, ServiceId, SlotKey, SlotState, SlotStatus, SlotTime,
    commands::{BlockSlot, ReserveSlot, UnblockSlot},
};

/// GET /availability のクエリ
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub barber_id: i64,
    /// 対象週の任意の日付。省略時は今日
    pub week_start: Option<NaiveDate>,
}

/// 週間グリッドの1要素
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailabilityResponse {
    pub date: NaiveDate,
    pub time: SlotTime,
    pub status: SlotState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<i64>,
}

impl From<SlotAvailability> for SlotAvailabilityResponse {
    fn from(slot: SlotAvailability) -> Self {
        let (appointment_id, block_id) = match &slot.status {
            SlotStatus::Booked(appointment) => (Some(appointment.id.value()), None),
            SlotStatus::Blocked(block) => (None, Some(block.id.value())),
            SlotStatus::Past | SlotStatus::Free => (None, None),
        };
        Self {
            date: slot.key.date,
            time: slot.key.time,
            status: slot.status.state(),
            appointment_id,
            block_id,
        }
    }
}

/// POST /appointments の本文
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveSlotRequest {
    pub barber_id: i64,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub service_id: i64,
    #[serde(default)]
    pub product_ids: Vec<i64>,
    pub customer_id: i64,
    pub note: Option<String>,
}

impl ReserveSlotRequest {
    pub fn to_command(&self) -> ReserveSlot {
        ReserveSlot {
            key: SlotKey::new(BarberId::new(self.barber_id), self.date, self.time),
            service_id: ServiceId::new(self.service_id),
            product_ids: self.product_ids.iter().copied().map(ProductId::new).collect(),
            customer_id: CustomerId::new(self.customer_id),
            note: self.note.clone(),
        }
    }
}

/// POST /appointments のレスポンス
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentCreatedResponse {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub quote: PriceQuote,
    pub calendar_reference: Option<String>,
}

impl From<BookingConfirmation> for AppointmentCreatedResponse {
    fn from(confirmation: BookingConfirmation) -> Self {
        Self {
            appointment: confirmation.appointment,
            quote: confirmation.quote,
            calendar_reference: confirmation.calendar_reference,
        }
    }
}

/// POST /appointments/:id/status の本文
#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: AppointmentStatus,
}

/// GET /appointments クエリ：絞り込みは1つだけ
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAppointmentsQuery {
    pub barber_id: Option<i64>,
    pub customer_id: Option<i64>,
}

/// POST /blocks の本文
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSlotRequest {
    pub barber_id: i64,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub reason: Option<String>,
}

impl BlockSlotRequest {
    pub fn to_command(&self) -> BlockSlot {
        BlockSlot {
            key: SlotKey::new(BarberId::new(self.barber_id), self.date, self.time),
            reason: self.reason.clone(),
        }
    }
}

/// DELETE /blocks の本文
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnblockSlotRequest {
    pub barber_id: i64,
    pub date: NaiveDate,
    pub time: SlotTime,
}

impl UnblockSlotRequest {
    pub fn to_command(&self) -> UnblockSlot {
        UnblockSlot {
            key: SlotKey::new(BarberId::new(self.barber_id), self.date, self.time),
        }
    }
}

/// GET /blocks と GET /events のクエリ
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarberQuery {
    pub barber_id: Option<i64>,
}

/// GET /promotions/applicable と GET /pricing/quote のクエリ
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionQuery {
    pub service_id: i64,
    /// カンマ区切りの商品ID
    pub product_ids: Option<String>,
}

impl SelectionQuery {
    pub fn service_id(&self) -> ServiceId {
        ServiceId::new(self.service_id)
    }

    pub fn product_ids(&self) -> Result<Vec<ProductId>, String> {
        parse_product_ids(self.product_ids.as_deref().unwrap_or(""))
    }
}

/// "1,2,3"を商品IDに変換する。空入力は商品なし。
pub fn parse_product_ids(raw: &str) -> Result<Vec<ProductId>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map(ProductId::new)
                .map_err(|_| format!("invalid product id: {part:?}"))
        })
        .collect()
}

fn default_active() -> bool {
    true
}

/// POST /promotions の本文
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromotionRequest {
    pub service_id: i64,
    pub product_id: Option<i64>,
    pub discount_percentage: u8,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl CreatePromotionRequest {
    pub fn to_new_promotion(&self) -> NewPromotion {
        NewPromotion {
            service_id: ServiceId::new(self.service_id),
            product_id: self.product_id.map(ProductId::new),
            discount_percentage: self.discount_percentage,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            active: self.active,
        }
    }
}

/// PATCH /promotions/:id の本文。省略した項目は変更しない
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePromotionRequest {
    pub discount_percentage: Option<u8>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub active: Option<bool>,
}

impl UpdatePromotionRequest {
    pub fn to_changes(&self) -> PromotionChanges {
        PromotionChanges {
            discount_percentage: self.discount_percentage,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            active: self.active,
        }
    }
}

/// エラー本文
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<SlotKey>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            slot: None,
        }
    }

    pub fn with_slot(mut self, slot: Option<SlotKey>) -> Self {
        self.slot = slot;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product_ids() {
        assert_eq!(
            parse_product_ids("1, 2,3"),
            Ok(vec![ProductId::new(1), ProductId::new(2), ProductId::new(3)])
        );
        assert_eq!(parse_product_ids(""), Ok(vec![]));
        assert!(parse_product_ids("1,x").is_err());
    }
}
