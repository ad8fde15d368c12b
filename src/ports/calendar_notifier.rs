use crate::domain::value_objects::AppointmentId;
use async_trait::async_trait;
use chrono::NaiveDateTime;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 確定した予約の情報。カレンダープロバイダーに渡す
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookedEvent {
    pub appointment_id: AppointmentId,
    pub service_name: String,
    pub customer_name: String,
    pub customer_email: String,
    pub barber_name: String,
    pub barber_calendar_identity: Option<String>,
    /// 店舗の現地時刻での開始
    pub starts_at: NaiveDateTime,
    pub duration_minutes: u32,
}

/// カレンダー通知ポート
///
/// 確定後の予約を受け取り、不透明な外部参照を返す。
/// 競合の判定には使わない。
#[async_trait]
pub trait CalendarNotifier: Send + Sync {
    async fn booking_created(&self, event: BookedEvent) -> Result<String>;
}
