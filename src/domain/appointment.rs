use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{
    AppointmentBooked, AppointmentId, AppointmentStatusChanged, BarberId, CustomerId, ProductId,
    SlotKey, SlotTime,
};

/// 予約のライフサイクル上のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// PendingとConfirmedの予約は枠を占有する。
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Pending | AppointmentStatus::Confirmed
        )
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            _ => Err(format!("Invalid appointment status: {}", s)),
        }
    }
}

/// 予約に添付された商品。
///
/// 価格は予約時点のスナップショットでありカタログへの参照ではないため、
/// 後の価格変更でも過去の合計は変わらない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLine {
    pub id: ProductId,
    pub name: String,
    pub price: i64,
}

/// ストアがIDを割り当てる前の予約
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub barber_id: BarberId,
    pub barber_name: String,
    pub service_name: String,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub status: AppointmentStatus,
    pub products: Vec<ProductLine>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewAppointment {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.barber_id, self.date, self.time)
    }

    pub fn with_id(self, id: AppointmentId) -> Appointment {
        Appointment {
            id,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            barber_id: self.barber_id,
            barber_name: self.barber_name,
            service_name: self.service_name,
            date: self.date,
            time: self.time,
            status: self.status,
            products: self.products,
            note: self.note,
            created_at: self.created_at,
        }
    }
}

/// 台帳が保持する予約。
///
/// 削除されず、ステータスだけが変わる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub barber_id: BarberId,
    pub barber_name: String,
    pub service_name: String,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub status: AppointmentStatus,
    pub products: Vec<ProductLine>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.barber_id, self.date, self.time)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn products_total(&self) -> i64 {
        self.products.iter().map(|p| p.price).sum()
    }
}

/// 誰が何を予約するか：予約の非正規化された情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingFacts {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub barber_name: String,
    pub service_name: String,
    pub products: Vec<ProductLine>,
    pub note: Option<String>,
}

/// 純粋関数：枠を予約する。
///
/// 新しい予約は常にPendingで始まる。空白のメモは捨てる。
pub fn book_appointment(
    key: SlotKey,
    facts: BookingFacts,
    booked_at: DateTime<Utc>,
) -> NewAppointment {
    let note = facts
        .note
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    NewAppointment {
        customer_id: facts.customer_id,
        customer_name: facts.customer_name,
        barber_id: key.barber_id,
        barber_name: facts.barber_name,
        service_name: facts.service_name,
        date: key.date,
        time: key.time,
        status: AppointmentStatus::Pending,
        products: facts.products,
        note,
        created_at: booked_at,
    }
}

/// 保存直後の予約のイベント
pub fn appointment_booked(appointment: &Appointment) -> AppointmentBooked {
    AppointmentBooked {
        appointment_id: appointment.id,
        key: appointment.key(),
        customer_id: appointment.customer_id,
        occurred_at: appointment.created_at,
    }
}

/// 純粋関数：新しいステータスを書き込む。
///
/// 現在と同じものも含めどのステータスも書き込める（2回目のキャンセルは
/// 何もしない書き込み）。再有効化の可否は枠の状態によるため、
/// ここではなく競合ガードで検査する。
pub fn change_status(
    appointment: &Appointment,
    status: AppointmentStatus,
    changed_at: DateTime<Utc>,
) -> (Appointment, AppointmentStatusChanged) {
    let event = AppointmentStatusChanged {
        appointment_id: appointment.id,
        key: appointment.key(),
        from: appointment.status,
        to: status,
        occurred_at: changed_at,
    };

    let updated = Appointment {
        status,
        ..appointment.clone()
    };

    (updated, event)
}

/// `status`への変更で予約が再び枠を占有するかどうか
pub fn reactivates(appointment: &Appointment, status: AppointmentStatus) -> bool {
    !appointment.is_active() && status.is_active()
}
