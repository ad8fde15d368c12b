use crate::domain::{
    Appointment, AppointmentId, AppointmentStatus, BlockId, BlockedSlot, NewAppointment,
    NewBlockedSlot,
};
use async_trait::async_trait;
use thiserror::Error;

/// 台帳ストアの障害
#[derive(Debug, Error)]
pub enum StoreError {
    /// (理容師, 日付, 時刻)の一意性制約が書き込みを拒否した。
    ///
    /// 別の書き込みが同じ枠を先に確定した場合に起きる。
    #[error("slot already taken in store")]
    SlotTaken,

    /// 更新または削除する行が存在しない
    #[error("record not found in store")]
    NotFound,

    #[error("store backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// 台帳ストアポート（永続化）
///
/// 予約とブロックの永続ストレージ。IDはストアが割り当てる。
/// 実装は有効な予約同士とブロック同士で(理容師, 日付, 時刻)の
/// 一意性を保証し、違反は`SlotTaken`として報告する。
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// 全予約をID順に読み込む。
    async fn load_appointments(&self) -> Result<Vec<Appointment>>;

    /// 全ブロックを読み込む。
    async fn load_blocked_slots(&self) -> Result<Vec<BlockedSlot>>;

    /// 予約を挿入し、割り当てたIDとともに返す。
    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment>;

    /// 予約のステータスを書き込む。
    async fn update_appointment_status(
        &self,
        appointment_id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<()>;

    /// ブロックを挿入し、割り当てたIDとともに返す。
    async fn insert_blocked_slot(&self, block: NewBlockedSlot) -> Result<BlockedSlot>;

    /// ブロックを削除する。
    async fn delete_blocked_slot(&self, block_id: BlockId) -> Result<()>;
}
