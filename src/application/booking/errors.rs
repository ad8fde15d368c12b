use crate::domain::{
    AppointmentId, BarberId, CustomerId, ProductId, PromotionError, PromotionId, ServiceId,
    SlotConflict, SlotKey,
};
use crate::ports::StoreError;
use thiserror::Error;

/// 予約アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum BookingApplicationError {
    /// 枠が予約済み・ブロック済み・経過済み、または時間内にロックを取得できなかった
    #[error("Slot unavailable: {0}")]
    SlotUnavailable(SlotKey),

    #[error("Slot already blocked: {0}")]
    AlreadyBlocked(SlotKey),

    #[error("Slot is not blocked: {0}")]
    SlotNotBlocked(SlotKey),

    #[error("Slot already elapsed: {0}")]
    SlotInPast(SlotKey),

    #[error("Appointment {0} not found")]
    AppointmentNotFound(AppointmentId),

    #[error("Promotion {0} not found")]
    PromotionNotFound(PromotionId),

    #[error("Service {0} not found")]
    ServiceNotFound(ServiceId),

    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    #[error("Barber {0} not found")]
    BarberNotFound(BarberId),

    #[error("Customer {0} not found")]
    CustomerNotFound(CustomerId),

    /// プロモーション期間の終了が開始より前
    #[error("Promotion end date is before its start date")]
    InvalidRange,

    /// 形式は正しいが予約ルールで拒否されるリクエスト
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Ledger store error")]
    LedgerStoreError(#[source] StoreError),

    #[error("Catalog service error")]
    CatalogServiceError(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("User directory error")]
    UserDirectoryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Promotion catalog error")]
    PromotionCatalogError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BookingApplicationError {
    /// 競合系のエラーで対象となった枠
    pub fn slot(&self) -> Option<SlotKey> {
        match self {
            BookingApplicationError::SlotUnavailable(key)
            | BookingApplicationError::AlreadyBlocked(key)
            | BookingApplicationError::SlotNotBlocked(key)
            | BookingApplicationError::SlotInPast(key) => Some(*key),
            _ => None,
        }
    }
}

impl From<SlotConflict> for BookingApplicationError {
    fn from(conflict: SlotConflict) -> Self {
        match conflict {
            SlotConflict::SlotUnavailable(key) => BookingApplicationError::SlotUnavailable(key),
            SlotConflict::AlreadyBlocked(key) => BookingApplicationError::AlreadyBlocked(key),
            SlotConflict::SlotNotBlocked(key) => BookingApplicationError::SlotNotBlocked(key),
            SlotConflict::SlotInPast(key) => BookingApplicationError::SlotInPast(key),
        }
    }
}

impl From<PromotionError> for BookingApplicationError {
    fn from(err: PromotionError) -> Self {
        match err {
            PromotionError::InvalidRange => BookingApplicationError::InvalidRange,
            PromotionError::PercentageOutOfRange(pct) => BookingApplicationError::InvalidRequest(
                format!("discount percentage must be between 0 and 100, got {pct}"),
            ),
        }
    }
}

/// 予約アプリケーション層のResult
pub type Result<T> = std::result::Result<T, BookingApplicationError>;
