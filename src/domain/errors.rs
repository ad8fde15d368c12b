use std::fmt;

use super::SlotKey;

/// 競合ガードによるカレンダー変更の拒否。
///
/// どのバリアントも対象のキーを持ち、呼び出し側が報告できる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotConflict {
    /// 枠が予約済み、ブロック済み、または経過済み
    SlotUnavailable(SlotKey),
    /// キーに既にブロックが存在する
    AlreadyBlocked(SlotKey),
    /// ブロックのないキーへの解除要求
    SlotNotBlocked(SlotKey),
    /// 経過済みの枠への解除要求
    SlotInPast(SlotKey),
}

impl SlotConflict {
    pub fn key(&self) -> SlotKey {
        match self {
            SlotConflict::SlotUnavailable(key)
            | SlotConflict::AlreadyBlocked(key)
            | SlotConflict::SlotNotBlocked(key)
            | SlotConflict::SlotInPast(key) => *key,
        }
    }
}

impl fmt::Display for SlotConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotConflict::SlotUnavailable(key) => write!(f, "slot unavailable: {key}"),
            SlotConflict::AlreadyBlocked(key) => write!(f, "slot already blocked: {key}"),
            SlotConflict::SlotNotBlocked(key) => write!(f, "slot is not blocked: {key}"),
            SlotConflict::SlotInPast(key) => write!(f, "slot already elapsed: {key}"),
        }
    }
}

/// 不正なプロモーション定義
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionError {
    /// 有効期間の終了が開始より前
    InvalidRange,
    /// 割引率が100を超える
    PercentageOutOfRange(u8),
}

/// 不正な枠の時刻
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotTimeError {
    Malformed(String),
    NotOnTheHour(String),
    OutOfRange(u8),
}

impl fmt::Display for SlotTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotTimeError::Malformed(raw) => write!(f, "time must be HH:MM, got {raw:?}"),
            SlotTimeError::NotOnTheHour(raw) => write!(f, "time must be on the hour, got {raw}"),
            SlotTimeError::OutOfRange(hour) => write!(f, "hour out of range: {hour}"),
        }
    }
}

/// 週の移動を拒否
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeekNavigationError {
    /// 移動先の週が今週より前
    PastWeek,
}
