use crate::domain::value_objects::{BarberId, CustomerId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 予約から見た顧客の情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
}

/// ユーザーディレクトリポート
///
/// 予約の顧客情報と、理容師の外部カレンダーが
/// 連携しているアカウントの参照にのみ使う。
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_customer(&self, customer_id: CustomerId) -> Result<Option<Customer>>;

    /// 理容師のカレンダー連携アカウント（メールアドレスなど）。
    async fn barber_calendar_identity(&self, barber_id: BarberId) -> Result<Option<String>>;
}
