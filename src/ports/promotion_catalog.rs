use crate::domain::{NewPromotion, Promotion, PromotionId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// プロモーションカタログポート
///
/// プロモーションコンテキストが所有する。候補は登録順に返し、
/// リゾルバーの「最初の基本候補」ルールはこの順序に依存する。
#[async_trait]
pub trait PromotionCatalog: Send + Sync {
    async fn list(&self) -> Result<Vec<Promotion>>;

    async fn get(&self, promotion_id: PromotionId) -> Result<Option<Promotion>>;

    /// 検証済みのプロモーションを登録する。
    async fn add(&self, promotion: NewPromotion) -> Result<Promotion>;

    /// 保存済みのプロモーションを位置を保ったまま置き換える。
    /// IDが存在しなければ`None`。
    async fn update(&self, promotion: Promotion) -> Result<Option<Promotion>>;

    /// プロモーションを削除する。IDが存在しなければ`false`。
    async fn remove(&self, promotion_id: PromotionId) -> Result<bool>;
}
