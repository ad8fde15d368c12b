use crate::domain::value_objects::{BarberId, ProductId, ServiceId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 店舗が提供する予約可能なサービス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    /// 最小通貨単位
    pub price: i64,
    pub duration_minutes: u32,
    pub active: bool,
}

/// サービスと一緒に販売する商品
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: i64,
    pub stock: u32,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Barber {
    pub id: BarberId,
    pub name: String,
    pub active: bool,
}

/// カタログサービスポート
///
/// サービス、商品、理容師の読み取り専用の参照。予約のコアは
/// IDだけを知り、必要な名前と価格を複写する。
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn get_service(&self, service_id: ServiceId) -> Result<Option<Service>>;

    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>>;

    async fn get_barber(&self, barber_id: BarberId) -> Result<Option<Barber>>;
}
