use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProductId, ProductLine, PromotionError, PromotionId, ServiceId};

/// 許容される最大の割引率
pub const MAX_DISCOUNT_PERCENTAGE: u8 = 100;

/// カタログがIDを割り当てる前のプロモーション
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPromotion {
    pub service_id: ServiceId,
    /// `None`はサービス単体が対象であることを表す
    pub product_id: Option<ProductId>,
    pub discount_percentage: u8,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub active: bool,
}

impl NewPromotion {
    /// 期間と割引率を検証する。
    ///
    /// # エラー
    /// - `InvalidRange`: 期間の終了が開始より前
    /// - `PercentageOutOfRange`: 100を超える
    pub fn validate(self) -> Result<Self, PromotionError> {
        if self.ends_at < self.starts_at {
            return Err(PromotionError::InvalidRange);
        }
        if self.discount_percentage > MAX_DISCOUNT_PERCENTAGE {
            return Err(PromotionError::PercentageOutOfRange(self.discount_percentage));
        }
        Ok(self)
    }

    pub fn with_id(self, id: PromotionId) -> Promotion {
        Promotion {
            id,
            service_id: self.service_id,
            product_id: self.product_id,
            discount_percentage: self.discount_percentage,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            active: self.active,
        }
    }
}

/// サービスへの割引。1つの商品と組み合わせることもできる（コンボ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: PromotionId,
    pub service_id: ServiceId,
    pub product_id: Option<ProductId>,
    pub discount_percentage: u8,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub active: bool,
}

impl Promotion {
    /// 有効かつ`now`が[starts_at, ends_at]内（両端を含む）。
    pub fn is_in_effect(&self, now: DateTime<Utc>) -> bool {
        self.active && self.starts_at <= now && now <= self.ends_at
    }

    pub fn is_combo(&self) -> bool {
        self.product_id.is_some()
    }
}

/// 登録済みプロモーションの部分編集。対象は登録後に変更できない。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionChanges {
    pub discount_percentage: Option<u8>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub active: Option<bool>,
}

/// `changes`を`promotion`に適用し、結果を再検証する。
///
/// # エラー
/// [`NewPromotion::validate`]と同じ。
pub fn revise(promotion: &Promotion, changes: PromotionChanges) -> Result<Promotion, PromotionError> {
    let revised = NewPromotion {
        service_id: promotion.service_id,
        product_id: promotion.product_id,
        discount_percentage: changes
            .discount_percentage
            .unwrap_or(promotion.discount_percentage),
        starts_at: changes.starts_at.unwrap_or(promotion.starts_at),
        ends_at: changes.ends_at.unwrap_or(promotion.ends_at),
        active: changes.active.unwrap_or(promotion.active),
    }
    .validate()?;
    Ok(revised.with_id(promotion.id))
}

/// 予約候補に適用される単一のプロモーションを探す。
///
/// 最初に見つかった有効なサービス単体のプロモーションが基本候補。
/// 選択された商品ごとに選択順で、(サービス, 商品)の有効なコンボが
/// あればそれで上書きする。最後に一致したものが優先される。
pub fn find_applicable<'a>(
    promotions: &'a [Promotion],
    service_id: ServiceId,
    selected_products: &[ProductId],
    now: DateTime<Utc>,
) -> Option<&'a Promotion> {
    let in_effect_for = |product_id: Option<ProductId>| {
        promotions.iter().find(move |p| {
            p.service_id == service_id && p.product_id == product_id && p.is_in_effect(now)
        })
    };

    let mut candidate = in_effect_for(None);
    for product_id in selected_products {
        if let Some(combo) = in_effect_for(Some(*product_id)) {
            candidate = Some(combo);
        }
    }
    candidate
}

/// `amount × percentage / 100`。最小通貨単位で四捨五入する。
///
/// 128ビットで計算し、`i64`を超える結果は飽和させる。
pub fn percentage_of(amount: i64, percentage: u8) -> i64 {
    let scaled = (i128::from(amount) * i128::from(percentage) + 50).div_euclid(100);
    i64::try_from(scaled).unwrap_or(if scaled < 0 { i64::MIN } else { i64::MAX })
}

/// `promotion`による割引額。
///
/// サービス単体のプロモーションはサービス価格のみを割り引く。コンボは
/// サービスと対象商品の合計を割り引き、その商品が`selected_products`に
/// 含まれなければ割引しない。
pub fn compute_discount(
    promotion: &Promotion,
    service_price: i64,
    selected_products: &[ProductLine],
) -> i64 {
    let base = match promotion.product_id {
        Some(product_id) => match selected_products.iter().find(|p| p.id == product_id) {
            Some(product) => service_price.saturating_add(product.price),
            None => return 0,
        },
        None => service_price,
    };
    percentage_of(base, promotion.discount_percentage)
}

/// 予約候補の価格内訳
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub service_price: i64,
    pub products_total: i64,
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,
    pub promotion_id: Option<PromotionId>,
}

/// 合計 = サービス + 商品 − 割引。
pub fn quote(
    service_price: i64,
    selected_products: &[ProductLine],
    promotion: Option<&Promotion>,
) -> PriceQuote {
    let products_total = selected_products
        .iter()
        .fold(0i64, |total, p| total.saturating_add(p.price));
    let subtotal = service_price.saturating_add(products_total);
    let discount = promotion
        .map(|p| compute_discount(p, service_price, selected_products))
        .unwrap_or(0);
    let promotion_id = promotion.filter(|_| discount > 0).map(|p| p.id);

    PriceQuote {
        service_price,
        products_total,
        subtotal,
        discount,
        total: subtotal.saturating_sub(discount),
        promotion_id,
    }
}
