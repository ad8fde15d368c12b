use crate::domain::{
    NewPromotion, PriceQuote, ProductId, ProductLine, Promotion, PromotionChanges, PromotionId,
    ServiceId, promotion,
};
use crate::ports::Service;

use super::booking_service::ServiceDependencies;
use super::errors::{BookingApplicationError, Result};

/// 予約可能なサービスを取得する。
///
/// # エラー
/// - `ServiceNotFound`: 存在しないID
/// - `InvalidRequest`: サービスが無効
pub(super) async fn resolve_service(
    deps: &ServiceDependencies,
    service_id: ServiceId,
) -> Result<Service> {
    let service = deps
        .catalog
        .get_service(service_id)
        .await
        .map_err(BookingApplicationError::CatalogServiceError)?
        .ok_or(BookingApplicationError::ServiceNotFound(service_id))?;

    if !service.active {
        return Err(BookingApplicationError::InvalidRequest(format!(
            "service {} is not offered",
            service_id
        )));
    }
    Ok(service)
}

/// 選択された商品を選択順に価格スナップショットへ変換する。
///
/// # エラー
/// - `ProductNotFound`: 存在しないID
/// - `InvalidRequest`: 無効な商品、または重複した商品
pub(super) async fn resolve_products(
    deps: &ServiceDependencies,
    product_ids: &[ProductId],
) -> Result<Vec<ProductLine>> {
    let mut lines: Vec<ProductLine> = Vec::with_capacity(product_ids.len());
    for &product_id in product_ids {
        if lines.iter().any(|line| line.id == product_id) {
            return Err(BookingApplicationError::InvalidRequest(format!(
                "product {} selected more than once",
                product_id
            )));
        }

        let product = deps
            .catalog
            .get_product(product_id)
            .await
            .map_err(BookingApplicationError::CatalogServiceError)?
            .ok_or(BookingApplicationError::ProductNotFound(product_id))?;

        if !product.active {
            return Err(BookingApplicationError::InvalidRequest(format!(
                "product {} is not available",
                product_id
            )));
        }

        lines.push(ProductLine {
            id: product.id,
            name: product.name,
            price: product.price,
        });
    }
    Ok(lines)
}

pub async fn list_promotions(deps: &ServiceDependencies) -> Result<Vec<Promotion>> {
    deps.promotions
        .list()
        .await
        .map_err(BookingApplicationError::PromotionCatalogError)
}

pub async fn get_promotion(
    deps: &ServiceDependencies,
    promotion_id: PromotionId,
) -> Result<Promotion> {
    deps.promotions
        .get(promotion_id)
        .await
        .map_err(BookingApplicationError::PromotionCatalogError)?
        .ok_or(BookingApplicationError::PromotionNotFound(promotion_id))
}

/// プロモーションを登録する。
///
/// # エラー
/// - `InvalidRange`: 期間の終了が開始より前
/// - `InvalidRequest`: 割引率が100を超える
/// - `ServiceNotFound` / `ProductNotFound`: 対象が存在しない
pub async fn register_promotion(
    deps: &ServiceDependencies,
    new_promotion: NewPromotion,
) -> Result<Promotion> {
    let new_promotion = new_promotion.validate()?;

    deps.catalog
        .get_service(new_promotion.service_id)
        .await
        .map_err(BookingApplicationError::CatalogServiceError)?
        .ok_or(BookingApplicationError::ServiceNotFound(new_promotion.service_id))?;

    if let Some(product_id) = new_promotion.product_id {
        deps.catalog
            .get_product(product_id)
            .await
            .map_err(BookingApplicationError::CatalogServiceError)?
            .ok_or(BookingApplicationError::ProductNotFound(product_id))?;
    }

    let stored = deps
        .promotions
        .add(new_promotion)
        .await
        .map_err(BookingApplicationError::PromotionCatalogError)?;

    tracing::info!(
        promotion_id = %stored.id,
        service_id = %stored.service_id,
        combo = stored.is_combo(),
        "promotion registered"
    );
    Ok(stored)
}

/// プロモーションの割引率、期間、有効フラグを編集する。
///
/// # エラー
/// - `PromotionNotFound`: 存在しないID
/// - `InvalidRange` / `InvalidRequest`: 編集後のプロモーションが不正
pub async fn update_promotion(
    deps: &ServiceDependencies,
    promotion_id: PromotionId,
    changes: PromotionChanges,
) -> Result<Promotion> {
    let current = get_promotion(deps, promotion_id).await?;
    let revised = promotion::revise(&current, changes)?;

    let stored = deps
        .promotions
        .update(revised)
        .await
        .map_err(BookingApplicationError::PromotionCatalogError)?
        .ok_or(BookingApplicationError::PromotionNotFound(promotion_id))?;

    tracing::info!(
        promotion_id = %stored.id,
        active = stored.active,
        "promotion updated"
    );
    Ok(stored)
}

/// プロモーションを削除する。
///
/// # エラー
/// - `PromotionNotFound`: 存在しないID
pub async fn delete_promotion(deps: &ServiceDependencies, promotion_id: PromotionId) -> Result<()> {
    let removed = deps
        .promotions
        .remove(promotion_id)
        .await
        .map_err(BookingApplicationError::PromotionCatalogError)?;
    if !removed {
        return Err(BookingApplicationError::PromotionNotFound(promotion_id));
    }

    tracing::info!(promotion_id = %promotion_id, "promotion removed");
    Ok(())
}

/// 現時点で予約候補に適用されるプロモーション（なければNone）。
pub async fn find_applicable_promotion(
    deps: &ServiceDependencies,
    service_id: ServiceId,
    product_ids: &[ProductId],
) -> Result<Option<Promotion>> {
    let promotions = list_promotions(deps).await?;
    let now = deps.clock.utc_now();
    Ok(promotion::find_applicable(&promotions, service_id, product_ids, now).cloned())
}

/// サービスと選択商品の価格を、現在のプロモーションを適用して見積もる。
pub async fn quote_price(
    deps: &ServiceDependencies,
    service_id: ServiceId,
    product_ids: &[ProductId],
) -> Result<PriceQuote> {
    let service = resolve_service(deps, service_id).await?;
    let products = resolve_products(deps, product_ids).await?;
    price_selection(deps, &service, &products).await
}

pub(super) async fn price_selection(
    deps: &ServiceDependencies,
    service: &Service,
    products: &[ProductLine],
) -> Result<PriceQuote> {
    let product_ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
    let applicable = find_applicable_promotion(deps, service.id, &product_ids).await?;
    Ok(promotion::quote(service.price, products, applicable.as_ref()))
}
