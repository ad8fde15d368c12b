use crate::domain::{NewPromotion, Promotion, PromotionId};
use crate::ports::promotion_catalog::{PromotionCatalog as PromotionCatalogTrait, Result};
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

/// 登録順を保つインメモリのPromotionCatalog
pub struct PromotionCatalog {
    promotions: Mutex<Vec<Promotion>>,
}

impl PromotionCatalog {
    pub fn new() -> Self {
        Self {
            promotions: Mutex::new(Vec::new()),
        }
    }
}

impl Default for PromotionCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PromotionCatalogTrait for PromotionCatalog {
    async fn list(&self) -> Result<Vec<Promotion>> {
        Ok(self
            .promotions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn get(&self, promotion_id: PromotionId) -> Result<Option<Promotion>> {
        Ok(self
            .promotions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|p| p.id == promotion_id)
            .cloned())
    }

    async fn add(&self, promotion: NewPromotion) -> Result<Promotion> {
        let mut promotions = self.promotions.lock().unwrap_or_else(PoisonError::into_inner);
        let next_id = promotions.iter().map(|p| p.id.value()).max().unwrap_or(0) + 1;
        let stored = promotion.with_id(PromotionId::new(next_id));
        promotions.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, promotion: Promotion) -> Result<Option<Promotion>> {
        let mut promotions = self.promotions.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(promotions
            .iter_mut()
            .find(|p| p.id == promotion.id)
            .map(|slot| {
                *slot = promotion;
                slot.clone()
            }))
    }

    async fn remove(&self, promotion_id: PromotionId) -> Result<bool> {
        let mut promotions = self.promotions.lock().unwrap_or_else(PoisonError::into_inner);
        let before = promotions.len();
        promotions.retain(|p| p.id != promotion_id);
        Ok(promotions.len() < before)
    }
}
