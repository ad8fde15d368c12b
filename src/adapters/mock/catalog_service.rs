use crate::domain::value_objects::{BarberId, ProductId, ServiceId};
use crate::ports::catalog_service::{
    Barber, CatalogService as CatalogServiceTrait, Product, Result, Service,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Default)]
struct Entries {
    services: HashMap<ServiceId, Service>,
    products: HashMap<ProductId, Product>,
    barbers: HashMap<BarberId, Barber>,
}

/// インメモリのCatalogService
///
/// 空で始まる。`with_seed_data`で店舗の標準カタログを読み込む。
pub struct CatalogService {
    entries: Mutex<Entries>,
}

impl CatalogService {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
        }
    }

    /// サービス2件、商品3件、理容師3名。
    pub fn with_seed_data() -> Self {
        let catalog = Self::new();
        catalog.add_service(Service {
            id: ServiceId::new(1),
            name: "Corte de Cabello".to_string(),
            price: 15000,
            duration_minutes: 30,
            active: true,
        });
        catalog.add_service(Service {
            id: ServiceId::new(2),
            name: "Barba".to_string(),
            price: 10000,
            duration_minutes: 20,
            active: true,
        });
        for (id, name, price, stock) in [
            (1, "Pomada para Cabello", 8000, 50),
            (2, "Aceite para Barba", 12000, 30),
            (3, "Champú Profesional", 10000, 40),
        ] {
            catalog.add_product(Product {
                id: ProductId::new(id),
                name: name.to_string(),
                price,
                stock,
                active: true,
            });
        }
        for (id, name) in [(2, "Juan Barbero"), (4, "Carlos Barbero"), (5, "Miguel Barbero")] {
            catalog.add_barber(Barber {
                id: BarberId::new(id),
                name: name.to_string(),
                active: true,
            });
        }
        catalog
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_service(&self, service: Service) {
        self.entries().services.insert(service.id, service);
    }

    pub fn add_product(&self, product: Product) {
        self.entries().products.insert(product.id, product);
    }

    pub fn add_barber(&self, barber: Barber) {
        self.entries().barbers.insert(barber.id, barber);
    }
}

impl Default for CatalogService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogServiceTrait for CatalogService {
    async fn get_service(&self, service_id: ServiceId) -> Result<Option<Service>> {
        Ok(self.entries().services.get(&service_id).cloned())
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        Ok(self.entries().products.get(&product_id).cloned())
    }

    async fn get_barber(&self, barber_id: BarberId) -> Result<Option<Barber>> {
        Ok(self.entries().barbers.get(&barber_id).cloned())
    }
}
