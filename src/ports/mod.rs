pub mod calendar_notifier;
pub mod catalog_service;
pub mod clock;
pub mod ledger_store;
pub mod promotion_catalog;
pub mod user_directory;

pub use calendar_notifier::{BookedEvent, CalendarNotifier};
pub use catalog_service::{Barber, CatalogService, Product, Service};
pub use clock::{Clock, SystemClock};
pub use ledger_store::{LedgerStore, StoreError};
pub use promotion_catalog::PromotionCatalog;
pub use user_directory::{Customer, UserDirectory};
