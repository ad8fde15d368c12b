pub mod calendar_notifier;
pub mod catalog_service;
pub mod clock;
pub mod promotion_catalog;
pub mod user_directory;

pub use calendar_notifier::CalendarNotifier;
pub use catalog_service::CatalogService;
pub use clock::FixedClock;
pub use promotion_catalog::PromotionCatalog;
pub use user_directory::UserDirectory;
