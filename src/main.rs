use barbershop_booking::{
    adapters::{
        memory::LedgerStore as MemoryLedgerStore,
        mock::{
            CalendarNotifier as MockCalendarNotifier, CatalogService as MockCatalogService,
            PromotionCatalog as MockPromotionCatalog, UserDirectory as MockUserDirectory,
        },
        postgres::PostgresLedgerStore,
    },
    api::{AppState, create_router},
    application::booking::{AppointmentLedger, ServiceDependencies},
    config::AppConfig,
    ports::{Clock, LedgerStore, SystemClock},
};
use chrono::FixedOffset;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().expect("Failed to load configuration");

    // トレーシングの初期化
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let offset = FixedOffset::east_opt(config.booking.utc_offset_seconds())
        .expect("booking.utc_offset_minutes out of range");
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(offset));

    let store: Arc<dyn LedgerStore> = match &config.database.url {
        Some(database_url) => {
            tracing::info!("Using PostgreSQL ledger store");
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(database_url)
                .await
                .expect("Failed to connect to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run migrations");

            Arc::new(PostgresLedgerStore::new(pool))
        }
        None => {
            tracing::warn!("No database.url configured, ledger is kept in memory");
            Arc::new(MemoryLedgerStore::new())
        }
    };

    let ledger = AppointmentLedger::open(store, clock.clone(), config.booking.lock_timeout())
        .await
        .expect("Failed to load the appointment ledger");

    let service_deps = ServiceDependencies {
        ledger: Arc::new(ledger),
        catalog: Arc::new(MockCatalogService::with_seed_data()),
        user_directory: Arc::new(MockUserDirectory::with_seed_data()),
        promotions: Arc::new(MockPromotionCatalog::new()),
        calendar_notifier: Arc::new(MockCalendarNotifier::new()),
        clock,
    };

    let app_state = Arc::new(AppState { service_deps });
    let app = create_router(app_state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
