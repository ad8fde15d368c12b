//! DATABASE_URLのPostgreSQLが必要。`--ignored`付きで実行する。

mod common;

use barbershop_booking::adapters::postgres::PostgresLedgerStore;
use barbershop_booking::domain::*;
use barbershop_booking::ports::{LedgerStore, StoreError};
use chrono::{DateTime, Utc};
use serial_test::serial;
use sqlx::PgPool;

/// PostgreSQLのマイクロ秒精度に丸める
fn truncate_to_micros(dt: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(dt.timestamp_micros()).expect("Invalid timestamp")
}

async fn cleanup(pool: &PgPool) {
    sqlx::query("TRUNCATE TABLE appointment_products, appointments, blocked_slots RESTART IDENTITY")
        .execute(pool)
        .await
        .expect("Failed to truncate ledger tables");
}

fn new_appointment(hour: u8, products: Vec<ProductLine>) -> NewAppointment {
    let key = common::key(common::date(2030, 3, 4), hour);
    NewAppointment {
        customer_id: CustomerId::new(3),
        customer_name: "Pedro Usuario".to_string(),
        barber_id: key.barber_id,
        barber_name: "Juan Barbero".to_string(),
        service_name: "Corte de Cabello".to_string(),
        date: key.date,
        time: key.time,
        status: AppointmentStatus::Pending,
        products,
        note: Some("Degradado".to_string()),
        created_at: truncate_to_micros(Utc::now()),
    }
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_insert_and_load_appointment_with_products() {
    let pool = common::create_test_pool().await;
    cleanup(&pool).await;
    let store = PostgresLedgerStore::new(pool.clone());

    let products = vec![
        ProductLine {
            id: ProductId::new(2),
            name: "Aceite para Barba".to_string(),
            price: 12000,
        },
        ProductLine {
            id: ProductId::new(1),
            name: "Pomada para Cabello".to_string(),
            price: 8000,
        },
    ];
    let stored = store
        .insert_appointment(new_appointment(10, products))
        .await
        .expect("Failed to insert appointment");

    let loaded = store
        .load_appointments()
        .await
        .expect("Failed to load appointments");

    assert_eq!(loaded, vec![stored]);
    assert_eq!(loaded[0].products[0].id, ProductId::new(2));
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_partial_unique_index_on_active_appointments() {
    let pool = common::create_test_pool().await;
    cleanup(&pool).await;
    let store = PostgresLedgerStore::new(pool.clone());

    let first = store
        .insert_appointment(new_appointment(11, vec![]))
        .await
        .unwrap();
    let duplicate = store.insert_appointment(new_appointment(11, vec![])).await;
    assert!(matches!(duplicate, Err(StoreError::SlotTaken)));

    store
        .update_appointment_status(first.id, AppointmentStatus::Cancelled)
        .await
        .unwrap();
    store
        .insert_appointment(new_appointment(11, vec![]))
        .await
        .expect("cancelled appointment should free the slot");

    let reactivated = store
        .update_appointment_status(first.id, AppointmentStatus::Pending)
        .await;
    assert!(matches!(reactivated, Err(StoreError::SlotTaken)));

    let missing = store
        .update_appointment_status(AppointmentId::new(9999), AppointmentStatus::Cancelled)
        .await;
    assert!(matches!(missing, Err(StoreError::NotFound)));
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_blocked_slot_round_trip() {
    let pool = common::create_test_pool().await;
    cleanup(&pool).await;
    let store = PostgresLedgerStore::new(pool.clone());

    let key = common::key(common::date(2030, 3, 4), 12);
    let block = NewBlockedSlot {
        barber_id: key.barber_id,
        date: key.date,
        time: key.time,
        reason: Some("Almuerzo".to_string()),
        created_at: truncate_to_micros(Utc::now()),
    };

    let stored = store.insert_blocked_slot(block.clone()).await.unwrap();
    assert!(matches!(
        store.insert_blocked_slot(block).await,
        Err(StoreError::SlotTaken)
    ));
    assert_eq!(store.load_blocked_slots().await.unwrap(), vec![stored.clone()]);

    store.delete_blocked_slot(stored.id).await.unwrap();
    assert!(store.load_blocked_slots().await.unwrap().is_empty());
    assert!(matches!(
        store.delete_blocked_slot(stored.id).await,
        Err(StoreError::NotFound)
    ));
}
