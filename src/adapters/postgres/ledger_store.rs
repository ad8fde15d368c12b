use crate::domain::{
    Appointment, AppointmentId, AppointmentStatus, BarberId, BlockId, BlockedSlot, CustomerId,
    NewAppointment, NewBlockedSlot, ProductId, ProductLine, SlotTime,
};
use crate::ports::ledger_store::{LedgerStore as LedgerStoreTrait, Result, StoreError};
use async_trait::async_trait;
use chrono::NaiveTime;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::collections::HashMap;
use std::str::FromStr;

/// sqlxのエラーを変換する。枠の一意性インデックス違反は区別する。
fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::SlotTaken,
        _ => StoreError::Backend(Box::new(err)),
    }
}

fn invalid_data(message: String) -> StoreError {
    StoreError::Backend(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message,
    )))
}

fn slot_time(row: &PgRow) -> Result<SlotTime> {
    let time: NaiveTime = row.get("slot_time");
    SlotTime::try_from(time).map_err(|e| invalid_data(e.to_string()))
}

fn map_row_to_appointment(row: &PgRow, products: Vec<ProductLine>) -> Result<Appointment> {
    let status_str: &str = row.get("status");
    let status = AppointmentStatus::from_str(status_str).map_err(invalid_data)?;

    Ok(Appointment {
        id: AppointmentId::new(row.get("id")),
        customer_id: CustomerId::new(row.get("customer_id")),
        customer_name: row.get("customer_name"),
        barber_id: BarberId::new(row.get("barber_id")),
        barber_name: row.get("barber_name"),
        service_name: row.get("service_name"),
        date: row.get("slot_date"),
        time: slot_time(row)?,
        status,
        products,
        note: row.get("note"),
        created_at: row.get("created_at"),
    })
}

fn map_row_to_blocked_slot(row: &PgRow) -> Result<BlockedSlot> {
    Ok(BlockedSlot {
        id: BlockId::new(row.get("id")),
        barber_id: BarberId::new(row.get("barber_id")),
        date: row.get("slot_date"),
        time: slot_time(row)?,
        reason: row.get("reason"),
        created_at: row.get("created_at"),
    })
}

/// LedgerStoreのPostgreSQL実装
///
/// 有効な予約の部分一意インデックスとブロックの一意インデックス
/// （`migrations/`参照）により、2つのプロセスが同じ枠を取り合った場合は
/// データベースが最終的に判定する。
pub struct LedgerStore {
    pool: PgPool,
}

impl LedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStoreTrait for LedgerStore {
    async fn load_appointments(&self) -> Result<Vec<Appointment>> {
        let product_rows = sqlx::query(
            r#"
            SELECT appointment_id, product_id, name, price
            FROM appointment_products
            ORDER BY appointment_id ASC, position ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        let mut products: HashMap<i64, Vec<ProductLine>> = HashMap::new();
        for row in &product_rows {
            products
                .entry(row.get("appointment_id"))
                .or_default()
                .push(ProductLine {
                    id: ProductId::new(row.get("product_id")),
                    name: row.get("name"),
                    price: row.get("price"),
                });
        }

        let rows = sqlx::query(
            r#"
            SELECT id, customer_id, customer_name, barber_id, barber_name, service_name,
                   slot_date, slot_time, status, note, created_at
            FROM appointments
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.iter()
            .map(|row| {
                let id: i64 = row.get("id");
                map_row_to_appointment(row, products.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    async fn load_blocked_slots(&self) -> Result<Vec<BlockedSlot>> {
        let rows = sqlx::query(
            r#"
            SELECT id, barber_id, slot_date, slot_time, reason, created_at
            FROM blocked_slots
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.iter().map(map_row_to_blocked_slot).collect()
    }

    /// 予約行と商品明細は1つのトランザクションで書き込む。
    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO appointments (
                customer_id,
                customer_name,
                barber_id,
                barber_name,
                service_name,
                slot_date,
                slot_time,
                status,
                note,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(appointment.customer_id.value())
        .bind(&appointment.customer_name)
        .bind(appointment.barber_id.value())
        .bind(&appointment.barber_name)
        .bind(&appointment.service_name)
        .bind(appointment.date)
        .bind(appointment.time.as_naive_time())
        .bind(appointment.status.as_str())
        .bind(&appointment.note)
        .bind(appointment.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_error)?;

        if !appointment.products.is_empty() {
            let positions: Vec<i16> = (0..appointment.products.len() as i16).collect();
            let product_ids: Vec<i64> = appointment.products.iter().map(|p| p.id.value()).collect();
            let names: Vec<&str> = appointment.products.iter().map(|p| p.name.as_str()).collect();
            let prices: Vec<i64> = appointment.products.iter().map(|p| p.price).collect();

            sqlx::query(
                r#"
                INSERT INTO appointment_products (appointment_id, position, product_id, name, price)
                SELECT $1, * FROM UNNEST($2::smallint[], $3::bigint[], $4::text[], $5::bigint[])
                "#,
            )
            .bind(id)
            .bind(&positions)
            .bind(&product_ids)
            .bind(&names)
            .bind(&prices)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
        }

        tx.commit().await.map_err(store_error)?;

        Ok(appointment.with_id(AppointmentId::new(id)))
    }

    async fn update_appointment_status(
        &self,
        appointment_id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE appointments SET status = $2 WHERE id = $1")
            .bind(appointment_id.value())
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn insert_blocked_slot(&self, block: NewBlockedSlot) -> Result<BlockedSlot> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO blocked_slots (barber_id, slot_date, slot_time, reason, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(block.barber_id.value())
        .bind(block.date)
        .bind(block.time.as_naive_time())
        .bind(&block.reason)
        .bind(block.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(block.with_id(BlockId::new(id)))
    }

    async fn delete_blocked_slot(&self, block_id: BlockId) -> Result<()> {
        let result = sqlx::query("DELETE FROM blocked_slots WHERE id = $1")
            .bind(block_id.value())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
