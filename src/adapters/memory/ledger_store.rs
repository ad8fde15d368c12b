use crate::domain::{
    Appointment, AppointmentId, AppointmentStatus, BlockId, BlockedSlot, NewAppointment,
    NewBlockedSlot,
};
use crate::ports::ledger_store::{LedgerStore as LedgerStoreTrait, Result, StoreError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    appointments: BTreeMap<AppointmentId, Appointment>,
    blocks: BTreeMap<BlockId, BlockedSlot>,
    last_appointment_id: i64,
    last_block_id: i64,
}

/// プロセス内のLedgerStore
///
/// Postgres版と同じ振る舞い：連番のIDと同じ一意性ルール
/// （理容師・日付・時刻ごとに有効な予約1件、ブロック1件）。
/// プロセス終了時に内容は失われる。
pub struct LedgerStore {
    tables: Mutex<Tables>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
        }
    }
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStoreTrait for LedgerStore {
    async fn load_appointments(&self) -> Result<Vec<Appointment>> {
        let tables = self.tables.lock().await;
        Ok(tables.appointments.values().cloned().collect())
    }

    async fn load_blocked_slots(&self) -> Result<Vec<BlockedSlot>> {
        let tables = self.tables.lock().await;
        Ok(tables.blocks.values().cloned().collect())
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment> {
        let mut tables = self.tables.lock().await;

        let key = appointment.key();
        if appointment.status.is_active()
            && tables
                .appointments
                .values()
                .any(|a| a.is_active() && a.key() == key)
        {
            return Err(StoreError::SlotTaken);
        }

        tables.last_appointment_id += 1;
        let stored = appointment.with_id(AppointmentId::new(tables.last_appointment_id));
        tables.appointments.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_appointment_status(
        &self,
        appointment_id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<()> {
        let mut tables = self.tables.lock().await;

        let key = tables
            .appointments
            .get(&appointment_id)
            .map(|a| a.key())
            .ok_or(StoreError::NotFound)?;

        if status.is_active()
            && tables
                .appointments
                .values()
                .any(|a| a.id != appointment_id && a.is_active() && a.key() == key)
        {
            return Err(StoreError::SlotTaken);
        }

        if let Some(appointment) = tables.appointments.get_mut(&appointment_id) {
            appointment.status = status;
        }
        Ok(())
    }

    async fn insert_blocked_slot(&self, block: NewBlockedSlot) -> Result<BlockedSlot> {
        let mut tables = self.tables.lock().await;

        let key = block.key();
        if tables.blocks.values().any(|b| b.key() == key) {
            return Err(StoreError::SlotTaken);
        }

        tables.last_block_id += 1;
        let stored = block.with_id(BlockId::new(tables.last_block_id));
        tables.blocks.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete_blocked_slot(&self, block_id: BlockId) -> Result<()> {
        let mut tables = self.tables.lock().await;
        tables
            .blocks
            .remove(&block_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BarberId, CustomerId, SlotKey, SlotTime};
    use chrono::{NaiveDate, Utc};

    fn key(hour: u8) -> SlotKey {
        SlotKey::new(
            BarberId::new(2),
            NaiveDate::from_ymd_opt(2030, 3, 4).unwrap(),
            SlotTime::from_hour(hour).unwrap(),
        )
    }

    fn new_appointment(hour: u8) -> NewAppointment {
        let key = key(hour);
        NewAppointment {
            customer_id: CustomerId::new(3),
            customer_name: "Pedro Usuario".to_string(),
            barber_id: key.barber_id,
            barber_name: "Juan Barbero".to_string(),
            service_name: "Barba".to_string(),
            date: key.date,
            time: key.time,
            status: AppointmentStatus::Pending,
            products: vec![],
            note: None,
            created_at: Utc::now(),
        }
    }

    fn new_block(hour: u8) -> NewBlockedSlot {
        let key = key(hour);
        NewBlockedSlot {
            barber_id: key.barber_id,
            date: key.date,
            time: key.time,
            reason: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = LedgerStore::new();

        let first = store.insert_appointment(new_appointment(9)).await.unwrap();
        let second = store.insert_appointment(new_appointment(10)).await.unwrap();

        assert_eq!(first.id, AppointmentId::new(1));
        assert_eq!(second.id, AppointmentId::new(2));
        assert_eq!(store.load_appointments().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_second_active_appointment_on_key_is_rejected() {
        let store = LedgerStore::new();
        store.insert_appointment(new_appointment(9)).await.unwrap();

        let result = store.insert_appointment(new_appointment(9)).await;
        assert!(matches!(result, Err(StoreError::SlotTaken)));
    }

    #[tokio::test]
    async fn test_cancelled_appointment_frees_key() {
        let store = LedgerStore::new();
        let first = store.insert_appointment(new_appointment(9)).await.unwrap();
        store
            .update_appointment_status(first.id, AppointmentStatus::Cancelled)
            .await
            .unwrap();

        let second = store.insert_appointment(new_appointment(9)).await.unwrap();

        let result = store
            .update_appointment_status(first.id, AppointmentStatus::Confirmed)
            .await;
        assert!(matches!(result, Err(StoreError::SlotTaken)));
        assert_eq!(second.id, AppointmentId::new(2));
    }

    #[tokio::test]
    async fn test_duplicate_block_and_missing_delete() {
        let store = LedgerStore::new();
        let block = store.insert_blocked_slot(new_block(12)).await.unwrap();

        assert!(matches!(
            store.insert_blocked_slot(new_block(12)).await,
            Err(StoreError::SlotTaken)
        ));

        store.delete_blocked_slot(block.id).await.unwrap();
        assert!(matches!(
            store.delete_blocked_slot(block.id).await,
            Err(StoreError::NotFound)
        ));
    }
}
