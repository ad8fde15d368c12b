use std::collections::{BTreeMap, HashMap};

use super::{Appointment, AppointmentId, BarberId, BlockedSlot, CustomerId, SlotKey};

/// 全理容師の予約とブロックの索引付きコレクション。
///
/// 予約はID順に保持し削除しない。有効な予約とブロックは
/// 枠のキーでも索引付けし、空き状況の参照で
/// 全件を走査しないようにする。
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    appointments: BTreeMap<AppointmentId, Appointment>,
    active_by_key: HashMap<SlotKey, AppointmentId>,
    blocks: HashMap<SlotKey, BlockedSlot>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// 永続化されたコレクションから再構築する。
    pub fn from_parts(appointments: Vec<Appointment>, blocks: Vec<BlockedSlot>) -> Self {
        let mut schedule = Self::new();
        for appointment in appointments {
            schedule.upsert_appointment(appointment);
        }
        for block in blocks {
            schedule.insert_block(block);
        }
        schedule
    }

    pub fn appointment(&self, id: AppointmentId) -> Option<&Appointment> {
        self.appointments.get(&id)
    }

    /// `key`を占有しているPendingまたはConfirmedの予約。
    pub fn active_appointment_at(&self, key: &SlotKey) -> Option<&Appointment> {
        self.active_by_key
            .get(key)
            .and_then(|id| self.appointments.get(id))
    }

    pub fn block_at(&self, key: &SlotKey) -> Option<&BlockedSlot> {
        self.blocks.get(key)
    }

    /// 予約を挿入または置換し、枠の索引を同期させる。
    pub fn upsert_appointment(&mut self, appointment: Appointment) {
        let key = appointment.key();
        if self.active_by_key.get(&key) == Some(&appointment.id) {
            self.active_by_key.remove(&key);
        }
        if appointment.is_active() {
            self.active_by_key.insert(key, appointment.id);
        }
        self.appointments.insert(appointment.id, appointment);
    }

    pub fn insert_block(&mut self, block: BlockedSlot) {
        self.blocks.insert(block.key(), block);
    }

    pub fn remove_block(&mut self, key: &SlotKey) -> Option<BlockedSlot> {
        self.blocks.remove(key)
    }

    pub fn appointments_for_barber(&self, barber_id: BarberId) -> Vec<Appointment> {
        self.appointments
            .values()
            .filter(|a| a.barber_id == barber_id)
            .cloned()
            .collect()
    }

    pub fn appointments_for_customer(&self, customer_id: CustomerId) -> Vec<Appointment> {
        self.appointments
            .values()
            .filter(|a| a.customer_id == customer_id)
            .cloned()
            .collect()
    }

    /// 理容師のブロック（日付・時刻順）
    pub fn blocks_for_barber(&self, barber_id: BarberId) -> Vec<BlockedSlot> {
        let mut blocks: Vec<BlockedSlot> = self
            .blocks
            .values()
            .filter(|b| b.barber_id == barber_id)
            .cloned()
            .collect();
        blocks.sort_by_key(|b| (b.date, b.time));
        blocks
    }

    pub fn appointment_count(&self) -> usize {
        self.appointments.len()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AppointmentStatus, BlockId, SlotTime};
    use chrono::{NaiveDate, Utc};

    fn key(hour: u8) -> SlotKey {
        SlotKey::new(
            BarberId::new(2),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            SlotTime::from_hour(hour).unwrap(),
        )
    }

    fn appointment(id: i64, hour: u8, status: AppointmentStatus) -> Appointment {
        let key = key(hour);
        Appointment {
            id: AppointmentId::new(id),
            customer_id: CustomerId::new(3),
            customer_name: "Pedro Usuario".to_string(),
            barber_id: key.barber_id,
            barber_name: "Juan Barbero".to_string(),
            service_name: "Barba".to_string(),
            date: key.date,
            time: key.time,
            status,
            products: vec![],
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_active_index_follows_status() {
        let mut schedule = Schedule::new();
        schedule.upsert_appointment(appointment(1, 10, AppointmentStatus::Confirmed));
        assert_eq!(
            schedule.active_appointment_at(&key(10)).map(|a| a.id),
            Some(AppointmentId::new(1))
        );

        schedule.upsert_appointment(appointment(1, 10, AppointmentStatus::Cancelled));
        assert!(schedule.active_appointment_at(&key(10)).is_none());
        assert_eq!(schedule.appointment_count(), 1);
    }

    #[test]
    fn test_inactive_update_does_not_evict_other_active() {
        let mut schedule = Schedule::new();
        schedule.upsert_appointment(appointment(1, 10, AppointmentStatus::Cancelled));
        schedule.upsert_appointment(appointment(2, 10, AppointmentStatus::Pending));
        schedule.upsert_appointment(appointment(1, 10, AppointmentStatus::Cancelled));

        assert_eq!(
            schedule.active_appointment_at(&key(10)).map(|a| a.id),
            Some(AppointmentId::new(2))
        );
    }

    #[test]
    fn test_from_parts_indexes_blocks() {
        let block = BlockedSlot {
            id: BlockId::new(1),
            barber_id: BarberId::new(2),
            date: key(12).date,
            time: key(12).time,
            reason: Some("Almuerzo".to_string()),
            created_at: Utc::now(),
        };
        let schedule = Schedule::from_parts(
            vec![appointment(1, 10, AppointmentStatus::Pending)],
            vec![block.clone()],
        );

        assert_eq!(schedule.block_at(&key(12)), Some(&block));
        assert_eq!(schedule.blocks_for_barber(BarberId::new(2)), vec![block]);
        assert!(schedule.blocks_for_barber(BarberId::new(9)).is_empty());
        assert_eq!(
            schedule.appointments_for_customer(CustomerId::new(3)).len(),
            1
        );
    }
}
