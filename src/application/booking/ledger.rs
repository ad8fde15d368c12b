use crate::domain::{
    self, Appointment, AppointmentId, AppointmentStatus, BlockedSlot, BookingFacts, DomainEvent,
    Schedule, SlotConflict, SlotKey, SlotStatus, conflict_guard,
};
use crate::ports::{Clock, LedgerStore, StoreError};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, broadcast};

use super::errors::{BookingApplicationError, Result};

/// 変更イベントチャネルの容量。遅い購読者は古いイベントを失う。
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// キーごとの排他ロック。
///
/// エントリは必要時に作成し、保持も待機もされなくなったら削除する。
/// マップには使用中のキーだけが残る。
#[derive(Default)]
struct SlotLocks {
    locks: StdMutex<HashMap<SlotKey, Arc<Mutex<()>>>>,
}

impl SlotLocks {
    fn handle(&self, key: SlotKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|k, lock| *k == key || Arc::strong_count(lock) > 1);
        locks.entry(key).or_default().clone()
    }

    /// キーを最大`timeout`まで待つ。タイムアウトは`SlotUnavailable`になる。
    async fn acquire(&self, key: SlotKey, timeout: Duration) -> Result<OwnedMutexGuard<()>> {
        let lock = self.handle(key);
        tokio::time::timeout(timeout, lock.lock_owned())
            .await
            .map_err(|_| {
                tracing::warn!(slot = %key, "timed out waiting for slot lock");
                BookingApplicationError::SlotUnavailable(key)
            })
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn store_error(err: StoreError, key: SlotKey) -> BookingApplicationError {
    match err {
        StoreError::SlotTaken => BookingApplicationError::SlotUnavailable(key),
        other => BookingApplicationError::LedgerStoreError(other),
    }
}

fn rejected(conflict: SlotConflict) -> BookingApplicationError {
    tracing::warn!(slot = %conflict.key(), "rejected: {}", conflict);
    conflict.into()
}

/// ロック取得済みの変更を専用タスクで実行する。
///
/// タスクが枠のガードを保持し、呼び出し側が途中で破棄されても
/// ストア書き込み、スナップショット更新、イベント発行を最後まで行う。
async fn run_to_completion<T>(task: impl Future<Output = Result<T>> + Send + 'static) -> Result<T>
where
    T: Send + 'static,
{
    tokio::spawn(task).await.map_err(|e| {
        tracing::error!("ledger mutation task failed: {}", e);
        BookingApplicationError::LedgerStoreError(StoreError::Backend(Box::new(e)))
    })?
}

/// 予約台帳
///
/// 予約とブロックの正となるスナップショットを保持する。枠への変更はすべて
/// その枠のロック下で行う：スナップショットで検査し、ストアに書き込み、
/// スナップショットへ反映して変更イベントを発行する。ロック取得後の変更は
/// 呼び出し側から切り離して実行するため、ストアとスナップショットが
/// 食い違うことはない。読み取りはスナップショットを直接参照する。
pub struct AppointmentLedger {
    state: Arc<LedgerState>,
}

struct LedgerState {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    schedule: RwLock<Schedule>,
    locks: SlotLocks,
    lock_timeout: Duration,
    events: broadcast::Sender<DomainEvent>,
}

impl AppointmentLedger {
    /// ストアの内容を読み込んで台帳を作成する。
    pub async fn open(
        store: Arc<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
        lock_timeout: Duration,
    ) -> Result<Self> {
        let appointments = store
            .load_appointments()
            .await
            .map_err(BookingApplicationError::LedgerStoreError)?;
        let blocks = store
            .load_blocked_slots()
            .await
            .map_err(BookingApplicationError::LedgerStoreError)?;

        tracing::info!(
            appointments = appointments.len(),
            blocks = blocks.len(),
            "ledger loaded"
        );

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            state: Arc::new(LedgerState {
                store,
                clock,
                schedule: RwLock::new(Schedule::from_parts(appointments, blocks)),
                locks: SlotLocks::default(),
                lock_timeout,
                events,
            }),
        })
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.state.clock
    }

    /// 以降のすべての変更のイベント
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.state.events.subscribe()
    }

    /// 現在のスナップショットに対して読み取りを行う。
    pub async fn read<R>(&self, f: impl FnOnce(&Schedule) -> R) -> R {
        self.state.read(f).await
    }

    pub async fn classify(&self, key: &SlotKey) -> SlotStatus {
        let now = self.state.clock.local_now();
        self.read(|schedule| domain::availability::classify(schedule, key, now))
            .await
    }

    pub async fn appointment(&self, id: AppointmentId) -> Option<Appointment> {
        self.read(|schedule| schedule.appointment(id).cloned()).await
    }

    async fn lock(&self, key: SlotKey) -> Result<OwnedMutexGuard<()>> {
        self.state.locks.acquire(key, self.state.lock_timeout).await
    }

    /// 空き枠を予約する。
    ///
    /// # エラー
    /// - `SlotUnavailable`: 枠がFreeでない、ロックがタイムアウトした、または
    ///   ストアが枠の使用済みを報告した
    /// - `LedgerStoreError`: その他のストア障害
    pub async fn reserve(&self, key: SlotKey, facts: BookingFacts) -> Result<Appointment> {
        let guard = self.lock(key).await?;
        let state = Arc::clone(&self.state);
        run_to_completion(async move {
            let _guard = guard;
            state.reserve(key, facts).await
        })
        .await
    }

    /// 空き枠を予約対象から外す。
    ///
    /// # エラー
    /// - `AlreadyBlocked`: キーにブロックが存在する
    /// - `SlotUnavailable`: 枠が予約済みまたは経過済み
    pub async fn block(&self, key: SlotKey, reason: Option<String>) -> Result<BlockedSlot> {
        let guard = self.lock(key).await?;
        let state = Arc::clone(&self.state);
        run_to_completion(async move {
            let _guard = guard;
            state.block(key, reason).await
        })
        .await
    }

    /// 経過していない枠のブロックを解除する。
    ///
    /// # エラー
    /// - `SlotNotBlocked`: キーにブロックがない
    /// - `SlotInPast`: 枠が開始済み
    pub async fn unblock(&self, key: SlotKey) -> Result<BlockedSlot> {
        let guard = self.lock(key).await?;
        let state = Arc::clone(&self.state);
        run_to_completion(async move {
            let _guard = guard;
            state.unblock(key).await
        })
        .await
    }

    /// 予約のステータスを書き込む。
    ///
    /// ステータス書き込みも枠のロックを取り、ストアとスナップショットが
    /// 同じ行への書き込みを同じ順序で受け取るようにする。現在と同じステータスの
    /// 書き込みは何も変更せず、何も発行しない。
    ///
    /// # エラー
    /// - `AppointmentNotFound`: 存在しないID
    /// - `SlotUnavailable`: CancelledまたはCompletedの予約が、
    ///   Freeでなくなった枠で再度有効になろうとした
    pub async fn change_status(
        &self,
        appointment_id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<Appointment> {
        let key = self
            .appointment(appointment_id)
            .await
            .map(|a| a.key())
            .ok_or(BookingApplicationError::AppointmentNotFound(appointment_id))?;

        let guard = self.lock(key).await?;
        let state = Arc::clone(&self.state);
        run_to_completion(async move {
            let _guard = guard;
            state.change_status(key, appointment_id, status).await
        })
        .await
    }

    /// 予約をキャンセルする。2回目のキャンセルも受け付ける。
    pub async fn cancel(&self, appointment_id: AppointmentId) -> Result<Appointment> {
        self.change_status(appointment_id, AppointmentStatus::Cancelled)
            .await
    }
}

// クリティカルセクション。呼び出し側が枠のロックを保持している。
impl LedgerState {
    async fn read<R>(&self, f: impl FnOnce(&Schedule) -> R) -> R {
        let schedule = self.schedule.read().await;
        f(&schedule)
    }

    fn publish(&self, event: DomainEvent) {
        tracing::debug!(
            event_type = event.event_type(),
            slot = %event.key(),
            "publishing change event"
        );
        // 購読者がいなくても問題ない。
        let _ = self.events.send(event);
    }

    async fn reserve(&self, key: SlotKey, facts: BookingFacts) -> Result<Appointment> {
        let now = self.clock.local_now();
        self.read(|schedule| conflict_guard::check_reservable(schedule, &key, now))
            .await
            .map_err(rejected)?;

        let new = domain::appointment::book_appointment(key, facts, self.clock.utc_now());
        let appointment = self
            .store
            .insert_appointment(new)
            .await
            .map_err(|e| store_error(e, key))?;

        self.schedule
            .write()
            .await
            .upsert_appointment(appointment.clone());

        tracing::info!(
            appointment_id = %appointment.id,
            slot = %key,
            "appointment booked"
        );
        self.publish(DomainEvent::AppointmentBooked(
            domain::appointment::appointment_booked(&appointment),
        ));
        Ok(appointment)
    }

    async fn block(&self, key: SlotKey, reason: Option<String>) -> Result<BlockedSlot> {
        let now = self.clock.local_now();
        self.read(|schedule| conflict_guard::check_blockable(schedule, &key, now))
            .await
            .map_err(rejected)?;

        let new = domain::blocked_slot::block_slot(key, reason, self.clock.utc_now());
        let block = self.store.insert_blocked_slot(new).await.map_err(|e| match e {
            StoreError::SlotTaken => BookingApplicationError::AlreadyBlocked(key),
            other => BookingApplicationError::LedgerStoreError(other),
        })?;

        self.schedule.write().await.insert_block(block.clone());

        tracing::info!(block_id = %block.id, slot = %key, "slot blocked");
        self.publish(DomainEvent::SlotBlocked(domain::blocked_slot::slot_blocked(
            &block,
        )));
        Ok(block)
    }

    async fn unblock(&self, key: SlotKey) -> Result<BlockedSlot> {
        let now = self.clock.local_now();
        let block = self
            .read(|schedule| conflict_guard::check_unblockable(schedule, &key, now))
            .await
            .map_err(rejected)?;

        match self.store.delete_blocked_slot(block.id).await {
            Ok(()) | Err(StoreError::NotFound) => {}
            Err(other) => return Err(BookingApplicationError::LedgerStoreError(other)),
        }

        self.schedule.write().await.remove_block(&key);

        tracing::info!(block_id = %block.id, slot = %key, "slot unblocked");
        self.publish(DomainEvent::SlotUnblocked(
            domain::blocked_slot::slot_unblocked(&block, self.clock.utc_now()),
        ));
        Ok(block)
    }

    async fn change_status(
        &self,
        key: SlotKey,
        appointment_id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<Appointment> {
        let now = self.clock.local_now();
        let current = self
            .read(|schedule| {
                let current = schedule
                    .appointment(appointment_id)
                    .cloned()
                    .ok_or(BookingApplicationError::AppointmentNotFound(appointment_id))?;
                conflict_guard::check_status_change(schedule, &current, status, now)
                    .map_err(rejected)?;
                Ok::<_, BookingApplicationError>(current)
            })
            .await?;

        if current.status == status {
            tracing::debug!(
                appointment_id = %appointment_id,
                status = status.as_str(),
                "status unchanged"
            );
            return Ok(current);
        }

        self.store
            .update_appointment_status(appointment_id, status)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => BookingApplicationError::AppointmentNotFound(appointment_id),
                other => store_error(other, key),
            })?;

        let (updated, event) =
            domain::appointment::change_status(&current, status, self.clock.utc_now());
        self.schedule.write().await.upsert_appointment(updated.clone());

        tracing::info!(
            appointment_id = %appointment_id,
            from = current.status.as_str(),
            to = status.as_str(),
            "appointment status changed"
        );
        self.publish(DomainEvent::AppointmentStatusChanged(event));
        Ok(updated)
    }
}
