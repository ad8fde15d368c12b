use crate::ports::calendar_notifier::{BookedEvent, CalendarNotifier as CalendarNotifierTrait, Result};
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// プロバイダーを呼ばずにイベントを記録するCalendarNotifier
///
/// 受け付けたイベントにはランダムな参照を返す。`fail`を立てると
/// プロバイダー障害を再現する。
pub struct CalendarNotifier {
    sent: Mutex<Vec<(String, BookedEvent)>>,
    fail: bool,
}

impl CalendarNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// これまでに受け付けたイベントと参照
    pub fn sent(&self) -> Vec<(String, BookedEvent)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for CalendarNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CalendarNotifierTrait for CalendarNotifier {
    async fn booking_created(&self, event: BookedEvent) -> Result<String> {
        if self.fail {
            return Err("calendar provider unavailable".into());
        }

        let reference = format!("evt-{}", Uuid::new_v4());
        tracing::debug!(
            appointment_id = %event.appointment_id,
            reference = %reference,
            "calendar event recorded"
        );
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((reference.clone(), event));
        Ok(reference)
    }
}
