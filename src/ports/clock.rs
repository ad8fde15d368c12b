use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

/// 現在時刻の参照
///
/// 枠の時刻は店舗の現地時刻のため、時計は時刻と一緒に
/// オフセットも返す。
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    fn local_now(&self) -> NaiveDateTime {
        self.now().naive_local()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

/// 店舗の固定オフセットでのシステム時計
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}
