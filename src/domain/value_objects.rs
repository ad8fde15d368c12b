use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::SlotTimeError;

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

integer_id!(
    /// 予約ID。挿入時に台帳ストアが割り当てる
    AppointmentId
);
integer_id!(
    /// ブロックID。挿入時に台帳ストアが割り当てる
    BlockId
);
integer_id!(
    /// 理容師への参照（カタログコンテキスト）
    BarberId
);
integer_id!(
    /// 顧客への参照（ユーザーディレクトリコンテキスト）
    CustomerId
);
integer_id!(
    /// サービスへの参照（カタログコンテキスト）
    ServiceId
);
integer_id!(
    /// 商品への参照（カタログコンテキスト）
    ProductId
);
integer_id!(
    /// プロモーションへの参照（プロモーションコンテキスト）
    PromotionId
);

/// カレンダー枠の時刻。
///
/// 枠は1時間幅のため、正時のみ表現できる。
/// `HH:MM`形式でシリアライズする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotTime(u8);

impl SlotTime {
    pub fn from_hour(hour: u8) -> Result<Self, SlotTimeError> {
        if hour > 23 {
            return Err(SlotTimeError::OutOfRange(hour));
        }
        Ok(Self(hour))
    }

    pub fn hour(&self) -> u8 {
        self.0
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.0), 0, 0).unwrap_or_default()
    }

    /// `date`におけるこの枠の開始時刻。
    pub fn on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.as_naive_time())
    }
}

impl TryFrom<NaiveTime> for SlotTime {
    type Error = SlotTimeError;

    fn try_from(time: NaiveTime) -> Result<Self, Self::Error> {
        if time.minute() != 0 || time.second() != 0 {
            return Err(SlotTimeError::NotOnTheHour(time.format("%H:%M").to_string()));
        }
        // hour()は常に24未満
        Ok(Self(time.hour() as u8))
    }
}

impl FromStr for SlotTime {
    type Err = SlotTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let time = NaiveTime::parse_from_str(s, "%H:%M")
            .map_err(|_| SlotTimeError::Malformed(s.to_string()))?;
        Self::try_from(time)
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// (理容師, 日付, 時刻)の組。カレンダー上の排他の単位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotKey {
    pub barber_id: BarberId,
    pub date: NaiveDate,
    pub time: SlotTime,
}

impl SlotKey {
    pub fn new(barber_id: BarberId, date: NaiveDate, time: SlotTime) -> Self {
        Self {
            barber_id,
            date,
            time,
        }
    }

    /// 枠が始まる店舗の現地時刻。
    pub fn starts_at(&self) -> NaiveDateTime {
        self.time.on(self.date)
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "barber {} on {} at {}",
            self.barber_id,
            self.date.format("%Y-%m-%d"),
            self.time
        )
    }
}
