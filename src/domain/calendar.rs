use chrono::{Datelike, Duration, NaiveDate};

use super::{SlotTime, WeekNavigationError};

/// 1日の最初の予約可能時刻
pub const OPENING_HOUR: u8 = 9;

/// 1日の最後の予約可能時刻（含む）
pub const LAST_SLOT_HOUR: u8 = 19;

/// 1週間の日数
pub const DAYS_PER_WEEK: i64 = 7;

/// `reference`を含むISO週の月曜日。
pub fn week_start(reference: NaiveDate) -> NaiveDate {
    reference - Duration::days(i64::from(reference.weekday().num_days_from_monday()))
}

/// `week_start`から始まる週の7日間（月曜〜日曜）。
pub fn days_of(week_start: NaiveDate) -> Vec<NaiveDate> {
    (0..DAYS_PER_WEEK)
        .map(|offset| week_start + Duration::days(offset))
        .collect()
}

/// 予約可能な時刻。09:00から19:00まで1時間刻み。
pub fn time_slots() -> Vec<SlotTime> {
    (OPENING_HOUR..=LAST_SLOT_HOUR)
        .filter_map(|hour| SlotTime::from_hour(hour).ok())
        .collect()
}

/// `time`がグリッドの予約可能時刻かどうか。
pub fn is_bookable_time(time: SlotTime) -> bool {
    (OPENING_HOUR..=LAST_SLOT_HOUR).contains(&time.hour())
}

pub fn next_week(week_start: NaiveDate) -> NaiveDate {
    week_start + Duration::days(DAYS_PER_WEEK)
}

/// `week_start`の前週。`today`を含む週より前になる場合は拒否する。
pub fn previous_week(
    week_start: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate, WeekNavigationError> {
    let target = week_start - Duration::days(DAYS_PER_WEEK);
    ensure_not_past_week(target, today)?;
    Ok(target)
}

/// 今週の開始より前の週の開始日を拒否する。
pub fn ensure_not_past_week(
    week_start: NaiveDate,
    today: NaiveDate,
) -> Result<(), WeekNavigationError> {
    if week_start < self::week_start(today) {
        return Err(WeekNavigationError::PastWeek);
    }
    Ok(())
}
