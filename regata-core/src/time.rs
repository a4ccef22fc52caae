//! Преобразование календарного GPS времени в Unix epoch
//!
//! Календарные поля трактуются как UTC без поправки на летнее время.

use chrono::NaiveDate;

use regata_types::{RegataError, RegataResult};

/// Переводит календарные поля (UTC) в Unix timestamp (секунды).
///
/// Возвращает ошибку для несуществующих дат (31 февраля и т.п.) и для
/// дат до 1970 года — приёмники работают с беззнаковыми секундами.
pub fn epoch_from_calendar(
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
) -> RegataResult<u32> {
    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .ok_or_else(|| RegataError::invalid_timestamp(format!("{year:04}-{month:02}-{day:02}")))?;

    let datetime = date
        .and_hms_opt(hour as u32, minute as u32, second as u32)
        .ok_or_else(|| RegataError::invalid_timestamp(format!("{hour:02}:{minute:02}:{second:02}")))?;

    let secs = datetime.and_utc().timestamp();

    u32::try_from(secs)
        .map_err(|_| RegataError::invalid_timestamp(format!("epoch {secs} out of u32 range")))
}
