use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use crate::error::{ConfigError, ValidationError};
use super::types::{SlotGrid, TimeSlot};

/// Parses a time string (HH:MM) to minutes since midnight.
/// `24:00` is accepted as the end of the day.
pub fn parse_time_to_minutes(time_str: &str) -> Option<u32> {
    let (hours, minutes) = time_str.trim().split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if minutes >= 60 || hours > 24 || (hours == 24 && minutes != 0) {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Formats minutes since midnight to time string (HH:MM)
pub fn minutes_to_time_string(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Parses an ISO-8601 date-time into the venue's wall-clock time. A value
/// with an offset (`Z`, `+02:00`) is converted to `venue`; a value without
/// one is taken as venue time already.
pub fn parse_iso_datetime(value: &str, venue: &FixedOffset) -> Result<NaiveDateTime, ValidationError> {
    let trimmed = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(at.with_timezone(venue).naive_local());
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M"))
        .map_err(|_| ValidationError::InvalidDateTime(value.to_string()))
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Checks the grid preconditions: `0 <= open < close <= 24` and a slot
/// length that divides an hour.
pub fn validate_grid_params(open_hour: u32, close_hour: u32, slot_minutes: u32) -> Result<(), ConfigError> {
    if open_hour > 24 {
        return Err(ConfigError::HourOutOfRange(open_hour));
    }
    if close_hour > 24 {
        return Err(ConfigError::HourOutOfRange(close_hour));
    }
    if open_hour >= close_hour {
        return Err(ConfigError::InvertedHours { open: open_hour, close: close_hour });
    }
    if slot_minutes == 0 || 60 % slot_minutes != 0 {
        return Err(ConfigError::NonDividingGranularity(slot_minutes));
    }
    Ok(())
}

/// Builds the day's labels from opening to closing hour, closing boundary
/// included: `(close - open) * 60 / slot_minutes + 1` labels.
pub fn generate(open_hour: u32, close_hour: u32, slot_minutes: u32) -> Result<SlotGrid, ConfigError> {
    validate_grid_params(open_hour, close_hour, slot_minutes)?;

    let start_minutes = open_hour * 60;
    let end_minutes = close_hour * 60;
    let count = ((end_minutes - start_minutes) / slot_minutes) as usize + 1;

    let mut slots = Vec::with_capacity(count);
    let mut current_minutes = start_minutes;
    while current_minutes <= end_minutes {
        slots.push(TimeSlot::from_minutes(current_minutes as u16));
        current_minutes += slot_minutes;
    }

    Ok(SlotGrid {
        open_hour,
        close_hour,
        slot_minutes,
        slots,
    })
}
