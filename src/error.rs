//! Error taxonomy for grid configuration, reservation validation and booking.

use std::path::PathBuf;

use thiserror::Error;

use crate::schedule::types::{CourtId, PersonId, ReservationId, TimeSlot};

/// Invalid grid or application configuration. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("opening hour {open} must be before closing hour {close}")]
    InvertedHours { open: u32, close: u32 },
    #[error("hour {0} is outside 0..=24")]
    HourOutOfRange(u32),
    #[error("slot length of {0} minutes does not divide an hour evenly")]
    NonDividingGranularity(u32),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("UTC offset of {0} minutes is outside -1439..=1439")]
    InvalidUtcOffset(i32),
    #[error("environment variable {name} has invalid value {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

/// A reservation request that does not fit the grid or the request rules.
/// Recoverable by correcting the input; never coerced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid time {0:?}, expected HH:MM")]
    InvalidTime(String),
    #[error("invalid date-time {0:?}, expected ISO-8601")]
    InvalidDateTime(String),
    #[error("start time {0} is not on a {1}-minute slot boundary")]
    StartNotOnGrid(TimeSlot, u32),
    #[error("duration must be positive")]
    NonPositiveDuration,
    #[error("duration of {duration} minutes is not a multiple of {granularity} minutes")]
    DurationNotMultiple { duration: u32, granularity: u32 },
    #[error("end time must be after start time")]
    EndBeforeStart,
    #[error("description is too long ({0} characters, at most 100)")]
    DescriptionTooLong(usize),
    #[error("description is required when no players are selected for a match")]
    MissingDescription,
    #[error("a lesson requires a coach")]
    MissingCoach,
    #[error("a match cannot have a coach (got person {0})")]
    CoachOnMatch(PersonId),
    #[error("at least one player is required for a lesson")]
    MissingPlayers,
    #[error("person {0} does not exist")]
    UnknownPerson(PersonId),
    #[error("person {0} is not a {1}")]
    WrongProfile(PersonId, &'static str),
}

/// Why a candidate cannot be placed on a court's grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("{slot_span} slot(s) starting at {start} fall outside business hours")]
    OutsideBusinessHours { start: TimeSlot, slot_span: u32 },
    #[error("time collides with reservation {blocking}")]
    Collision { blocking: ReservationId },
    #[error("a reservation must span at least one slot")]
    EmptySpan,
}

/// Failure returned when creating a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{slot_span} slot(s) starting at {start} fall outside business hours")]
    OutsideBusinessHours { start: TimeSlot, slot_span: u32 },
    #[error("time collides with reservation {blocking}")]
    Collision { blocking: ReservationId },
    #[error("day changed since version {expected} (now {current}), reload and retry")]
    StaleSnapshot { expected: u64, current: u64 },
    #[error("court {0} not found")]
    CourtNotFound(CourtId),
}

impl From<PlacementError> for BookingError {
    fn from(err: PlacementError) -> Self {
        match err {
            PlacementError::OutsideBusinessHours { start, slot_span } => {
                BookingError::OutsideBusinessHours { start, slot_span }
            }
            PlacementError::Collision { blocking } => BookingError::Collision { blocking },
            PlacementError::EmptySpan => {
                BookingError::Validation(ValidationError::NonPositiveDuration)
            }
        }
    }
}

/// Failure while loading CSV seed data.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{file} line {line}: {message}")]
    Record {
        file: &'static str,
        line: u64,
        message: String,
    },
}
