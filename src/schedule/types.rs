use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use super::slot_utils::{minutes_to_time_string, parse_time_to_minutes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourtId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(pub u64);

impl fmt::Display for CourtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A point in the day's schedule, stored as minutes since midnight.
///
/// Serializes as `"HH:MM"`. `24:00` is representable so a grid that closes
/// at midnight has a terminator label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TimeSlot(u16);

impl TimeSlot {
    pub const fn from_minutes(minutes: u16) -> Self {
        TimeSlot(minutes)
    }

    pub fn from_hm(hours: u32, minutes: u32) -> Self {
        TimeSlot((hours * 60 + minutes) as u16)
    }

    pub fn minutes(self) -> u32 {
        self.0 as u32
    }

    pub fn of_datetime(at: &NaiveDateTime) -> Self {
        TimeSlot::from_hm(at.hour(), at.minute())
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&minutes_to_time_string(self.minutes()))
    }
}

impl FromStr for TimeSlot {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_time_to_minutes(s)
            .map(|m| TimeSlot(m as u16))
            .ok_or_else(|| ValidationError::InvalidTime(s.to_string()))
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.to_string()
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The ordered labels of one business day, shared read-only by all courts.
///
/// The last label sits exactly on the closing hour. It terminates the grid
/// and nothing can start there, so positions `0..bookable_len()` are the
/// only ones a reservation may occupy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotGrid {
    pub(crate) open_hour: u32,
    pub(crate) close_hour: u32,
    pub(crate) slot_minutes: u32,
    pub(crate) slots: Vec<TimeSlot>,
}

impl SlotGrid {
    pub fn open_hour(&self) -> u32 {
        self.open_hour
    }

    pub fn close_hour(&self) -> u32 {
        self.close_hour
    }

    pub fn slot_minutes(&self) -> u32 {
        self.slot_minutes
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    /// Number of labels, terminator included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of positions a reservation may occupy.
    pub fn bookable_len(&self) -> usize {
        self.slots.len().saturating_sub(1)
    }

    pub fn label(&self, position: usize) -> Option<TimeSlot> {
        self.slots.get(position).copied()
    }

    pub fn terminator(&self) -> Option<TimeSlot> {
        self.slots.last().copied()
    }

    /// Grid position of `slot`, or `None` when it is not one of the labels.
    pub fn position(&self, slot: TimeSlot) -> Option<usize> {
        let offset = slot.minutes().checked_sub(self.open_hour * 60)?;
        if offset % self.slot_minutes != 0 {
            return None;
        }
        let position = (offset / self.slot_minutes) as usize;
        (position < self.slots.len()).then_some(position)
    }

    pub fn is_bookable(&self, position: usize) -> bool {
        position < self.bookable_len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Court {
    pub id: CourtId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PersonProfile {
    Player,
    Coach,
}

impl PersonProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            PersonProfile::Player => "player",
            PersonProfile::Coach => "coach",
        }
    }
}

impl FromStr for PersonProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PLAYER" => Ok(PersonProfile::Player),
            "COACH" => Ok(PersonProfile::Coach),
            other => Err(format!("unknown profile {:?}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub profile: PersonProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReservationKind {
    Match,
    Lesson,
}

impl FromStr for ReservationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MATCH" => Ok(ReservationKind::Match),
            "LESSON" => Ok(ReservationKind::Lesson),
            other => Err(format!("unknown reservation kind {:?}", other)),
        }
    }
}

/// A booked interval on one court. Only `start` and `duration_minutes`
/// matter for scheduling; the rest is descriptive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub court_id: CourtId,
    pub start: NaiveDateTime,
    pub duration_minutes: u32,
    pub kind: ReservationKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub players: Vec<PersonId>,
    #[serde(default)]
    pub coach: Option<PersonId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
}

impl Reservation {
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn start_slot(&self) -> TimeSlot {
        TimeSlot::of_datetime(&self.start)
    }

    /// Consecutive grid positions occupied from the start slot. Rounds up so
    /// legacy rows with an unaligned duration still cover their last slot.
    pub fn slot_span(&self, slot_minutes: u32) -> u32 {
        self.duration_minutes.div_ceil(slot_minutes)
    }
}

/// Classification of a [`Run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy<'a> {
    Free,
    Reserved(&'a Reservation),
}

/// A maximal stretch of bookable grid positions that is either free or
/// held by exactly one reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run<'a> {
    pub start: usize,
    pub len: usize,
    pub occupancy: Occupancy<'a>,
}

impl<'a> Run<'a> {
    pub fn is_free(&self) -> bool {
        matches!(self.occupancy, Occupancy::Free)
    }

    pub fn reservation(&self) -> Option<&'a Reservation> {
        match self.occupancy {
            Occupancy::Free => None,
            Occupancy::Reserved(r) => Some(r),
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn minutes(&self, grid: &SlotGrid) -> u32 {
        self.len as u32 * grid.slot_minutes()
    }

    /// Owned form of the run with its labels resolved against `grid`.
    pub fn view(&self, grid: &SlotGrid) -> RunView {
        let start = grid.slots[self.start];
        RunView {
            start,
            end: grid
                .label(self.end())
                .unwrap_or_else(|| TimeSlot::from_minutes((start.minutes() + self.minutes(grid)) as u16)),
            slots: self.len,
            minutes: self.minutes(grid),
            status: if self.is_free() { RunStatus::Free } else { RunStatus::Reserved },
            reservation: self.reservation().cloned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Free,
    Reserved,
}

/// A run detached from the reservation slice it was computed from, ready
/// to be cached or sent to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunView {
    pub start: TimeSlot,
    /// Exclusive end label.
    pub end: TimeSlot,
    pub slots: usize,
    pub minutes: u32,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation: Option<Reservation>,
}
