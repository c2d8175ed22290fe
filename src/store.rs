//! The reservation store the booking sheet reads from and writes to.
//!
//! [`InMemoryStore`] keeps everything behind one mutex. Its
//! `create_reservation` re-checks placement against the latest reservations
//! while holding that lock, which makes it the serialization point for
//! concurrent bookings of the same court and day.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::error::BookingError;
use crate::schedule::overlap::{check_placement, Candidate};
use crate::schedule::types::{
    Court, CourtId, Person, PersonId, PersonProfile, Reservation, ReservationId, ReservationKind,
    SlotGrid,
};

/// A validated reservation that has not been given an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub court_id: CourtId,
    pub start: NaiveDateTime,
    pub duration_minutes: u32,
    pub kind: ReservationKind,
    pub description: String,
    pub players: Vec<PersonId>,
    pub coach: Option<PersonId>,
    pub contact_phone: Option<String>,
}

impl NewReservation {
    fn into_reservation(self, id: ReservationId) -> Reservation {
        Reservation {
            id,
            court_id: self.court_id,
            start: self.start,
            duration_minutes: self.duration_minutes,
            kind: self.kind,
            description: self.description,
            players: self.players,
            coach: self.coach,
            contact_phone: self.contact_phone,
        }
    }
}

pub trait ReservationStore: Send + Sync {
    fn list_courts(&self) -> Vec<Court>;

    fn court(&self, id: CourtId) -> Option<Court>;

    fn list_reservations(&self, court: CourtId, date: NaiveDate) -> Vec<Reservation>;

    /// Counter bumped on every change to the court's reservations that day.
    fn day_version(&self, court: CourtId, date: NaiveDate) -> u64;

    /// Stores `new` if it can be placed on `grid` against the current
    /// reservations. `expected_version` is the day version the caller's view
    /// was built from; a collision against a newer version is reported as
    /// [`BookingError::StaleSnapshot`].
    fn create_reservation(
        &self,
        grid: &SlotGrid,
        new: NewReservation,
        expected_version: Option<u64>,
    ) -> Result<Reservation, BookingError>;

    /// Persons with the given profile whose name contains `name`, ignoring case.
    fn list_persons(&self, profile: Option<PersonProfile>, name: &str) -> Vec<Person>;

    fn person(&self, id: PersonId) -> Option<Person>;
}

#[derive(Debug, Default)]
struct StoreState {
    courts: Vec<Court>,
    persons: Vec<Person>,
    reservations: HashMap<(CourtId, NaiveDate), Vec<Reservation>>,
    versions: HashMap<(CourtId, NaiveDate), u64>,
    next_id: u64,
}

impl StoreState {
    fn bump(&mut self, key: (CourtId, NaiveDate)) {
        *self.versions.entry(key).or_insert(0) += 1;
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_court(&self, court: Court) {
        let mut state = self.state();
        state.courts.retain(|c| c.id != court.id);
        state.courts.push(court);
        state.courts.sort_by_key(|c| c.id);
    }

    pub fn add_person(&self, person: Person) {
        let mut state = self.state();
        state.persons.retain(|p| p.id != person.id);
        state.persons.push(person);
        state.persons.sort_by_key(|p| p.id);
    }

    /// Inserts an existing reservation as-is, without placement checks.
    /// Used for seed data, which may predate the current grid.
    pub fn import_reservation(&self, reservation: Reservation) {
        let mut state = self.state();
        let key = (reservation.court_id, reservation.date());
        state.next_id = state.next_id.max(reservation.id.0);
        let day = state.reservations.entry(key).or_default();
        if day.iter().any(|r| r.id == reservation.id) {
            warn!(reservation = %reservation.id, "duplicate reservation id in import, replaced");
            day.retain(|r| r.id != reservation.id);
        }
        day.push(reservation);
        day.sort_by_key(|r| r.start);
        state.bump(key);
    }
}

impl ReservationStore for InMemoryStore {
    fn list_courts(&self) -> Vec<Court> {
        self.state().courts.clone()
    }

    fn court(&self, id: CourtId) -> Option<Court> {
        self.state().courts.iter().find(|c| c.id == id).cloned()
    }

    fn list_reservations(&self, court: CourtId, date: NaiveDate) -> Vec<Reservation> {
        self.state()
            .reservations
            .get(&(court, date))
            .cloned()
            .unwrap_or_default()
    }

    fn day_version(&self, court: CourtId, date: NaiveDate) -> u64 {
        self.state().versions.get(&(court, date)).copied().unwrap_or(0)
    }

    fn create_reservation(
        &self,
        grid: &SlotGrid,
        new: NewReservation,
        expected_version: Option<u64>,
    ) -> Result<Reservation, BookingError> {
        let mut state = self.state();
        if !state.courts.iter().any(|c| c.id == new.court_id) {
            return Err(BookingError::CourtNotFound(new.court_id));
        }

        let key = (new.court_id, new.start.date());
        let current = state.versions.get(&key).copied().unwrap_or(0);
        let candidate = Candidate::from_time(grid, new.start.time(), new.duration_minutes)?;
        let existing = state.reservations.get(&key).map(Vec::as_slice).unwrap_or(&[]);

        if let Err(err) = check_placement(grid, existing, &candidate) {
            let err = BookingError::from(err);
            if let (BookingError::Collision { .. }, Some(expected)) = (&err, expected_version) {
                if expected != current {
                    return Err(BookingError::StaleSnapshot { expected, current });
                }
            }
            return Err(err);
        }

        state.next_id += 1;
        let reservation = new.into_reservation(ReservationId(state.next_id));
        let day = state.reservations.entry(key).or_default();
        day.push(reservation.clone());
        day.sort_by_key(|r| r.start);
        state.bump(key);

        info!(
            reservation = %reservation.id,
            court = %reservation.court_id,
            start = %reservation.start,
            minutes = reservation.duration_minutes,
            "reservation created"
        );
        Ok(reservation)
    }

    fn list_persons(&self, profile: Option<PersonProfile>, name: &str) -> Vec<Person> {
        let needle = name.trim().to_lowercase();
        self.state()
            .persons
            .iter()
            .filter(|p| profile.map_or(true, |wanted| p.profile == wanted))
            .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    fn person(&self, id: PersonId) -> Option<Person> {
        self.state().persons.iter().find(|p| p.id == id).cloned()
    }
}
