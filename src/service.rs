//! Booking sheet operations on top of a [`ReservationStore`], with a
//! per-(court, day) cache of computed partitions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GridConfig;
use crate::error::{BookingError, ConfigError};
use crate::form::submission::{validate_quick_match, validate_request, QuickMatchRequest, ReservationRequest};
use crate::schedule::availability::partition;
use crate::schedule::overlap::{check_placement, Candidate};
use crate::schedule::types::{Court, CourtId, Person, PersonProfile, Reservation, RunView, SlotGrid};
use crate::store::{NewReservation, ReservationStore};

/// One court's day as the presentation layer consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySheet {
    pub court: Court,
    pub date: NaiveDate,
    /// Store version the runs were computed from. Send it back as
    /// `expected_version` when booking from this sheet.
    pub version: u64,
    pub slot_minutes: u32,
    pub runs: Vec<RunView>,
}

impl DaySheet {
    pub fn build(grid: &SlotGrid, court: Court, date: NaiveDate, version: u64, reservations: &[Reservation]) -> Self {
        let runs = partition(grid, reservations)
            .iter()
            .map(|run| run.view(grid))
            .collect();
        DaySheet {
            court,
            date,
            version,
            slot_minutes: grid.slot_minutes(),
            runs,
        }
    }
}

type CacheKey = (CourtId, NaiveDate);

/// A computed sheet and the grid it was computed on.
struct CachedSheet {
    grid: Arc<SlotGrid>,
    sheet: Arc<DaySheet>,
}

pub struct BookingService {
    grid: RwLock<Arc<SlotGrid>>,
    store: Arc<dyn ReservationStore>,
    cache: Mutex<HashMap<CacheKey, CachedSheet>>,
    venue: FixedOffset,
}

impl BookingService {
    pub fn new(grid: SlotGrid, store: Arc<dyn ReservationStore>) -> Self {
        Self {
            grid: RwLock::new(Arc::new(grid)),
            store,
            cache: Mutex::new(HashMap::new()),
            venue: Utc.fix(),
        }
    }

    /// Offset that timestamps sent with a `Z` or `+hh:mm` suffix are
    /// converted to. UTC unless set.
    pub fn with_venue_offset(mut self, venue: FixedOffset) -> Self {
        self.venue = venue;
        self
    }

    pub fn venue_offset(&self) -> FixedOffset {
        self.venue
    }

    pub fn from_config(config: &GridConfig, store: Arc<dyn ReservationStore>) -> Result<Self, ConfigError> {
        Ok(Self::new(config.build_grid()?, store))
    }

    pub fn grid(&self) -> Arc<SlotGrid> {
        Arc::clone(&self.grid.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn store(&self) -> &Arc<dyn ReservationStore> {
        &self.store
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<CacheKey, CachedSheet>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Regenerates the grid and drops every cached partition.
    pub fn reconfigure(&self, config: &GridConfig) -> Result<(), ConfigError> {
        let grid = config.build_grid()?;
        *self.grid.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(grid);
        self.cache().clear();
        info!(?config, "slot grid reconfigured");
        Ok(())
    }

    pub fn courts(&self) -> Vec<Court> {
        self.store.list_courts()
    }

    fn court(&self, id: CourtId) -> Result<Court, BookingError> {
        self.store.court(id).ok_or(BookingError::CourtNotFound(id))
    }

    pub fn reservations(&self, court: CourtId, date: NaiveDate) -> Result<Vec<Reservation>, BookingError> {
        self.court(court)?;
        Ok(self.store.list_reservations(court, date))
    }

    pub fn persons(&self, profile: Option<PersonProfile>, name: &str) -> Vec<Person> {
        self.store.list_persons(profile, name)
    }

    /// Partition of the court's day, served from cache while the store's
    /// day version and the grid are unchanged.
    pub fn day_sheet(&self, court_id: CourtId, date: NaiveDate) -> Result<Arc<DaySheet>, BookingError> {
        let court = self.court(court_id)?;
        let key = (court_id, date);
        let version = self.store.day_version(court_id, date);
        let grid = self.grid();

        if let Some(cached) = self.cache().get(&key) {
            if cached.sheet.version == version && Arc::ptr_eq(&cached.grid, &grid) {
                debug!(court = %court_id, %date, version, "day sheet cache hit");
                return Ok(Arc::clone(&cached.sheet));
            }
        }

        let reservations = self.store.list_reservations(court_id, date);
        let sheet = Arc::new(DaySheet::build(&grid, court, date, version, &reservations));
        self.remember(key, grid, Arc::clone(&sheet));
        Ok(sheet)
    }

    /// Caches `sheet` unless `grid` was replaced while it was being built.
    fn remember(&self, key: CacheKey, grid: Arc<SlotGrid>, sheet: Arc<DaySheet>) {
        let current = self.grid();
        if Arc::ptr_eq(&grid, &current) {
            self.cache().insert(key, CachedSheet { grid, sheet });
        } else {
            debug!(court = %key.0, date = %key.1, "grid changed while building day sheet, not cached");
        }
    }

    /// Pre-flight placement check against the latest reservations. The
    /// store repeats it when committing.
    pub fn check_placement(
        &self,
        court: CourtId,
        date: NaiveDate,
        candidate: &Candidate,
    ) -> Result<(), BookingError> {
        let existing = self.reservations(court, date)?;
        check_placement(&self.grid(), &existing, candidate).map_err(BookingError::from)
    }

    pub fn can_place(&self, court: CourtId, date: NaiveDate, candidate: &Candidate) -> bool {
        self.check_placement(court, date, candidate).is_ok()
    }

    pub fn create_reservation(&self, court: CourtId, req: &ReservationRequest) -> Result<Reservation, BookingError> {
        self.court(court)?;
        let new = validate_request(court, req, |id| self.store.person(id))?;
        self.commit(new, req.expected_version)
    }

    pub fn create_quick_match(&self, court: CourtId, req: &QuickMatchRequest) -> Result<Reservation, BookingError> {
        self.court(court)?;
        let new = validate_quick_match(court, req, &self.venue)?;
        self.commit(new, req.expected_version)
    }

    fn commit(&self, new: NewReservation, expected_version: Option<u64>) -> Result<Reservation, BookingError> {
        let key = (new.court_id, new.start.date());
        let grid = self.grid();
        let result = self.store.create_reservation(&grid, new, expected_version);
        if result.is_ok() || matches!(result, Err(BookingError::StaleSnapshot { .. })) {
            self.invalidate(key);
        }
        result
    }

    fn invalidate(&self, key: CacheKey) {
        if self.cache().remove(&key).is_some() {
            debug!(court = %key.0, date = %key.1, "day sheet cache invalidated");
        }
    }
}
