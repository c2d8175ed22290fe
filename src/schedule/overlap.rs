use chrono::NaiveTime;
use chrono::Timelike;

use crate::error::{PlacementError, ValidationError};
use super::types::{Reservation, SlotGrid, TimeSlot};

/// A reservation that has not been stored yet, in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub start: TimeSlot,
    pub slot_span: u32,
}

impl Candidate {
    pub fn new(start: TimeSlot, slot_span: u32) -> Self {
        Candidate { start, slot_span }
    }

    /// Converts a wall-clock start and a duration to grid units. The start
    /// must sit on a slot boundary and the duration must be a positive
    /// multiple of the slot length. Whether the start is inside business
    /// hours is left to [`check_placement`].
    pub fn from_time(grid: &SlotGrid, start: NaiveTime, duration_minutes: u32) -> Result<Self, ValidationError> {
        let granularity = grid.slot_minutes();
        let slot = TimeSlot::from_hm(start.hour(), start.minute());
        if start.second() != 0 || slot.minutes() % granularity != 0 {
            return Err(ValidationError::StartNotOnGrid(slot, granularity));
        }
        if duration_minutes == 0 {
            return Err(ValidationError::NonPositiveDuration);
        }
        if duration_minutes % granularity != 0 {
            return Err(ValidationError::DurationNotMultiple {
                duration: duration_minutes,
                granularity,
            });
        }
        Ok(Candidate::new(slot, duration_minutes / granularity))
    }

    fn minute_range(&self, grid: &SlotGrid) -> (u64, u64) {
        let start = u64::from(self.start.minutes());
        (start, start + u64::from(self.slot_span) * u64::from(grid.slot_minutes()))
    }
}

/// Checks that `candidate` starts on a grid label, ends no later than the
/// terminator, and shares no slot with any of `existing`.
///
/// `existing` must hold the reservations of one court and day. They are
/// compared by wall-clock minutes, so rows that do not sit on the grid
/// still block. When several collide, the earliest-starting one is reported.
pub fn check_placement(
    grid: &SlotGrid,
    existing: &[Reservation],
    candidate: &Candidate,
) -> Result<(), PlacementError> {
    if candidate.slot_span == 0 {
        return Err(PlacementError::EmptySpan);
    }
    let outside = PlacementError::OutsideBusinessHours {
        start: candidate.start,
        slot_span: candidate.slot_span,
    };
    let Some(position) = grid.position(candidate.start) else {
        return Err(outside);
    };
    if candidate.slot_span as usize > grid.bookable_len() - position {
        return Err(outside);
    }

    let (start, end) = candidate.minute_range(grid);
    let closing = u64::from(grid.close_hour()) * 60;
    let blocking = existing
        .iter()
        .filter(|r| {
            let r_start = u64::from(r.start_slot().minutes());
            let r_len = u64::from(r.slot_span(grid.slot_minutes())) * u64::from(grid.slot_minutes());
            // Nothing past closing can collide, so stored lengths are cut there.
            let r_end = (r_start + r_len).min(closing.max(r_start));
            start < r_end && r_start < end
        })
        .min_by_key(|r| (r.start, r.id));

    match blocking {
        Some(r) => Err(PlacementError::Collision { blocking: r.id }),
        None => Ok(()),
    }
}

/// `true` when [`check_placement`] accepts the candidate.
pub fn can_place(grid: &SlotGrid, existing: &[Reservation], candidate: &Candidate) -> bool {
    check_placement(grid, existing, candidate).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::slot_utils::generate;
    use crate::schedule::types::{CourtId, ReservationId, ReservationKind};
    use chrono::NaiveDate;

    fn reservation(id: u64, hour: u32, minute: u32, duration: u32) -> Reservation {
        Reservation {
            id: ReservationId(id),
            court_id: CourtId(1),
            start: NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(hour, minute, 0)
                .unwrap(),
            duration_minutes: duration,
            kind: ReservationKind::Match,
            description: String::new(),
            players: vec![],
            coach: None,
            contact_phone: None,
        }
    }

    fn at(hour: u32, minute: u32, slots: u32) -> Candidate {
        Candidate::new(TimeSlot::from_hm(hour, minute), slots)
    }

    #[test]
    fn rejects_span_past_terminator() {
        let grid = generate(8, 22, 30).unwrap();
        assert_eq!(
            check_placement(&grid, &[], &at(21, 30, 2)),
            Err(PlacementError::OutsideBusinessHours {
                start: TimeSlot::from_hm(21, 30),
                slot_span: 2
            })
        );
        assert!(can_place(&grid, &[], &at(21, 30, 1)));
        assert!(can_place(&grid, &[], &at(21, 0, 2)));
    }

    #[test]
    fn rejects_starts_outside_the_grid() {
        let grid = generate(8, 22, 30).unwrap();
        assert!(!can_place(&grid, &[], &at(7, 30, 1)));
        assert!(!can_place(&grid, &[], &at(22, 0, 1)));
        assert!(!can_place(&grid, &[], &at(9, 15, 1)));
        assert_eq!(check_placement(&grid, &[], &at(9, 0, 0)), Err(PlacementError::EmptySpan));
    }

    #[test]
    fn collision_and_adjacency() {
        let grid = generate(8, 22, 30).unwrap();
        let existing = vec![reservation(5, 10, 0, 60)];
        assert_eq!(
            check_placement(&grid, &existing, &at(10, 30, 2)),
            Err(PlacementError::Collision { blocking: ReservationId(5) })
        );
        assert!(can_place(&grid, &existing, &at(11, 0, 2)));
        assert!(can_place(&grid, &existing, &at(9, 0, 2)));
        assert!(!can_place(&grid, &existing, &at(9, 0, 3)));
    }

    #[test]
    fn reports_earliest_blocking_reservation() {
        let grid = generate(8, 22, 30).unwrap();
        let existing = vec![reservation(2, 12, 0, 30), reservation(1, 11, 0, 30)];
        assert_eq!(
            check_placement(&grid, &existing, &at(10, 0, 6)),
            Err(PlacementError::Collision { blocking: ReservationId(1) })
        );
    }

    #[test]
    fn off_grid_rows_still_block() {
        let grid = generate(8, 22, 30).unwrap();
        let existing = vec![reservation(9, 10, 15, 30)];
        assert!(!can_place(&grid, &existing, &at(10, 0, 1)));
        assert!(!can_place(&grid, &existing, &at(10, 30, 1)));
        assert!(can_place(&grid, &existing, &at(11, 0, 1)));
    }

    #[test]
    fn huge_existing_duration_blocks_rest_of_day() {
        let grid = generate(8, 22, 30).unwrap();
        let existing = vec![reservation(3, 10, 0, 4_294_967_280)];
        assert_eq!(
            check_placement(&grid, &existing, &at(12, 0, 1)),
            Err(PlacementError::Collision { blocking: ReservationId(3) })
        );
        assert!(!can_place(&grid, &existing, &at(21, 30, 1)));
        assert!(can_place(&grid, &existing, &at(9, 0, 2)));
    }

    #[test]
    fn huge_candidate_span_is_outside_hours() {
        let grid = generate(8, 22, 30).unwrap();
        assert!(matches!(
            check_placement(&grid, &[], &at(8, 0, u32::MAX)),
            Err(PlacementError::OutsideBusinessHours { .. })
        ));
    }

    #[test]
    fn candidate_from_time_checks_alignment() {
        let grid = generate(8, 22, 30).unwrap();
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(Candidate::from_time(&grid, nine, 90), Ok(at(9, 0, 3)));
        assert_eq!(
            Candidate::from_time(&grid, NaiveTime::from_hms_opt(9, 10, 0).unwrap(), 30),
            Err(ValidationError::StartNotOnGrid(TimeSlot::from_hm(9, 10), 30))
        );
        assert_eq!(Candidate::from_time(&grid, nine, 0), Err(ValidationError::NonPositiveDuration));
        assert_eq!(
            Candidate::from_time(&grid, nine, 45),
            Err(ValidationError::DurationNotMultiple { duration: 45, granularity: 30 })
        );
    }
}
