use std::sync::{Arc, Barrier};
use std::thread;

use chrono::NaiveDate;

use court_booking::form::ReservationRequest;
use court_booking::schedule::types::{Court, CourtId, ReservationKind};
use court_booking::{BookingError, BookingService, GridConfig, InMemoryStore, ReservationStore};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()
}

fn service() -> Arc<BookingService> {
    let store = InMemoryStore::new();
    store.add_court(Court { id: CourtId(1), name: "Central".to_string() });
    Arc::new(BookingService::from_config(&GridConfig::default(), Arc::new(store)).unwrap())
}

fn request(start: &str, end: &str, expected_version: Option<u64>) -> ReservationRequest {
    ReservationRequest {
        date: day(),
        start_time: start.to_string(),
        end_time: end.to_string(),
        kind: ReservationKind::Match,
        description: Some("Singles".to_string()),
        players: vec![],
        coach: None,
        expected_version,
    }
}

#[test]
fn concurrent_bookings_of_one_slot_admit_exactly_one() {
    let service = service();
    let snapshot = service.day_sheet(CourtId(1), day()).unwrap().version;
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                service.create_reservation(CourtId(1), &request("18:00", "19:30", Some(snapshot)))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(*err, BookingError::StaleSnapshot { expected: snapshot, current: snapshot + 1 });
    }
    assert_eq!(service.reservations(CourtId(1), day()).unwrap().len(), 1);
}

#[test]
fn without_snapshot_losers_see_the_collision() {
    let service = service();
    let first = service.create_reservation(CourtId(1), &request("10:00", "11:00", None)).unwrap();
    assert_eq!(
        service.create_reservation(CourtId(1), &request("10:30", "11:30", None)),
        Err(BookingError::Collision { blocking: first.id })
    );
}

#[test]
fn sheet_reflects_new_reservation_and_version() {
    let service = service();
    let before = service.day_sheet(CourtId(1), day()).unwrap();
    service.create_reservation(CourtId(1), &request("08:00", "09:00", Some(before.version))).unwrap();

    let after = service.day_sheet(CourtId(1), day()).unwrap();
    assert_eq!(after.version, before.version + 1);
    assert_eq!(after.version, service.store().day_version(CourtId(1), day()));
    assert_eq!(after.runs.len(), 2);
    assert_eq!(after.runs[0].slots, 2);
    assert_eq!(after.runs[1].slots, 26);
}

#[test]
fn misaligned_requests_are_validation_errors() {
    let service = service();
    assert!(matches!(
        service.create_reservation(CourtId(1), &request("10:15", "11:15", None)),
        Err(BookingError::Validation(_))
    ));
    assert!(matches!(
        service.create_reservation(CourtId(1), &request("10:00", "10:45", None)),
        Err(BookingError::Validation(_))
    ));
    assert!(matches!(
        service.create_reservation(CourtId(1), &request("07:00", "08:00", None)),
        Err(BookingError::OutsideBusinessHours { .. })
    ));
    assert!(service.reservations(CourtId(1), day()).unwrap().is_empty());
}
