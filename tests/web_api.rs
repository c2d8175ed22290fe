use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use chrono::NaiveDate;
use serde_json::{json, Value};

use court_booking::schedule::types::{Court, CourtId, Person, PersonId, PersonProfile, Reservation, ReservationId, ReservationKind};
use court_booking::web::{configure, AppState};
use court_booking::{BookingService, GridConfig, InMemoryStore};

fn state() -> web::Data<AppState> {
    let store = InMemoryStore::new();
    store.add_court(Court { id: CourtId(1), name: "Central".to_string() });
    store.add_court(Court { id: CourtId(2), name: "Cancha 2".to_string() });
    store.add_person(Person {
        id: PersonId(1),
        name: "Ana Torres".to_string(),
        email: "ana@club.test".to_string(),
        phone: "555-0101".to_string(),
        profile: PersonProfile::Player,
    });
    store.add_person(Person {
        id: PersonId(2),
        name: "Juan Paz".to_string(),
        email: "juan@club.test".to_string(),
        phone: "555-0102".to_string(),
        profile: PersonProfile::Coach,
    });
    store.import_reservation(Reservation {
        id: ReservationId(1),
        court_id: CourtId(1),
        start: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap(),
        duration_minutes: 90,
        kind: ReservationKind::Match,
        description: "Morning doubles".to_string(),
        players: vec![],
        coach: None,
        contact_phone: None,
    });
    let service = BookingService::from_config(&GridConfig::default(), Arc::new(store)).unwrap();
    web::Data::new(AppState { service })
}

#[actix_web::test]
async fn slots_list_the_grid() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
    let req = test::TestRequest::get().uri("/api/slots").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["slot_minutes"], 30);
    let slots = body["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 29);
    assert_eq!(slots[0], json!({ "time": "08:00", "bookable": true }));
    assert_eq!(slots[28], json!({ "time": "22:00", "bookable": false }));
}

#[actix_web::test]
async fn availability_returns_runs() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
    let req = test::TestRequest::get()
        .uri("/api/courts/1/availability?date=2025-03-01")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let runs = body["runs"].as_array().unwrap();
    assert_eq!(runs.len(), 3);
    assert_eq!(runs[0]["status"], "free");
    assert_eq!(runs[0]["slots"], 2);
    assert_eq!(runs[1]["status"], "reserved");
    assert_eq!(runs[1]["start"], "09:00");
    assert_eq!(runs[1]["end"], "10:30");
    assert_eq!(runs[1]["reservation"]["description"], "Morning doubles");
    assert_eq!(runs[2]["slots"], 23);
    assert_eq!(body["version"], 1);
}

#[actix_web::test]
async fn create_then_collide() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

    let lesson = json!({
        "date": "2025-03-01",
        "start_time": "11:00",
        "end_time": "12:00",
        "kind": "LESSON",
        "players": [1],
        "coach": 2,
        "expected_version": 1
    });
    let req = test::TestRequest::post().uri("/api/courts/1/reservations").set_json(&lesson).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["kind"], "LESSON");
    assert_eq!(created["start"], "2025-03-01T11:00:00");

    let overlapping = json!({
        "date": "2025-03-01",
        "start_time": "10:00",
        "end_time": "11:00",
        "kind": "MATCH",
        "description": "Late doubles"
    });
    let req = test::TestRequest::post().uri("/api/courts/1/reservations").set_json(&overlapping).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "COLLISION");
    assert_eq!(body["details"]["blocking_reservation"], 1);
}

#[actix_web::test]
async fn stale_snapshot_is_distinct_from_collision() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
    let quick = json!({
        "start": "2025-03-01T09:30:00Z",
        "duration_minutes": 30,
        "player_name": "Lucía",
        "expected_version": 0
    });
    let req = test::TestRequest::post().uri("/api/courts/1/matches").set_json(&quick).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "STALE_SNAPSHOT");
    assert_eq!(body["details"]["current"], 1);
}

#[actix_web::test]
async fn outside_hours_and_validation_errors() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
    let late = json!({
        "start": "2025-03-01T21:30:00",
        "duration_minutes": 60,
        "player_name": "Lucía"
    });
    let req = test::TestRequest::post().uri("/api/courts/2/matches").set_json(&late).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "OUTSIDE_BUSINESS_HOURS");

    let lesson_without_coach = json!({
        "date": "2025-03-01",
        "start_time": "12:00",
        "end_time": "13:00",
        "kind": "LESSON",
        "players": [1]
    });
    let req = test::TestRequest::post()
        .uri("/api/courts/2/reservations")
        .set_json(&lesson_without_coach)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn unknown_court_and_bad_date() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
    let req = test::TestRequest::get().uri("/api/courts/9/availability?date=2025-03-01").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/api/courts/1/reservations?date=03-01-2025").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn persons_filter() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
    let req = test::TestRequest::get().uri("/api/persons?profile=COACH").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Juan Paz");

    let req = test::TestRequest::get().uri("/api/persons?name=ana").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body[0]["id"], 1);

    let req = test::TestRequest::get().uri("/api/persons?profile=REFEREE").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn courts_and_reservations_listing() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
    let req = test::TestRequest::get().uri("/api/courts").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!([{ "id": 1, "name": "Central" }, { "id": 2, "name": "Cancha 2" }]));

    let req = test::TestRequest::get().uri("/api/courts/1/reservations?date=2025-03-01").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body[0]["id"], 1);
    assert_eq!(body[0]["duration_minutes"], 90);
}
