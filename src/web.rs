use actix_web::http::StatusCode;
use actix_web::{middleware, web, App, HttpResponse, HttpServer, ResponseError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::BookingError;
use crate::form::{QuickMatchRequest, ReservationRequest};
use crate::schedule::types::{CourtId, PersonProfile, TimeSlot};
use crate::service::BookingService;

pub struct AppState {
    pub service: BookingService,
}

/// Error body returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip)]
    status: u16,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
            status: status.as_u16(),
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        let message = err.to_string();
        match err {
            BookingError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message),
            BookingError::OutsideBusinessHours { .. } => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "OUTSIDE_BUSINESS_HOURS", message)
            }
            BookingError::Collision { blocking } => Self::new(StatusCode::CONFLICT, "COLLISION", message)
                .with_details(serde_json::json!({ "blocking_reservation": blocking })),
            BookingError::StaleSnapshot { expected, current } => {
                Self::new(StatusCode::CONFLICT, "STALE_SNAPSHOT", message)
                    .with_details(serde_json::json!({ "expected": expected, "current": current }))
            }
            BookingError::CourtNotFound(_) => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
        }
    }
}

type ApiResult = Result<HttpResponse, ApiError>;

#[derive(Deserialize)]
pub struct DateQuery {
    date: String,
}

impl DateQuery {
    fn date(&self) -> Result<NaiveDate, ApiError> {
        crate::schedule::slot_utils::parse_date(&self.date)
            .ok_or_else(|| ApiError::bad_request(format!("invalid date {:?}, expected YYYY-MM-DD", self.date)))
    }
}

#[derive(Deserialize)]
pub struct PersonsQuery {
    profile: Option<String>,
    #[serde(default)]
    name: String,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    slot_minutes: u32,
    open_hour: u32,
    close_hour: u32,
    slots: Vec<SlotEntry>,
}

#[derive(Serialize)]
pub struct SlotEntry {
    time: TimeSlot,
    bookable: bool,
}

async fn get_slots(state: web::Data<AppState>) -> ApiResult {
    let grid = state.service.grid();
    let slots = grid
        .slots()
        .iter()
        .enumerate()
        .map(|(position, &time)| SlotEntry {
            time,
            bookable: grid.is_bookable(position),
        })
        .collect();
    Ok(HttpResponse::Ok().json(SlotsResponse {
        slot_minutes: grid.slot_minutes(),
        open_hour: grid.open_hour(),
        close_hour: grid.close_hour(),
        slots,
    }))
}

async fn list_courts(state: web::Data<AppState>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.service.courts()))
}

async fn list_reservations(
    court: web::Path<u32>,
    query: web::Query<DateQuery>,
    state: web::Data<AppState>,
) -> ApiResult {
    let reservations = state.service.reservations(CourtId(*court), query.date()?)?;
    Ok(HttpResponse::Ok().json(reservations))
}

async fn get_availability(
    court: web::Path<u32>,
    query: web::Query<DateQuery>,
    state: web::Data<AppState>,
) -> ApiResult {
    let sheet = state.service.day_sheet(CourtId(*court), query.date()?)?;
    Ok(HttpResponse::Ok().json(&*sheet))
}

async fn create_reservation(
    court: web::Path<u32>,
    req: web::Json<ReservationRequest>,
    state: web::Data<AppState>,
) -> ApiResult {
    let reservation = state.service.create_reservation(CourtId(*court), &req)?;
    Ok(HttpResponse::Created().json(reservation))
}

async fn create_match(
    court: web::Path<u32>,
    req: web::Json<QuickMatchRequest>,
    state: web::Data<AppState>,
) -> ApiResult {
    let reservation = state.service.create_quick_match(CourtId(*court), &req)?;
    Ok(HttpResponse::Created().json(reservation))
}

async fn list_persons(query: web::Query<PersonsQuery>, state: web::Data<AppState>) -> ApiResult {
    let profile = match query.profile.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(raw) => Some(raw.parse::<PersonProfile>().map_err(|e| ApiError::bad_request(e))?),
        None => None,
    };
    Ok(HttpResponse::Ok().json(state.service.persons(profile, &query.name)))
}

/// Registers the API routes. Shared by the server and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/slots", web::get().to(get_slots))
            .route("/courts", web::get().to(list_courts))
            .route("/courts/{id}/reservations", web::get().to(list_reservations))
            .route("/courts/{id}/reservations", web::post().to(create_reservation))
            .route("/courts/{id}/availability", web::get().to(get_availability))
            .route("/courts/{id}/matches", web::post().to(create_match))
            .route("/persons", web::get().to(list_persons)),
    );
}

pub async fn start_server(host: &str, port: u16, service: BookingService) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState { service });

    info!("Starting web server on {}:{}", host, port);
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind((host, port))?
    .run()
    .await
}
