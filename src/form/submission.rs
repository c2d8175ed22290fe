use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::schedule::slot_utils::{parse_iso_datetime, parse_time_to_minutes};
use crate::schedule::types::{CourtId, Person, PersonId, PersonProfile, ReservationKind};
use crate::store::NewReservation;

pub const MAX_DESCRIPTION_LEN: usize = 100;

/// Reservation form as sent by the booking sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub kind: ReservationKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub players: Vec<PersonId>,
    #[serde(default)]
    pub coach: Option<PersonId>,
    /// Day version the client's sheet was built from.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Quick match booked straight from a free run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickMatchRequest {
    /// ISO-8601 date-time. Without an offset it is read as venue time.
    pub start: String,
    pub duration_minutes: u32,
    pub player_name: String,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

fn time_of_day(value: &str) -> Result<u32, ValidationError> {
    match parse_time_to_minutes(value) {
        Some(minutes) if minutes < 24 * 60 => Ok(minutes),
        _ => Err(ValidationError::InvalidTime(value.to_string())),
    }
}

fn check_description(description: &str) -> Result<(), ValidationError> {
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::DescriptionTooLong(len));
    }
    Ok(())
}

fn check_person<F>(lookup: &F, id: PersonId, profile: PersonProfile) -> Result<(), ValidationError>
where
    F: Fn(PersonId) -> Option<Person>,
{
    match lookup(id) {
        None => Err(ValidationError::UnknownPerson(id)),
        Some(person) if person.profile != profile => Err(ValidationError::WrongProfile(id, profile.as_str())),
        Some(_) => Ok(()),
    }
}

/// Validates a reservation form and converts it for the store.
///
/// Grid alignment and collisions are checked by the store at commit time.
pub fn validate_request<F>(
    court_id: CourtId,
    req: &ReservationRequest,
    lookup: F,
) -> Result<NewReservation, ValidationError>
where
    F: Fn(PersonId) -> Option<Person>,
{
    let start = time_of_day(&req.start_time)?;
    let end = time_of_day(&req.end_time)?;
    if end <= start {
        return Err(ValidationError::EndBeforeStart);
    }

    let description = req.description.as_deref().unwrap_or("").trim().to_string();
    check_description(&description)?;

    match req.kind {
        ReservationKind::Match => {
            if let Some(coach) = req.coach {
                return Err(ValidationError::CoachOnMatch(coach));
            }
            if req.players.is_empty() && description.is_empty() {
                return Err(ValidationError::MissingDescription);
            }
        }
        ReservationKind::Lesson => {
            let coach = req.coach.ok_or(ValidationError::MissingCoach)?;
            if req.players.is_empty() {
                return Err(ValidationError::MissingPlayers);
            }
            check_person(&lookup, coach, PersonProfile::Coach)?;
        }
    }
    for &player in &req.players {
        check_person(&lookup, player, PersonProfile::Player)?;
    }

    let start_at = req
        .date
        .and_hms_opt(start / 60, start % 60, 0)
        .ok_or_else(|| ValidationError::InvalidTime(req.start_time.clone()))?;

    Ok(NewReservation {
        court_id,
        start: start_at,
        duration_minutes: end - start,
        kind: req.kind,
        description,
        players: req.players.clone(),
        coach: req.coach,
        contact_phone: None,
    })
}

/// Validates a quick match. The player name doubles as the description.
pub fn validate_quick_match(
    court_id: CourtId,
    req: &QuickMatchRequest,
    venue: &FixedOffset,
) -> Result<NewReservation, ValidationError> {
    let start = parse_iso_datetime(&req.start, venue)?;
    if req.duration_minutes == 0 {
        return Err(ValidationError::NonPositiveDuration);
    }
    let player_name = req.player_name.trim().to_string();
    if player_name.is_empty() {
        return Err(ValidationError::MissingDescription);
    }
    check_description(&player_name)?;

    Ok(NewReservation {
        court_id,
        start,
        duration_minutes: req.duration_minutes,
        kind: ReservationKind::Match,
        description: player_name,
        players: Vec::new(),
        coach: None,
        contact_phone: req
            .contact_phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
    })
}
