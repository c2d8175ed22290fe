//! CSV seed data: courts, persons and existing reservations.

use std::path::Path;

use chrono::FixedOffset;

use csv::{Reader, ReaderBuilder, StringRecord};
use tracing::{info, warn};

use crate::error::SeedError;
use crate::schedule::slot_utils::parse_iso_datetime;
use crate::schedule::types::{
    Court, CourtId, Person, PersonId, PersonProfile, Reservation, ReservationId, ReservationKind,
};
use crate::store::InMemoryStore;

pub const COURTS_FILE: &str = "courts.csv";
pub const PERSONS_FILE: &str = "persons.csv";
pub const RESERVATIONS_FILE: &str = "reservations.csv";

/// Longest duration a stored reservation may have.
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedData {
    pub courts: Vec<Court>,
    pub persons: Vec<Person>,
    pub reservations: Vec<Reservation>,
}

impl SeedData {
    pub fn into_store(self) -> InMemoryStore {
        let store = InMemoryStore::new();
        for court in self.courts {
            store.add_court(court);
        }
        for person in self.persons {
            store.add_person(person);
        }
        for reservation in self.reservations {
            store.import_reservation(reservation);
        }
        store
    }
}

/// Column lookup by header name, falling back to a fixed position.
struct Columns<'h> {
    headers: &'h StringRecord,
}

impl Columns<'_> {
    fn find(&self, name: &str, fallback: usize) -> usize {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .unwrap_or(fallback)
    }
}

fn field<'r>(record: &'r StringRecord, col: usize) -> &'r str {
    record.get(col).unwrap_or("").trim()
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn parse_field<T: std::str::FromStr>(
    file: &'static str,
    record: &StringRecord,
    col: usize,
    what: &str,
) -> Result<T, SeedError> {
    let raw = field(record, col);
    raw.parse().map_err(|_| SeedError::Record {
        file,
        line: line_of(record),
        message: format!("invalid {} {:?}", what, raw),
    })
}

fn open(path: &Path) -> Result<Reader<std::fs::File>, SeedError> {
    ReaderBuilder::new().flexible(true).from_path(path).map_err(|source| SeedError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_err(path: &Path) -> impl Fn(csv::Error) -> SeedError + '_ {
    move |source| SeedError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Loads courts from a CSV with `id,name` columns.
pub fn load_courts<P: AsRef<Path>>(csv_path: P) -> Result<Vec<Court>, SeedError> {
    let path = csv_path.as_ref();
    let mut reader = open(path)?;
    let headers = reader.headers().map_err(csv_err(path))?.clone();
    let cols = Columns { headers: &headers };
    let id_col = cols.find("id", 0);
    let name_col = cols.find("name", 1);

    let mut courts = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err(path))?;
        if field(&record, name_col).is_empty() {
            continue;
        }
        courts.push(Court {
            id: CourtId(parse_field(COURTS_FILE, &record, id_col, "court id")?),
            name: field(&record, name_col).to_string(),
        });
    }
    Ok(courts)
}

/// Loads persons from a CSV with `id,name,email,phone,profile` columns.
pub fn load_persons<P: AsRef<Path>>(csv_path: P) -> Result<Vec<Person>, SeedError> {
    let path = csv_path.as_ref();
    let mut reader = open(path)?;
    let headers = reader.headers().map_err(csv_err(path))?.clone();
    let cols = Columns { headers: &headers };
    let id_col = cols.find("id", 0);
    let name_col = cols.find("name", 1);
    let email_col = cols.find("email", 2);
    let phone_col = cols.find("phone", 3);
    let profile_col = cols.find("profile", 4);

    let mut persons = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err(path))?;
        let name = field(&record, name_col);
        if name.is_empty() {
            continue;
        }
        let profile: PersonProfile = parse_field(PERSONS_FILE, &record, profile_col, "profile")?;
        persons.push(Person {
            id: PersonId(parse_field(PERSONS_FILE, &record, id_col, "person id")?),
            name: name.to_string(),
            email: field(&record, email_col).to_string(),
            phone: field(&record, phone_col).to_string(),
            profile,
        });
    }
    Ok(persons)
}

/// Parses a `;`-separated list of person ids.
fn parse_person_ids(record: &StringRecord, col: usize) -> Result<Vec<PersonId>, SeedError> {
    field(record, col)
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse().map(PersonId).map_err(|_| SeedError::Record {
                file: RESERVATIONS_FILE,
                line: line_of(record),
                message: format!("invalid player id {:?}", s),
            })
        })
        .collect()
}

/// Loads reservations from a CSV with
/// `id,court_id,start,duration_minutes,kind,description,players,coach,contact_phone`
/// columns. `start` is ISO-8601 (converted to `venue` when it has an offset),
/// `players` is `;`-separated.
pub fn load_reservations<P: AsRef<Path>>(csv_path: P, venue: &FixedOffset) -> Result<Vec<Reservation>, SeedError> {
    let path = csv_path.as_ref();
    let mut reader = open(path)?;
    let headers = reader.headers().map_err(csv_err(path))?.clone();
    let cols = Columns { headers: &headers };
    let id_col = cols.find("id", 0);
    let court_col = cols.find("court_id", 1);
    let start_col = cols.find("start", 2);
    let duration_col = cols.find("duration_minutes", 3);
    let kind_col = cols.find("kind", 4);
    let description_col = cols.find("description", 5);
    let players_col = cols.find("players", 6);
    let coach_col = cols.find("coach", 7);
    let phone_col = cols.find("contact_phone", 8);

    let mut reservations = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err(path))?;
        if field(&record, start_col).is_empty() {
            warn!(line = line_of(&record), "reservation row without start, skipped");
            continue;
        }

        let start = parse_iso_datetime(field(&record, start_col), venue).map_err(|e| SeedError::Record {
            file: RESERVATIONS_FILE,
            line: line_of(&record),
            message: e.to_string(),
        })?;
        let duration_minutes: u32 = parse_field(RESERVATIONS_FILE, &record, duration_col, "duration")?;
        if duration_minutes == 0 || duration_minutes > MAX_DURATION_MINUTES {
            return Err(SeedError::Record {
                file: RESERVATIONS_FILE,
                line: line_of(&record),
                message: format!("duration {} is outside 1..={} minutes", duration_minutes, MAX_DURATION_MINUTES),
            });
        }
        let kind = match field(&record, kind_col) {
            "" => ReservationKind::Match,
            _ => parse_field(RESERVATIONS_FILE, &record, kind_col, "kind")?,
        };
        let coach = match field(&record, coach_col) {
            "" => None,
            _ => Some(PersonId(parse_field(RESERVATIONS_FILE, &record, coach_col, "coach id")?)),
        };
        let contact_phone = Some(field(&record, phone_col))
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        reservations.push(Reservation {
            id: ReservationId(parse_field(RESERVATIONS_FILE, &record, id_col, "reservation id")?),
            court_id: CourtId(parse_field(RESERVATIONS_FILE, &record, court_col, "court id")?),
            start,
            duration_minutes,
            kind,
            description: field(&record, description_col).to_string(),
            players: parse_person_ids(&record, players_col)?,
            coach,
            contact_phone,
        });
    }
    Ok(reservations)
}

/// Loads whichever seed files exist in `dir`. Missing files yield empty lists.
pub fn load_seed_data<P: AsRef<Path>>(dir: P, venue: &FixedOffset) -> Result<SeedData, SeedError> {
    let dir = dir.as_ref();
    let courts_path = dir.join(COURTS_FILE);
    let persons_path = dir.join(PERSONS_FILE);
    let reservations_path = dir.join(RESERVATIONS_FILE);

    let seed = SeedData {
        courts: if courts_path.exists() { load_courts(&courts_path)? } else { Vec::new() },
        persons: if persons_path.exists() { load_persons(&persons_path)? } else { Vec::new() },
        reservations: if reservations_path.exists() {
            load_reservations(&reservations_path, venue)?
        } else {
            Vec::new()
        },
    };

    info!(
        dir = %dir.display(),
        courts = seed.courts.len(),
        persons = seed.persons.len(),
        reservations = seed.reservations.len(),
        "seed data loaded"
    );
    Ok(seed)
}
