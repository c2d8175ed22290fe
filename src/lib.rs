//! Court booking sheet: a fixed daily slot grid per court, split into free
//! and reserved runs, with collision-checked reservation creation.

pub mod config;
pub mod display;
pub mod error;
pub mod form;
pub mod parser;
pub mod schedule;
pub mod service;
pub mod store;
pub mod web;

pub use config::{AppConfig, GridConfig, VenueConfig};
pub use error::{BookingError, ConfigError, PlacementError, SeedError, ValidationError};
pub use schedule::{can_place, check_placement, generate, partition, Candidate, SlotGrid};
pub use service::{BookingService, DaySheet};
pub use store::{InMemoryStore, NewReservation, ReservationStore};
