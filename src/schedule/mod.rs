pub mod types;
pub mod slot_utils;
pub mod availability;
pub mod overlap;

pub use types::{
    Court, CourtId, Occupancy, Person, PersonId, PersonProfile, Reservation, ReservationId,
    ReservationKind, Run, RunStatus, RunView, SlotGrid, TimeSlot,
};
pub use slot_utils::generate;
pub use availability::partition;
pub use overlap::{can_place, check_placement, Candidate};
