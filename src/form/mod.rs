pub mod submission;
pub mod export;

pub use submission::{validate_quick_match, validate_request, QuickMatchRequest, ReservationRequest};
pub use export::{export_day_sheets_to_csv, write_day_sheets_csv};
