use std::fs::File;
use std::io::{self, Write};

use crate::schedule::types::{Reservation, ReservationKind, RunStatus, RunView};
use crate::service::DaySheet;

/// Formats a reservation with its kind tag
pub fn format_reservation_label(reservation: &Reservation) -> String {
    let tag = match reservation.kind {
        ReservationKind::Match => "MATCH",
        ReservationKind::Lesson => "LESSON",
    };
    if reservation.description.is_empty() {
        format!("[{}] {}", tag, reservation.id)
    } else {
        format!("[{}] {}", tag, reservation.description)
    }
}

/// One line per run: `HH:MM-HH:MM label (N min)`
pub fn format_run_line(run: &RunView) -> String {
    let label = match (&run.status, &run.reservation) {
        (RunStatus::Reserved, Some(r)) => format_reservation_label(r),
        _ => "[FREE]".to_string(),
    };
    format!("{}-{} {} ({} min)", run.start, run.end, label, run.minutes)
}

/// Writes a day sheet to any writer, header first.
pub fn write_day_sheet<W: Write>(sheet: &DaySheet, out: &mut W) -> io::Result<()> {
    writeln!(out, "** {} {} **", sheet.court.name, sheet.date.format("%Y-%m-%d"))?;
    for run in &sheet.runs {
        writeln!(out, "{}", format_run_line(run))?;
    }
    Ok(())
}

/// Writes a day sheet to a file
pub fn write_day_sheet_to_file(sheet: &DaySheet, filename: &str) -> io::Result<()> {
    let mut file = File::create(filename)?;
    write_day_sheet(sheet, &mut file)
}

/// Prints a day sheet in a readable format
pub fn print_day_sheet(sheet: &DaySheet) {
    let reserved = sheet.runs.iter().filter(|r| r.status == RunStatus::Reserved).count();
    let free_minutes: u32 = sheet
        .runs
        .iter()
        .filter(|r| r.status == RunStatus::Free)
        .map(|r| r.minutes)
        .sum();

    println!("\n=== {} ({}) ===", sheet.court.name, sheet.date.format("%A %Y-%m-%d"));
    println!("Reservations: {}, free: {} min", reserved, free_minutes);
    for run in &sheet.runs {
        println!("  {}", format_run_line(run));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::slot_utils::generate;
    use crate::schedule::types::{Court, CourtId, ReservationId};
    use chrono::NaiveDate;

    #[test]
    fn renders_runs_in_order() {
        let grid = generate(9, 12, 30).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let reservations = vec![Reservation {
            id: ReservationId(8),
            court_id: CourtId(1),
            start: date.and_hms_opt(10, 0, 0).unwrap(),
            duration_minutes: 60,
            kind: ReservationKind::Match,
            description: String::new(),
            players: vec![],
            coach: None,
            contact_phone: None,
        }];
        let sheet = DaySheet::build(&grid, Court { id: CourtId(1), name: "Central".to_string() }, date, 1, &reservations);

        let mut out = Vec::new();
        write_day_sheet(&sheet, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "** Central 2025-03-01 **\n\
             09:00-10:00 [FREE] (60 min)\n\
             10:00-11:00 [MATCH] #8 (60 min)\n\
             11:00-12:00 [FREE] (60 min)\n"
        );
    }
}
