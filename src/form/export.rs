use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;

use crate::schedule::types::RunStatus;
use crate::service::DaySheet;

const HEADER: [&str; 10] = [
    "date",
    "court",
    "start",
    "end",
    "slots",
    "minutes",
    "status",
    "reservation_id",
    "kind",
    "description",
];

/// Writes the runs of several day sheets as CSV rows, one row per run.
pub fn write_day_sheets_csv<W: Write>(sheets: &[&DaySheet], writer: W) -> Result<(), csv::Error> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(HEADER)?;

    for sheet in sheets {
        let date = sheet.date.format("%Y-%m-%d").to_string();
        for run in &sheet.runs {
            let status = match run.status {
                RunStatus::Free => "free",
                RunStatus::Reserved => "reserved",
            };
            let (id, kind, description) = match &run.reservation {
                Some(r) => (
                    r.id.0.to_string(),
                    format!("{:?}", r.kind).to_uppercase(),
                    r.description.clone(),
                ),
                None => (String::new(), String::new(), String::new()),
            };
            let start = run.start.to_string();
            let end = run.end.to_string();
            let slots = run.slots.to_string();
            let minutes = run.minutes.to_string();
            wtr.write_record([
                date.as_str(),
                sheet.court.name.as_str(),
                start.as_str(),
                end.as_str(),
                slots.as_str(),
                minutes.as_str(),
                status,
                id.as_str(),
                kind.as_str(),
                description.as_str(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Exports day sheets to a CSV file, replacing it if present.
pub fn export_day_sheets_to_csv(sheets: &[&DaySheet], csv_path: &Path) -> Result<(), csv::Error> {
    let file = std::fs::File::create(csv_path)?;
    write_day_sheets_csv(sheets, file)
}
