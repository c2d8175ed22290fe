use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use tracing::info;
use tracing_subscriber::EnvFilter;

use court_booking::config::AppConfig;
use court_booking::display::{print_day_sheet, write_day_sheet_to_file};
use court_booking::form::export_day_sheets_to_csv;
use court_booking::parser::load_seed_data;
use court_booking::schedule::slot_utils::parse_date;
use court_booking::service::{BookingService, DaySheet};
use court_booking::web;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let mut config = AppConfig::load().context("invalid configuration")?;
    let venue = config.venue.offset()?;
    let seed = load_seed_data(&config.seed.dir, &venue).context("failed to load seed data")?;
    let store = Arc::new(seed.into_store());
    let service = BookingService::from_config(&config.grid, store)?.with_venue_offset(venue);

    // Check if we should run in web mode
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "web" {
        if let Some(port) = args.get(2) {
            config.server.port = port.parse().with_context(|| format!("invalid port {:?}", port))?;
        }
        info!(grid = ?config.grid, "court booking sheet");
        web::start_server(&config.server.host, config.server.port, service).await?;
        return Ok(());
    }

    // CLI mode: print and write every court's sheet for one day
    let date = match args.get(1) {
        Some(raw) => parse_date(raw).with_context(|| format!("invalid date {:?}, expected YYYY-MM-DD", raw))?,
        None => Local::now().date_naive(),
    };

    let mut sheets = Vec::new();
    for court in service.courts() {
        let sheet = service.day_sheet(court.id, date)?;
        print_day_sheet(&sheet);
        let filename = format!("sheet_{}.txt", court.id);
        write_day_sheet_to_file(&sheet, &filename)?;
        println!("Sheet saved to {}", filename);
        sheets.push(sheet);
    }

    let csv_name = format!("sheet_{}.csv", date.format("%Y-%m-%d"));
    let refs: Vec<&DaySheet> = sheets.iter().map(|s| &**s).collect();
    export_day_sheets_to_csv(&refs, std::path::Path::new(&csv_name))?;
    println!("Sheets exported to {}", csv_name);

    Ok(())
}
