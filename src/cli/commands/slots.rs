//! `ecopark slots` command - free time slots for an activity on a date

use chrono::NaiveDate;
use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::helpers::{parse_date, print_structured};
use crate::cli::session::Session;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::GlobalOpts;
use crate::core::availability::{is_elapsed, AvailabilityResolver};
use crate::core::form::BookingForm;
use crate::entities::slot::SlotTime;

#[derive(clap::Args, Debug)]
pub struct SlotsArgs {
    /// Activity name (case-insensitive)
    #[arg(long, short = 'a')]
    pub activity: String,

    /// Date to look at (YYYY-MM-DD, default: today)
    #[arg(long, short = 'd', value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Include full and past slots
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
struct SlotRow {
    time: SlotTime,
    remaining: u32,
    capacity: u32,
    status: &'static str,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("time", "TIME", 5),
    ColumnDef::new("places", "PLACES", 7),
    ColumnDef::new("status", "STATUS", 6),
];

pub fn run(args: SlotsArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let catalog = session.service.activities()?;
    let activity = catalog.find(&args.activity).ok_or_else(|| {
        miette::miette!(
            help = format!("choose one of: {}", catalog.names().join(", ")),
            "Unknown activity '{}'",
            args.activity
        )
    })?;

    let date = args.date.unwrap_or_else(|| session.now.date());
    let calendar = BookingForm::calendar(session.now);
    calendar.check(date).map_err(|reason| {
        miette::miette!(
            help = "run `ecopark check-date` to list the bookable dates",
            "{} cannot be booked: {}",
            date,
            reason
        )
    })?;

    let source = session.service.availability(date)?;
    let resolver = AvailabilityResolver::new(&source, &calendar);
    let slots: Vec<SlotRow> = resolver
        .day(activity, date)
        .into_iter()
        .map(|slot| SlotRow {
            time: slot.time,
            remaining: slot.remaining,
            capacity: slot.capacity,
            status: if is_elapsed(date, slot.time, session.now) {
                "past"
            } else if slot.is_open() {
                "open"
            } else {
                "full"
            },
        })
        .filter(|row| args.all || row.status == "open")
        .collect();

    if print_structured(&slots, session.format)? {
        return Ok(());
    }

    if slots.is_empty() {
        if !session.quiet {
            println!(
                "{} No open slots for {} on {}",
                style("!").yellow(),
                style(&activity.name).cyan(),
                date
            );
        }
        return Ok(());
    }

    let rows: Vec<TableRow> = slots
        .iter()
        .map(|s| {
            TableRow::new()
                .cell("time", CellValue::Key(s.time.to_string()))
                .cell(
                    "places",
                    CellValue::Places {
                        remaining: s.remaining,
                        capacity: s.capacity,
                    },
                )
                .cell("status", CellValue::Status(s.status.to_string()))
        })
        .collect();
    TableFormatter::new(COLUMNS, "slot")
        .quiet(session.quiet)
        .output(&rows, session.format);
    Ok(())
}
