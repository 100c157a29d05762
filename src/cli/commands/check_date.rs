//! `ecopark check-date` command - date acceptance

use chrono::NaiveDate;
use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::helpers::{current_time, parse_date, print_structured, resolve_format};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::form::BookingForm;
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct CheckDateArgs {
    /// Date to check (YYYY-MM-DD); without it, list the bookable dates
    #[arg(value_parser = parse_date)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct DateCheck {
    date: NaiveDate,
    bookable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

pub fn run(args: CheckDateArgs, global: &GlobalOpts) -> Result<()> {
    let calendar = BookingForm::calendar(current_time(global)?);
    let format = resolve_format(global, &Config::load());

    let Some(date) = args.date else {
        let dates = calendar.bookable_dates();
        if print_structured(&dates, format)? {
            return Ok(());
        }
        for date in &dates {
            if format == OutputFormat::Id {
                println!("{}", date);
            } else {
                println!("{}  {}", style(date).cyan(), date.format("%A"));
            }
        }
        return Ok(());
    };

    let result = calendar.check(date);
    let check = DateCheck {
        date,
        bookable: result.is_ok(),
        reason: result.as_ref().err().map(ToString::to_string),
    };
    let structured = print_structured(&check, format)?;

    match result {
        Ok(()) => {
            if !structured && !global.quiet {
                println!("{} {} can be booked", style("✓").green(), date);
            }
            Ok(())
        }
        Err(reason) => Err(miette::miette!(
            help = format!(
                "bookable dates run from {} to {}, Mondays and holidays excluded",
                calendar.today(),
                calendar.last_bookable()
            ),
            "{} cannot be booked: {}",
            date,
            reason
        )),
    }
}
