//! `ecopark register` command - book a group for an activity
//!
//! Three ways in, one form controller underneath:
//! - `-i` runs the interactive wizard
//! - flags (`--activity`, `--date`, `--participant`, ...) fill the form directly
//! - `--from` loads a YAML booking draft, which flags then override

use chrono::NaiveDate;
use console::style;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::cli::helpers::{parse_date, print_structured};
use crate::cli::session::Session;
use crate::cli::GlobalOpts;
use crate::core::form::{BookingForm, Step};
use crate::core::roster::read_roster;
use crate::entities::registration::{BookingDraft, Confirmation, ParticipantDraft};
use crate::entities::slot::SlotTime;
use crate::schema::{BookingWizard, ReceiptGenerator, SchemaKind, Validator};
use crate::yaml::parse_yaml_str;

#[derive(clap::Args, Debug)]
pub struct RegisterArgs {
    /// Walk through the booking interactively
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Booking draft to start from (YAML)
    #[arg(long, value_name = "FILE")]
    pub from: Option<PathBuf>,

    /// Activity name (case-insensitive)
    #[arg(long, short = 'a')]
    pub activity: Option<String>,

    /// Visit date (YYYY-MM-DD)
    #[arg(long, short = 'd', value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Slot start time (HH:MM)
    #[arg(long, short = 't')]
    pub time: Option<SlotTime>,

    /// Number of people (defaults to the number of participants given)
    #[arg(long, short = 'n')]
    pub people: Option<u32>,

    /// Participant as "name,dni,age[,size]" (repeatable)
    #[arg(
        long = "participant",
        short = 'p',
        value_name = "NAME,DNI,AGE[,SIZE]",
        value_parser = parse_participant
    )]
    pub participants: Vec<ParticipantDraft>,

    /// CSV file with a name,dni,age[,size] header
    #[arg(long, value_name = "FILE", conflicts_with = "participants")]
    pub participants_csv: Option<PathBuf>,

    /// Contact email for the confirmation (defaults to the configured email)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Accept the park's terms and conditions
    #[arg(long)]
    pub accept_terms: bool,

    /// Validate everything but do not submit
    #[arg(long, conflicts_with = "interactive")]
    pub dry_run: bool,

    /// Write a plain-text receipt to this file
    #[arg(long, value_name = "FILE")]
    pub receipt: Option<PathBuf>,
}

fn parse_participant(s: &str) -> std::result::Result<ParticipantDraft, String> {
    ParticipantDraft::parse_compact(s)
        .ok_or_else(|| format!("expected \"name,dni,age[,size]\", got '{s}'"))
}

pub fn run(args: RegisterArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let catalog = session.service.activities()?;
    let mut form = BookingForm::new(catalog);

    let draft = build_draft(&args, session.config.email.as_deref())?;
    form.apply_draft(&draft);
    if let Some(people) = args.people {
        form.set_party_size(people);
    }

    if args.interactive {
        let wizard = BookingWizard::new(session.config.email.clone());
        return match wizard.run(&mut form, session.service.as_mut(), session.now)? {
            Some(confirmation) => finish(&confirmation, &args, &session),
            None => {
                println!("{} Booking cancelled, nothing was registered", style("!").yellow());
                Ok(())
            }
        };
    }

    let step = form.drive(session.service.as_mut(), session.now, args.dry_run)?;
    if step != Step::Completed {
        // Only reachable on a dry run
        if !session.quiet {
            print_summary(&form);
            println!(
                "{} Booking is valid (dry run, nothing submitted)",
                style("✓").green()
            );
        }
        return Ok(());
    }

    let confirmation = form
        .confirmation()
        .cloned()
        .ok_or_else(|| miette::miette!("booking completed without a confirmation"))?;
    finish(&confirmation, &args, &session)
}

/// Load the draft file if any and apply command-line values over it
fn build_draft(args: &RegisterArgs, default_email: Option<&str>) -> Result<BookingDraft> {
    let mut draft = match &args.from {
        Some(path) => load_draft(path)?,
        None => BookingDraft::default(),
    };

    if let Some(activity) = &args.activity {
        draft.activity = Some(activity.clone());
    }
    if args.date.is_some() {
        draft.date = args.date;
    }
    if args.time.is_some() {
        draft.time = args.time;
    }
    if !args.participants.is_empty() {
        draft.participants = args.participants.clone();
    }
    if let Some(path) = &args.participants_csv {
        let file = File::open(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("cannot open {}", path.display()))?;
        draft.participants = read_roster(file)
            .into_diagnostic()
            .wrap_err_with(|| format!("in roster {}", path.display()))?;
    }
    if let Some(email) = &args.email {
        draft.email = Some(email.clone());
    }
    if draft.email.is_none() {
        draft.email = default_email.map(str::to_string);
    }
    if args.accept_terms {
        draft.accept_terms = true;
    }

    if let Some(people) = args.people {
        let given = draft.participants.len();
        if !args.interactive && given > 0 && given != people as usize {
            return Err(miette::miette!(
                help = "give one --participant per person, or drop --people",
                "--people is {} but {} participant(s) were given",
                people,
                given
            ));
        }
    }
    Ok(draft)
}

/// Read a booking draft, checking it against the draft schema first
pub fn load_draft(path: &Path) -> Result<BookingDraft> {
    let content = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot read {}", path.display()))?;
    let filename = path.display().to_string();
    Validator::default().validate(&content, &filename, SchemaKind::Booking)?;
    Ok(parse_yaml_str(&content, &filename)?)
}

fn finish(confirmation: &Confirmation, args: &RegisterArgs, session: &Session) -> Result<()> {
    if let Some(path) = &args.receipt {
        let receipt = ReceiptGenerator::new()
            .and_then(|g| g.render(confirmation))
            .map_err(|e| miette::miette!("{}", e))?;
        fs::write(path, receipt)
            .into_diagnostic()
            .wrap_err_with(|| format!("cannot write receipt to {}", path.display()))?;
    }

    if print_structured(confirmation, session.format)? {
        return Ok(());
    }
    if session.quiet {
        println!("{}", confirmation.reference);
        return Ok(());
    }

    println!(
        "{} {}",
        style("✓").green(),
        style(&confirmation.message).bold()
    );
    println!(
        "   {} {}",
        style("Reference:").dim(),
        style(&confirmation.reference).cyan()
    );
    if let Some(path) = &args.receipt {
        println!("   {} {}", style("Receipt:").dim(), path.display());
    }
    Ok(())
}

fn print_summary(form: &BookingForm) {
    let selection = form.selection();
    println!(
        "{} on {} at {}",
        style(selection.activity.as_deref().unwrap_or("-")).cyan(),
        selection.date.map(|d| d.to_string()).unwrap_or_default(),
        selection.time.map(|t| t.to_string()).unwrap_or_default()
    );
    for (i, p) in form.participants().iter().enumerate() {
        println!("  {}. {} (DNI {}, age {})", i + 1, p.name.trim(), p.dni, p.age);
    }
    println!("  {} {}", style("Contact:").dim(), form.email());
}
