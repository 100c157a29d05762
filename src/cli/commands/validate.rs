//! `ecopark validate` command - check a booking draft without submitting it

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::commands::register::load_draft;
use crate::cli::session::Session;
use crate::cli::GlobalOpts;
use crate::core::form::BookingForm;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Booking draft (YAML)
    pub file: PathBuf,

    /// Only check the document structure, not the booking rules
    #[arg(long)]
    pub schema_only: bool,
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let draft = load_draft(&args.file)?;

    if !args.schema_only {
        let mut session = Session::open(global)?;
        let mut form = BookingForm::new(session.service.activities()?);
        form.apply_draft(&draft);
        form.drive(session.service.as_mut(), session.now, true)?;
    }

    if !global.quiet {
        println!(
            "{} {} is valid{}",
            style("✓").green(),
            args.file.display(),
            if args.schema_only { " (structure only)" } else { "" }
        );
    }
    Ok(())
}
