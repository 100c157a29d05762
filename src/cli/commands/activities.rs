//! `ecopark activities` command - list the activities on offer

use miette::Result;

use crate::cli::helpers::print_structured;
use crate::cli::session::Session;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::GlobalOpts;
use crate::entities::activity::Activity;

#[derive(clap::Args, Debug)]
pub struct ActivitiesArgs {
    /// Only activities open to this age
    #[arg(long)]
    pub age: Option<u32>,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 20),
    ColumnDef::new("id", "ID", 4),
    ColumnDef::new("capacity", "CAPACITY", 8),
    ColumnDef::new("min_age", "MIN AGE", 7),
    ColumnDef::new("size", "SIZE", 4),
];

pub fn run(args: ActivitiesArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let catalog = session.service.activities()?;

    let activities: Vec<&Activity> = catalog
        .iter()
        .filter(|a| args.age.is_none_or(|age| age >= a.min_age))
        .collect();

    if print_structured(&activities, session.format)? {
        return Ok(());
    }

    let rows: Vec<TableRow> = activities.iter().map(|a| row(a)).collect();
    TableFormatter::new(COLUMNS, "activity")
        .quiet(session.quiet)
        .output(&rows, session.format);
    Ok(())
}

fn row(activity: &Activity) -> TableRow {
    TableRow::new()
        .cell("name", CellValue::Key(activity.name.clone()))
        .cell("id", CellValue::Number(i64::from(activity.id)))
        .cell("capacity", CellValue::Number(i64::from(activity.capacity)))
        .cell(
            "min_age",
            if activity.min_age > 0 {
                CellValue::Number(i64::from(activity.min_age))
            } else {
                CellValue::Empty
            },
        )
        .cell("size", CellValue::Flag(activity.requires_size))
}
