//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    activities::ActivitiesArgs, check_date::CheckDateArgs, completions::CompletionsArgs,
    config::ConfigCommands, register::RegisterArgs, slots::SlotsArgs, validate::ValidateArgs,
};

#[derive(Parser)]
#[command(name = "ecopark")]
#[command(author, version, about = "Book activities at EcoHarmony Park")]
#[command(long_about = "Browse the park's activities and free slots, and register a group for a visit. \
Talks to the park API, or to an in-memory park with --offline.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Park API base URL (overrides config)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Use the in-memory park instead of the API
    #[arg(long, global = true)]
    pub offline: bool,

    /// Bookings preloaded into the in-memory park (implies --offline)
    #[arg(long, global = true, value_name = "FILE")]
    pub seed: Option<PathBuf>,

    /// Pretend the current time is this (YYYY-MM-DDTHH:MM)
    #[arg(long, global = true, hide = true, env = "ECOPARK_NOW")]
    pub now: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the activities on offer
    Activities(ActivitiesArgs),

    /// Show free slots for an activity on a date
    Slots(SlotsArgs),

    /// Check whether a date can be booked
    CheckDate(CheckDateArgs),

    /// Register a group for an activity
    Register(RegisterArgs),

    /// Validate a booking draft without submitting it
    Validate(ValidateArgs),

    /// View and change configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Use the configured default, else a table
    #[default]
    Auto,
    /// YAML format
    Yaml,
    /// Aligned table (tab-separated when piped)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just names or times, one per line
    Id,
}
