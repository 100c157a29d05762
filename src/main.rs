use clap::Parser;
use ecopark::cli::commands;
use ecopark::cli::{Cli, Commands, GlobalOpts};
use miette::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_logging(&global);

    match cli.command {
        Commands::Activities(args) => commands::activities::run(args, &global),
        Commands::Slots(args) => commands::slots::run(args, &global),
        Commands::CheckDate(args) => commands::check_date::run(args, &global),
        Commands::Register(args) => commands::register::run(args, &global),
        Commands::Validate(args) => commands::validate::run(args, &global),
        Commands::Config(cmd) => commands::config::run(cmd, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose` and `--quiet`
fn init_logging(global: &GlobalOpts) {
    let default = if global.verbose {
        "ecopark=debug"
    } else if global.quiet {
        "error"
    } else {
        "ecopark=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
