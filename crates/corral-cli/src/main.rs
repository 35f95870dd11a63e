#![forbid(unsafe_code)]

mod feed;
mod output;

use std::env;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use corral_core::config::CorralConfig;
use corral_core::session::SessionStore;
use corral_core::view::{StatusFilter, filter_leads};
use corral_core::{Dispatcher, Lead, Status};
use corral_sim::{CampaignConfig, run_campaign};
use output::OutputMode;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "corral: merged lead board for the CRM",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputMode::Pretty)]
    format: OutputMode,

    /// Config file (defaults to ./corral.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Replay a recorded snapshot feed and render the board",
        after_help = "EXAMPLES:\n    # Replay a feed and show the merged board\n    crl replay feed.jsonl\n\n    # Only closed leads, machine-readable\n    crl replay feed.jsonl --status Fechado --format json"
    )]
    Replay {
        /// JSON-lines feed file.
        feed: PathBuf,

        /// Status filter label (e.g. "Fechado"); defaults to the config's
        /// view filter.
        #[arg(long)]
        status: Option<String>,

        /// Search term matched against email or phone.
        #[arg(long, default_value = "")]
        search: String,
    },

    #[command(
        about = "Run the convergence oracle over seeded worlds",
        after_help = "EXAMPLES:\n    # 64 seeded worlds, 8 delivery orders each\n    crl sim\n\n    # A longer campaign from a fixed base seed\n    crl sim --seeds 512 --base-seed 1000"
    )]
    Sim {
        /// How many seeded worlds to run.
        #[arg(long, default_value_t = 64)]
        seeds: u64,

        /// Randomized delivery orders compared per world.
        #[arg(long, default_value_t = 8)]
        orders: usize,

        /// First seed.
        #[arg(long, default_value_t = 0)]
        base_seed: u64,
    },

    #[command(about = "Inspect or clear the stored login flag")]
    Session {
        #[command(subcommand)]
        command: SessionCommand,

        /// Override the session file location.
        #[arg(long)]
        session_file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Print the stored session.
    Show,
    /// Remove the login marker and operator record together.
    Clear,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CORRAL_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "corral=debug,info"
        } else {
            "corral=info,warn"
        })
    });

    let format = env::var("CORRAL_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn load_config(flag: Option<&PathBuf>) -> anyhow::Result<CorralConfig> {
    flag.map_or_else(
        || CorralConfig::load_or_default(std::path::Path::new("corral.toml")),
        |path| CorralConfig::load(path),
    )
}

/// Resolve the filter: explicit flag beats config; "Todos" means all.
fn resolve_filter(flag: Option<&str>, config: &CorralConfig) -> StatusFilter {
    flag.map_or_else(
        || config.view.filter(),
        |label| {
            label
                .parse::<Status>()
                .map_or(StatusFilter::All, StatusFilter::Only)
        },
    )
}

fn run_replay(
    feed_path: &PathBuf,
    status: Option<&str>,
    search: &str,
    format: OutputMode,
    config: &CorralConfig,
) -> anyhow::Result<()> {
    let intakes = feed::read_feed(feed_path)?;
    let mut dispatcher = Dispatcher::new();
    for intake in intakes {
        dispatcher.push(intake);
    }
    let processed = dispatcher.run_until_idle();
    info!(processed, "feed drained");

    let filter = resolve_filter(status, config);
    let leads: Vec<&Lead> = filter_leads(dispatcher.board().leads(), filter, search);
    output::render_board_stdout(&dispatcher, &leads, format)
}

fn run_sim(seeds: u64, orders: usize, base_seed: u64) -> anyhow::Result<()> {
    let report = run_campaign(&CampaignConfig {
        base_seed,
        seeds,
        orders_per_world: orders,
        ..CampaignConfig::default()
    });

    if report.passed() {
        println!("{} scenarios, all invariants held", report.scenarios);
        Ok(())
    } else {
        for (seed, result) in &report.failures {
            eprintln!("seed {seed}:");
            for violation in &result.violations {
                eprintln!("  {violation:?}");
            }
        }
        anyhow::bail!("{} of {} scenarios failed", report.failures.len(), report.scenarios)
    }
}

fn run_session(command: &SessionCommand, session_file: Option<PathBuf>) -> anyhow::Result<()> {
    let store = match session_file {
        Some(path) => SessionStore::at(path),
        None => SessionStore::default_location()?,
    };
    match command {
        SessionCommand::Show => {
            let session = store.load();
            match session.display_email() {
                Some(email) => println!("logged in as {email}"),
                None => println!("not logged in"),
            }
            Ok(())
        }
        SessionCommand::Clear => {
            store.clear()?;
            println!("session cleared");
            Ok(())
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Replay {
            ref feed,
            ref status,
            ref search,
        } => {
            let config = load_config(cli.config.as_ref())?;
            run_replay(feed, status.as_deref(), search, cli.format, &config)
        }
        Commands::Sim {
            seeds,
            orders,
            base_seed,
        } => run_sim(seeds, orders, base_seed),
        Commands::Session {
            ref command,
            ref session_file,
        } => run_session(command, session_file.clone()),
    }
}
