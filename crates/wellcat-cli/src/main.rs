mod commands;
mod logging;
mod output;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "wellcat",
    version,
    about = "Categorize PCR well outcomes against a per-database category table"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Which database configuration to use.
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Builtin database preset: qst, notts, vira
    #[arg(long = "db", value_name = "NAME", conflicts_with = "config")]
    pub db: Option<String>,

    /// Custom database config JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a JSON array of wells and assign report buckets
    Classify {
        /// Path to wells JSON
        input_file: PathBuf,

        #[command(flatten)]
        database: DatabaseArgs,

        /// Category table (defaults to the config's category_table)
        #[arg(short, long, value_name = "CSV")]
        table: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// List every well, not just discrepancies and unresolved wells
        #[arg(long)]
        show_all: bool,

        /// Include per-well decision steps
        #[arg(long)]
        trace: bool,
    },
    /// Report well patterns missing from the category table
    Coverage {
        /// Path to wells JSON
        input_file: PathBuf,

        #[command(flatten)]
        database: DatabaseArgs,

        /// Category table (defaults to the config's category_table)
        #[arg(short, long, value_name = "CSV")]
        table: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Inspect category tables
    Table {
        #[command(subcommand)]
        action: TableAction,
    },
    /// Inspect database configurations
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum TableAction {
    /// Parse a category table and check it for conflicting keys
    Validate {
        /// Path to the category table
        file: PathBuf,

        #[command(flatten)]
        database: DatabaseArgs,
    },
    /// Summarize a category table by category
    Explain {
        /// Path to the category table
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// List builtin database presets
    List,
    /// Print a builtin preset as JSON
    Show {
        /// Preset name (e.g., "qst")
        preset: String,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(&logging::LogConfig::from_verbosity(cli.verbose));

    let mut exit_code = 0;
    let result = match cli.command {
        Commands::Classify {
            input_file,
            database,
            table,
            output,
            show_all,
            trace,
        } => commands::classify::run(input_file, &database, table, &output, show_all, trace),
        Commands::Coverage {
            input_file,
            database,
            table,
            output,
        } => commands::coverage::run(input_file, &database, table, &output).map(|complete| {
            if !complete {
                exit_code = 2;
            }
        }),
        Commands::Table { action } => match action {
            TableAction::Validate { file, database } => commands::table::validate(&file, &database),
            TableAction::Explain { file } => commands::table::explain(&file),
        },
        Commands::Config { action } => match action {
            ConfigAction::List => commands::config::list(),
            ConfigAction::Show { preset } => commands::config::show(&preset),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}
