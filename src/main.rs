use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use aihub::cli::{self, AnalyzeOptions, OutputFormat};

#[derive(Debug, Parser)]
#[command(name = "aihub")]
#[command(about = "Classify customer complaint spreadsheets with the complaint classifier service")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse a spreadsheet locally and show its headers and first rows
    Preview {
        /// .xlsx, .xls or .csv file
        file: PathBuf,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show per-column statistics for a spreadsheet
    Columns {
        /// .xlsx, .xls or .csv file
        file: PathBuf,
        /// Compute statistics over the preview rows only
        #[arg(long)]
        preview_only: bool,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Upload a spreadsheet and classify one text column
    Analyze {
        /// .xlsx, .xls or .csv file
        file: PathBuf,
        /// Column containing the complaint text
        #[arg(long, short)]
        column: String,
        /// Download the result spreadsheet when the analysis finishes
        #[arg(long)]
        download: bool,
        /// Where to save the download (file or directory)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Download the result spreadsheet of a previous analysis
    Download {
        /// Result id printed by `aihub analyze`
        result_id: String,
        /// Where to save the download (file or directory)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// File name to use instead of complaint_analysis_<result_id>.xlsx
        #[arg(long)]
        name: Option<String>,
    },
    /// Ask the classifier service to load its model
    Init,
    /// Show the classifier model status
    Status {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Poll the model status on the configured interval
    Watch {
        /// Stop after N polls
        #[arg(long)]
        count: Option<u32>,
    },
    /// Show classifier service metadata
    Info,
    /// Check configuration and classifier service reachability
    Health,
    /// Summarize past analysis runs
    History {
        /// Only include the last N days
        #[arg(long)]
        days: Option<u32>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Start the local web dashboard
    Web {
        /// Address to bind (default from config: 127.0.0.1:9747)
        #[arg(long)]
        addr: Option<String>,
        /// Do not open a browser window
        #[arg(long)]
        no_browser: bool,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default ~/.aihub/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a value, e.g. `aihub config set classifier.base_url http://host:8001`
    Set { key: String, value: String },
    /// Reset ~/.aihub/config.toml to defaults
    Reset,
}

fn main() {
    let app = App::parse();

    if let Err(e) = run(app.command) {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Preview { file, format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_preview(&file, fmt)
        }
        Commands::Columns {
            file,
            preview_only,
            format,
        } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_columns(&file, preview_only, fmt)
        }
        Commands::Analyze {
            file,
            column,
            download,
            output,
            format,
        } => {
            let opts = AnalyzeOptions {
                column,
                download,
                output,
                format: OutputFormat::from_str_opt(Some(&format)),
            };
            cli::run_analyze(&file, &opts)
        }
        Commands::Download {
            result_id,
            output,
            name,
        } => cli::run_download(&result_id, output.as_deref(), name.as_deref()),
        Commands::Init => cli::run_init_model(),
        Commands::Status { format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_status(fmt)
        }
        Commands::Watch { count } => cli::run_watch(count),
        Commands::Info => cli::run_info(),
        Commands::Health => cli::run_health(),
        Commands::History { days, format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_history(fmt, days)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
        Commands::Web { addr, no_browser } => {
            let mut cfg = aihub::config::load();
            if let Some(addr) = addr {
                cfg.web.addr = addr;
            }
            if no_browser {
                cfg.web.open_browser = false;
            }
            aihub::web::serve(&cfg)
        }
    }
}
