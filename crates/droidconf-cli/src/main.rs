//! droidconf CLI tool.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{OutputFormat, ResolveArgs};

#[derive(Parser)]
#[command(name = "droidconf")]
#[command(about = "Resolve and check Android module descriptors", long_about = None)]
struct Cli {
    #[command(flatten)]
    resolve: ResolveArgs,

    /// Log output format (logs go to stderr)
    #[arg(long, global = true, env = "DROIDCONF_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a descriptor resolves
    Validate {
        /// Path to the descriptor
        #[arg(default_value = "build.gradle.kts")]
        path: PathBuf,
    },
    /// Print the resolved descriptor
    Resolve {
        /// Path to the descriptor
        #[arg(default_value = "build.gradle.kts")]
        path: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Print a descriptor in canonical form
    Fmt {
        /// Path to the descriptor
        #[arg(default_value = "build.gradle.kts")]
        path: PathBuf,
        /// Fail instead of printing when the file is not canonical
        #[arg(long)]
        check: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let result = match &cli.command {
        Commands::Validate { path } => commands::validate(&cli.resolve, path),
        Commands::Resolve { path, format } => commands::resolve::run(&cli.resolve, path, *format),
        Commands::Fmt { path, check } => commands::fmt::run(&cli.resolve, path, *check),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(commands::exit_code(&e))
        }
    }
}
