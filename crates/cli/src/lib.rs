mod replay;
mod resolve;
mod vars;

use clap::{Args, Parser, Subcommand};
use luasense_core::ServiceConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "luasense",
    version,
    about = "Heuristic completion resolver for Lua scripts",
    long_about = "Luasense resolves method chains in partially typed Lua against an API catalog \
                  and decides which completion menu or parameter highlight an editor should show. \
                  These commands drive the resolver and the per-document worker from the shell."
)]
pub struct Cli {
    /// JSON service configuration (catalog path, completion tuning)
    #[arg(long, global = true, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Mirror logs to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Script plus the catalog to resolve it against.
#[derive(Args, Clone)]
pub struct SourceArgs {
    /// JSON API catalog; overrides the configured one
    #[arg(long, value_name = "CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Lua script to analyse
    #[arg(long, value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the expression at a cursor position
    #[command(
        long_about = "Runs the resolver at the given position, then one worker cycle for the same \
                      request, and prints the resolution and the emitted UI events as JSON."
    )]
    Resolve {
        #[command(flatten)]
        source: SourceArgs,

        /// Byte offset of the cursor; defaults to the end of the file
        #[arg(long, conflicts_with = "at")]
        offset: Option<usize>,

        /// Cursor as LINE:COL, both 1-based, column in bytes
        #[arg(long, value_name = "LINE:COL")]
        at: Option<String>,

        /// The editor saw a `.` and wants constants
        #[arg(long)]
        constant: bool,

        /// Ask for parameter highlighting instead of a menu
        #[arg(long)]
        params: bool,
    },
    /// Print the variable table inferred for a script
    Vars {
        #[command(flatten)]
        source: SourceArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Replay typing a script one character at a time through the worker
    #[command(
        long_about = "Feeds every prefix of the file to a single document session, as if typed. \
                      Requests that arrive while a run is busy replace each other, so only some \
                      keystrokes produce events; those are printed as JSON lines."
    )]
    Replay {
        #[command(flatten)]
        source: SourceArgs,

        /// Pause between keystrokes, in milliseconds
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,
    },
}

/// Configuration with the command line's catalog override applied.
pub(crate) fn effective_config(
    config_path: Option<&std::path::Path>,
    source: &SourceArgs,
) -> luasense_core::Result<ServiceConfig> {
    let config = luasense_runtime::load_config(config_path)?;
    Ok(match &source.catalog {
        Some(path) => config.with_catalog_path(path.clone()),
        None => config,
    })
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let _guard = luasense_runtime::init_logging("cli", cli.verbose);

    let rt = tokio::runtime::Runtime::new()?;
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Resolve {
            source,
            offset,
            at,
            constant,
            params,
        } => {
            let config = effective_config(config_path, &source)?;
            let position = match (offset, at) {
                (Some(offset), _) => resolve::Position::Offset(offset),
                (None, Some(at)) => resolve::Position::parse_line_col(&at)?,
                (None, None) => resolve::Position::End,
            };
            rt.block_on(resolve::run(
                config,
                source.file,
                position,
                resolve::Flags { constant, params },
            ))
        }
        Commands::Vars { source, json } => {
            let config = effective_config(config_path, &source)?;
            vars::run(config, source.file, json)
        }
        Commands::Replay { source, delay_ms } => {
            let config = effective_config(config_path, &source)?;
            rt.block_on(replay::run(config, source.file, delay_ms))
        }
    }
}
