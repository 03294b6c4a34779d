//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Carimbo Proxy - caching proxy for Carimbo runtimes and game bundles
///
/// Fetches runtime releases and tagged source bundles from the release host
/// on demand, re-packages them and serves them over HTTP.
#[derive(Parser, Debug)]
#[command(name = "carimbo-proxy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Serve options used when no subcommand is given
    #[command(flatten)]
    pub serve: ServeArgs,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CARIMBO_PROXY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format (overrides general.log_format)
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// The command to run, `serve` when none was given
    pub fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Serve(self.serve))
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP proxy
    Serve(ServeArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),

    /// Print shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the serve command
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Address to bind (overrides server.host)
    #[arg(long, env = "CARIMBO_PROXY_HOST")]
    pub host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Print as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Arguments for the completions command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// Parse the `general.log_format` config value, defaulting to text
    pub fn from_config(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}
