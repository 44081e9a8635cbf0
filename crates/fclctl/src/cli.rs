use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fclctl")]
#[command(author, version, about = "Command-line client for the FCL Mini App registration API", long_about = None)]
pub struct Cli {
    /// Config file (defaults to ./fcl.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Use staging environment (.env.staging)
    #[arg(long, global = true)]
    pub staging: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show which init data and user id the client resolves
    Whoami {
        /// Verify the init data signature with the configured bot token
        #[arg(long)]
        verify: bool,
    },

    /// Print the stored draft as JSON
    Load,

    /// Replace the stored draft with the contents of a JSON file
    Save {
        /// Draft JSON file
        file: PathBuf,

        /// Apply the discipline/mode defaults before saving
        #[arg(long)]
        normalize: bool,
    },

    /// Submit a registration from a JSON file
    Submit {
        /// Draft JSON file
        file: PathBuf,

        /// Refuse to submit drafts the backend would reject for missing discipline/mode
        #[arg(long)]
        check: bool,
    },

    /// Check that the backend is up
    Health,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
