use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Debug, Subcommand, PartialEq)]
pub(crate) enum Command {
    /// Run the registry loop in the foreground.
    Run {
        /// Path to the device inventory
        #[clap(short, long)]
        config: Option<PathBuf>,
        /// Exit once the inventory and the script are played out
        #[clap(long)]
        once: bool,
    },
    /// Print the devices present at startup.
    List {
        /// Path to the device inventory
        #[clap(short, long)]
        config: Option<PathBuf>,
    },
}

impl Command {
    pub(crate) fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Command::Run { config, .. } | Command::List { config } => config.as_ref(),
        }
    }
}

/// Hot-pluggable joystick registry driven by a virtual device inventory.
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Turn debugging information on
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// The command to run
    #[clap(subcommand)]
    pub command: Command,
}
