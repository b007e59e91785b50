use clap::{ArgAction, Parser, Subcommand, ValueHint};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lmstune")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (-d, -dd, -ddd)
    #[arg(short = 'd', long = "debug", action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Print author and version information
    #[arg(long)]
    pub info: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply the navigation filter to a scenario and show the pruned tree
    Filter {
        /// Scenario fixture file (.toml)
        #[arg(value_hint = ValueHint::FilePath)]
        scenario: PathBuf,

        /// Act as this user instead of the scenario's acting user
        #[arg(short, long)]
        user: Option<u64>,
    },

    /// Run the accessibility passes once over a scenario's page
    Enhance {
        /// Scenario fixture file (.toml)
        #[arg(value_hint = ValueHint::FilePath)]
        scenario: PathBuf,
    },

    /// Full flow: filter the navigation, then enhance the page through its staged insertions
    Run {
        /// Scenario fixture file (.toml)
        #[arg(value_hint = ValueHint::FilePath)]
        scenario: PathBuf,

        /// Act as this user instead of the scenario's acting user
        #[arg(short, long)]
        user: Option<u64>,

        /// Write the run report here instead of a temp file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        report: Option<PathBuf>,
    },

    /// List and validate the scenarios in a directory
    Scenarios {
        /// Directory to scan (default: configured scenario directory)
        #[arg(value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },

    /// Pick a scenario interactively and run it
    Select {
        /// Directory to pick from (default: configured scenario directory)
        #[arg(value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },

    /// Print content hashes of a scenario's fully processed page and navigation
    Fingerprint {
        /// Scenario fixture file (.toml)
        #[arg(value_hint = ValueHint::FilePath)]
        scenario: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completion scripts
    Completion {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the merged configuration
    Show,

    /// Create a config file template
    Init {
        /// Create the global config instead of a local .lmstune.toml
        #[arg(short, long)]
        global: bool,
    },

    /// Show configuration file paths
    Path,
}
