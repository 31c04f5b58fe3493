//! CLI argument definitions for memio

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "memio")]
#[command(about = "Read and write typed values in process memory", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which process to attach to
#[derive(Args, Debug, Default)]
pub struct TargetArgs {
    /// Process id
    #[arg(short, long, global = true, conflicts_with = "name")]
    pub pid: Option<u32>,

    /// Process name (uses configured default if neither is provided)
    #[arg(short = 'N', long, global = true)]
    pub name: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read values at an address
    #[command(visible_alias = "r")]
    Read {
        /// Address or expression (e.g. "heap + 0x10", "libc + 8 * 4")
        address: String,

        /// Number of elements (bytes when no type is given)
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Type key (u8..u64, s8..s64, float, double, c_str, string)
        #[arg(short = 't', long = "type")]
        type_name: Option<String>,

        /// Print a list even for a single element
        #[arg(long)]
        array: bool,

        /// Print integers in hex
        #[arg(long)]
        hex: bool,

        /// Print JSON
        #[arg(long, conflicts_with = "hex")]
        json: bool,
    },

    /// Write values at an address
    #[command(visible_alias = "w")]
    Write {
        /// Address or expression
        address: String,

        /// Type key; without it values are hex bytes (e.g. "de ad be ef")
        #[arg(short = 't', long = "type")]
        type_name: Option<String>,

        /// Values to write, one element each
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Replace the payload of a std::string in place
    SetString {
        /// Address of the std::string object
        address: String,

        /// New contents
        text: String,
    },

    /// Show base addresses of mapped libraries and regions
    Regions {
        /// List every mapped region instead of base addresses
        #[arg(long)]
        maps: bool,
    },

    /// Evaluate an address expression against the target's base addresses
    Eval {
        expression: String,
    },

    /// List registered types
    Types {
        /// Show full documentation
        #[arg(short, long)]
        verbose: bool,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Set default process name
        #[arg(long)]
        process: Option<String>,

        /// Set default log filter (e.g. "memio=debug")
        #[arg(long)]
        log_level: Option<String>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
