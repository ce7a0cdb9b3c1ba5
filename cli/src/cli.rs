use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run bounce programs
    Run {
        /// Paths to the files to run, in order
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
        /// Configuration file (defaults to ./bounce.toml)
        #[arg(long)]
        conf: Option<PathBuf>,
        /// Level of verbosity
        #[arg(short, long, default_value_t = false)]
        verbose: bool,
    },
    /// Parse and transform bounce programs without running them
    Check {
        /// Paths to the files to check
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
        /// Configuration file (defaults to ./bounce.toml)
        #[arg(long)]
        conf: Option<PathBuf>,
        /// Level of verbosity
        #[arg(short, long, default_value_t = false)]
        verbose: bool,
    },
    /// Print a program after transformation
    Dump {
        /// Path to the file to dump
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Lay the program out for this width instead of one form per line
        #[arg(short, long)]
        width: Option<usize>,
        /// Configuration file (defaults to ./bounce.toml)
        #[arg(long)]
        conf: Option<PathBuf>,
        /// Level of verbosity
        #[arg(short, long, default_value_t = false)]
        verbose: bool,
    },
}
