mod cli;

use bounce_driver::{Driver, Result, dump};
use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use std::{io, path::Path, process::ExitCode};

fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn driver(conf: Option<&Path>, verbose: bool) -> Result<Driver> {
    init_logger(verbose);
    Driver::discover(conf)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        | Commands::Run { files, conf, verbose } => {
            let driver = driver(conf.as_deref(), verbose)?;
            for file in files {
                driver.run_file(&file, Box::new(io::stdout()))?;
            }
        }
        | Commands::Check { files, conf, verbose } => {
            let driver = driver(conf.as_deref(), verbose)?;
            for file in files {
                driver.check_file(&file)?;
                println!("{} {}", "ok".green(), file.display());
            }
        }
        | Commands::Dump { file, width, conf, verbose } => {
            let driver = driver(conf.as_deref(), verbose)?;
            print!("{}", dump(&driver.check_file(&file)?, width));
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        | Ok(()) => ExitCode::SUCCESS,
        | Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
