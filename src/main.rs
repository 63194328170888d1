//! Rangekit - named-range formula compiler

mod cli;
mod commands;
mod config;
mod error;

use log::warn;
use std::env;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let cli = match cli::parse_args(&args) {
        Ok(Some(cli)) => cli,
        Ok(None) => {
            cli::print_usage();
            return;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            cli::print_usage();
            std::process::exit(1);
        }
    };

    init_logging(cli.verbose);

    let (config, warnings) = config::load_config(cli.config.as_ref());
    for warning in warnings {
        warn!("{}", warning);
    }

    if let Err(e) = commands::run(&cli, &config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
