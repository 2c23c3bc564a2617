mod cli;
mod io;
pub mod logger;
mod script;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let args = cli::CliArgs::parse();

    logger::init(args.log.as_deref(), args.verbose);
    log::info!("canvas-engine {} starting", env!("CARGO_PKG_VERSION"));
    if let Some(path) = logger::log_path() {
        log::debug!("session log at {}", path.display());
    }

    cli::run(args)
}
