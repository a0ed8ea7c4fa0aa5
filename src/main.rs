//! CLI entry point for catalog preparation and photomosaic generation

use cardmosaic::io::cli::{Cli, CommandRunner};
use cardmosaic::io::logging::init_logging;
use clap::Parser;

fn main() -> cardmosaic::Result<()> {
    let runner = CommandRunner::new(Cli::parse());
    init_logging(runner.cli().verbose, runner.cli().quiet, runner.progress());
    runner.run()
}
