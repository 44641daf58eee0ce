use anyhow::Result;
use clap::Parser;
use routekit::cli::Cli;

fn main() -> Result<()> {
    Cli::parse().run()
}
