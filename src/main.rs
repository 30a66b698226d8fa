use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::init_logging(args.verbose);
    cli::dispatch(args)
}
