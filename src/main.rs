use clap::Parser;
use psytrader::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
