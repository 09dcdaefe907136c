use clap::Parser;
use roster_cli::{Cli, dispatch};

fn main() {
    let cli = Cli::parse();
    if let Err(err) = dispatch(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
