use std::path::PathBuf;
use std::process;

use clap::Parser;

use boot_bench::{current_timestamp, privilege, BenchError};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Report file to create (truncated if it already exists).
    #[clap(long, default_value = "benchmarkResults.csv")]
    output: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = boot_bench::run(privilege::is_elevated(), &cli.output) {
        eprintln!("[{}] {}", current_timestamp(), e);
        let code = match e {
            BenchError::NotRoot => 2,
            _ => 1,
        };
        process::exit(code);
    }
}
