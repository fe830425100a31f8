//! Boot-device benchmark harness.
//!
//! Drives two external tools, `dd` and `fio`, across a fixed
//! {file size × block size} matrix, averages repeated runs, and appends the
//! aggregated MB/s figures to a sectioned CSV-like report.
//!
//! Invocation is fixed: the matrices, repeat counts, and tool arguments are
//! compile-time constants. The only knob the binary exposes is `--output`,
//! which relocates the report from its default `benchmarkResults.csv`.

use std::path::Path;

pub mod dd;
pub mod error;
pub mod fio;
pub mod matrix;
pub mod privilege;
pub mod report;

pub use error::{BenchError, Result};

use report::Report;

pub fn current_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Run the whole benchmark: fio matrix first, then dd, into one report at
/// `output`.
///
/// `elevated` is the caller's privilege check (the binary passes
/// [`privilege::is_elevated`]). Without it the run is refused before the
/// report file is created or truncated, so an existing results file
/// survives an unprivileged invocation untouched.
pub fn run(elevated: bool, output: &Path) -> Result<()> {
    if !elevated {
        return Err(BenchError::NotRoot);
    }
    let mut report = Report::create(output)?;
    let mut fio_runner = fio::Fio::new();
    fio::run_matrix(&mut fio_runner, &mut report)?;
    let mut dd_runner = dd::Dd::new();
    dd::run_matrix(&mut dd_runner, &mut report)?;
    println!(
        "[{}] benchmark complete, results written to {}",
        current_timestamp(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn unprivileged_run_leaves_existing_report_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("benchmarkResults.csv");
        fs::write(&path, "earlier results").unwrap();
        let err = run(false, &path).unwrap_err();
        assert!(matches!(err, BenchError::NotRoot));
        assert_eq!(fs::read_to_string(&path).unwrap(), "earlier results");
    }

    #[test]
    fn unprivileged_run_creates_no_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("benchmarkResults.csv");
        assert!(run(false, &path).is_err());
        assert!(!path.exists());
    }
}
