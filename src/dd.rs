//! dd driver: sequential write, cold read, and cached read throughput.
//!
//! Each measurement shells out to `dd` once and pulls the MB/s figure from
//! its stderr summary. Cold reads drop the page cache first, so the whole
//! harness has to run as root.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use indicatif::{ProgressBar, ProgressStyle};

use crate::current_timestamp;
use crate::error::{BenchError, Result};
use crate::matrix::{DD_BLOCK_SIZES, FILE_SIZES};
use crate::report::Report;

const TEMP_PATH: &str = "/tempfile";
const REPEAT: u32 = 4;

/// One dd invocation per method; the trait exists so the averager and the
/// matrix driver can be exercised against a mock.
pub trait DdRunner {
    /// Sequential write with synchronous-flush semantics; returns MB/s.
    fn write(&mut self, bs: &str, count: u64) -> Result<f64>;
    /// Cold read: page cache dropped first; returns MB/s.
    fn read(&mut self, bs: &str, count: u64) -> Result<f64>;
    /// Warm read straight from the page cache; returns MB/s.
    fn cached_read(&mut self, bs: &str, count: u64) -> Result<f64>;
    /// Remove the temp file between iterations so stale cache state never
    /// bleeds into the next measurement. A missing file is an error.
    fn remove_temp(&mut self) -> Result<()>;
}

/// The real runner. Owns the fixed temp path and removes it on drop as a
/// backstop for aborted runs.
pub struct Dd {
    temp_path: PathBuf,
}

impl Dd {
    pub fn new() -> Dd {
        Dd {
            temp_path: PathBuf::from(TEMP_PATH),
        }
    }

    fn invoke(&self, args: &[String]) -> Result<f64> {
        // LC_ALL=C pins the summary format the parser is written against.
        let out = Command::new("dd").args(args).env("LC_ALL", "C").output()?;
        if !out.status.success() {
            return Err(BenchError::Tool {
                tool: "dd",
                status: out.status,
            });
        }
        parse_transfer_rate(&String::from_utf8_lossy(&out.stderr))
    }
}

impl Default for Dd {
    fn default() -> Self {
        Dd::new()
    }
}

impl DdRunner for Dd {
    fn write(&mut self, bs: &str, count: u64) -> Result<f64> {
        self.invoke(&[
            "if=/dev/zero".to_string(),
            format!("of={}", self.temp_path.display()),
            format!("bs={}", bs),
            format!("count={}", count),
            "conv=fdatasync,notrunc".to_string(),
        ])
    }

    fn read(&mut self, bs: &str, count: u64) -> Result<f64> {
        drop_page_cache()?;
        self.cached_read(bs, count)
    }

    fn cached_read(&mut self, bs: &str, count: u64) -> Result<f64> {
        self.invoke(&[
            format!("if={}", self.temp_path.display()),
            "of=/dev/null".to_string(),
            format!("bs={}", bs),
            format!("count={}", count),
        ])
    }

    fn remove_temp(&mut self) -> Result<()> {
        fs::remove_file(&self.temp_path)?;
        Ok(())
    }
}

impl Drop for Dd {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.temp_path);
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        /// Evict clean caches, dentries and inodes so the next read hits the
        /// device. Needs root.
        fn drop_page_cache() -> Result<()> {
            fs::write("/proc/sys/vm/drop_caches", b"3")?;
            Ok(())
        }
    } else {
        fn drop_page_cache() -> Result<()> {
            Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "dropping the page cache is only supported on Linux",
            )
            .into())
        }
    }
}

/// Extract the transfer rate, normalized to MB/s, from dd's stderr summary.
///
/// The rate and its unit are the last two tokens of the final line, e.g.
/// `1073741824 bytes (1.1 GB, 1.0 GiB) copied, 2.74165 s, 392 MB/s`.
/// Unknown units are rejected rather than misread, so a format change in a
/// future coreutils release fails loudly here.
pub fn parse_transfer_rate(stderr: &str) -> Result<f64> {
    let parse_err = |reason: String| BenchError::Parse {
        tool: "dd",
        reason,
    };
    let summary = stderr
        .lines()
        .filter(|l| !l.trim().is_empty())
        .last()
        .ok_or_else(|| parse_err("empty stderr".to_string()))?;
    let mut tokens = summary.split_whitespace().rev();
    let unit = tokens
        .next()
        .ok_or_else(|| parse_err(format!("no tokens in summary line '{}'", summary)))?;
    let rate: f64 = tokens
        .next()
        .ok_or_else(|| parse_err(format!("no rate in summary line '{}'", summary)))?
        .parse()
        .map_err(|_| parse_err(format!("rate is not a number in '{}'", summary)))?;
    match unit {
        "GB/s" => Ok(rate * 1000.0),
        "MB/s" => Ok(rate),
        "kB/s" => Ok(rate / 1000.0),
        other => Err(parse_err(format!("unknown rate unit '{}'", other))),
    }
}

/// Per-metric means over [`REPEAT`] iterations, in MB/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DdAverages {
    pub write: f64,
    pub read: f64,
    pub cached_read: f64,
}

/// Run write -> cold read -> cached read [`REPEAT`] times, removing the temp
/// file after every iteration, and average each metric.
pub fn average<R: DdRunner>(runner: &mut R, bs: &str, count: u64) -> Result<DdAverages> {
    let mut write_total = 0.0;
    let mut read_total = 0.0;
    let mut cached_read_total = 0.0;

    for _ in 0..REPEAT {
        write_total += runner.write(bs, count)?;
        read_total += runner.read(bs, count)?;
        cached_read_total += runner.cached_read(bs, count)?;
        runner.remove_temp()?;
    }

    let n = f64::from(REPEAT);
    Ok(DdAverages {
        write: write_total / n,
        read: read_total / n,
        cached_read: cached_read_total / n,
    })
}

/// Walk the full file-size/block-size matrix and append one row per entry
/// to `report`: `write, read, cached_read, fileSize, blockSize`.
pub fn run_matrix<R: DdRunner>(runner: &mut R, report: &mut Report) -> Result<()> {
    println!(
        "[{}] running dd benchmarks, this may take a while.....",
        current_timestamp()
    );
    report.begin_section("dd benchmarks")?;
    let pb = ProgressBar::new((FILE_SIZES.len() * DD_BLOCK_SIZES.len()) as u64);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap()
            .progress_chars("##-"),
    );
    for fs_spec in &FILE_SIZES {
        for bs_spec in &DD_BLOCK_SIZES {
            let count = fs_spec.bytes / bs_spec.bytes;
            let avg = average(runner, bs_spec.label, count)?;
            pb.println(format!(
                "dd {} bs={} avg: write = {} MB/s, read = {} MB/s, cached read = {} MB/s",
                fs_spec.label, bs_spec.label, avg.write, avg.read, avg.cached_read
            ));
            report.write_row(&[
                avg.write.to_string(),
                avg.read.to_string(),
                avg.cached_read.to_string(),
                fs_spec.label.to_string(),
                bs_spec.label.to_string(),
            ])?;
            pb.inc(1);
        }
    }
    pb.finish_with_message("dd benchmarks complete");
    report.end_section("dd benchmarks")?;
    Ok(())
}
