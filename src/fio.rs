//! fio driver: sequential, random, and mixed-mode throughput under direct
//! I/O with the libaio engine.
//!
//! fio is asked for JSON output; the relevant `bw_bytes` fields are pulled
//! out of `jobs[0]` and converted to MB/s so the figures line up with the
//! dd section of the report.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use crate::current_timestamp;
use crate::error::{BenchError, Result};
use crate::matrix::{FILE_SIZES, FIO_BLOCK_SIZES};
use crate::report::Report;

/// fio names its job file after the job: `<name>.<jobnum>.<filenum>`.
const JOB_NAME: &str = "tempfile";
const TEMP_PATH: &str = "tempfile.0.0";
const REPEAT: u32 = 3;
/// Read share of the mixed random workload, in percent.
const MIX_READ_PERCENT: u32 = 90;

/// fio access patterns, named as fio's `--rw=` argument expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Write,
    Read,
    RandWrite,
    RandRead,
    RandRw,
}

impl AccessMode {
    pub fn as_arg(self) -> &'static str {
        match self {
            AccessMode::Write => "write",
            AccessMode::Read => "read",
            AccessMode::RandWrite => "randwrite",
            AccessMode::RandRead => "randread",
            AccessMode::RandRw => "randrw",
        }
    }

    fn measures_writes(self) -> bool {
        matches!(self, AccessMode::Write | AccessMode::RandWrite | AccessMode::RandRw)
    }

    fn measures_reads(self) -> bool {
        matches!(self, AccessMode::Read | AccessMode::RandRead | AccessMode::RandRw)
    }
}

/// Bandwidth extracted from one fio run, in MB/s. Only the direction(s) the
/// mode actually measures are populated; mixed mode populates both.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FioSample {
    pub read: Option<f64>,
    pub write: Option<f64>,
}

impl FioSample {
    fn require_read(&self) -> Result<f64> {
        self.read.ok_or_else(|| BenchError::Parse {
            tool: "fio",
            reason: "expected a read bandwidth in this sample".to_string(),
        })
    }

    fn require_write(&self) -> Result<f64> {
        self.write.ok_or_else(|| BenchError::Parse {
            tool: "fio",
            reason: "expected a write bandwidth in this sample".to_string(),
        })
    }
}

/// One fio invocation per call; trait seam for mocking the averager and the
/// matrix driver, mirroring [`crate::dd::DdRunner`].
pub trait FioRunner {
    fn run(&mut self, bs: &str, size: &str, mode: AccessMode, mix: Option<u32>)
        -> Result<FioSample>;
    fn remove_temp(&mut self) -> Result<()>;
}

pub struct Fio {
    temp_path: PathBuf,
}

impl Fio {
    pub fn new() -> Fio {
        Fio {
            temp_path: PathBuf::from(TEMP_PATH),
        }
    }
}

impl Default for Fio {
    fn default() -> Self {
        Fio::new()
    }
}

impl FioRunner for Fio {
    fn run(
        &mut self,
        bs: &str,
        size: &str,
        mode: AccessMode,
        mix: Option<u32>,
    ) -> Result<FioSample> {
        let mut cmd = Command::new("fio");
        cmd.arg(format!("--name={}", JOB_NAME))
            .arg(format!("--rw={}", mode.as_arg()))
            .arg("--direct=1")
            .arg("--ioengine=libaio")
            .arg(format!("--bs={}", bs))
            .arg(format!("--size={}", size));
        if let Some(pct) = mix {
            cmd.arg(format!("--rwmixread={}", pct));
        }
        cmd.arg("--output-format=json");
        let out = cmd.output()?;
        if !out.status.success() {
            return Err(BenchError::Tool {
                tool: "fio",
                status: out.status,
            });
        }
        let json: Value = serde_json::from_slice(&out.stdout)?;
        parse_bandwidth(mode, &json)
    }

    fn remove_temp(&mut self) -> Result<()> {
        fs::remove_file(&self.temp_path)?;
        Ok(())
    }
}

impl Drop for Fio {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.temp_path);
    }
}

/// Pull `jobs[0].<direction>.bw_bytes` out of fio's JSON output for the
/// direction(s) `mode` measures and convert bytes/s to MB/s (÷ 1,000,000).
pub fn parse_bandwidth(mode: AccessMode, json: &Value) -> Result<FioSample> {
    let job = json
        .get("jobs")
        .and_then(|jobs| jobs.get(0))
        .ok_or_else(|| BenchError::Parse {
            tool: "fio",
            reason: "missing jobs[0]".to_string(),
        })?;
    let mut sample = FioSample::default();
    if mode.measures_writes() {
        sample.write = Some(bw_bytes(job, "write")? / 1_000_000.0);
    }
    if mode.measures_reads() {
        sample.read = Some(bw_bytes(job, "read")? / 1_000_000.0);
    }
    Ok(sample)
}

fn bw_bytes(job: &Value, direction: &str) -> Result<f64> {
    job.get(direction)
        .and_then(|d| d.get("bw_bytes"))
        .and_then(Value::as_f64)
        .ok_or_else(|| BenchError::Parse {
            tool: "fio",
            reason: format!("missing jobs[0].{}.bw_bytes", direction),
        })
}

/// Per-metric means over [`REPEAT`] iterations, in MB/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FioAverages {
    pub seq_write: f64,
    pub seq_read: f64,
    pub rand_write: f64,
    pub rand_read: f64,
    pub mixed_rand_write: f64,
    pub mixed_rand_read: f64,
}

/// Run the five-workload sequence [`REPEAT`] times and average each metric.
/// The job file is removed after every measurement so each one starts cold;
/// sequential write and read share one file since the read needs the data
/// the write laid down.
pub fn average<R: FioRunner>(runner: &mut R, bs: &str, size: &str) -> Result<FioAverages> {
    let mut seq_write_total = 0.0;
    let mut seq_read_total = 0.0;
    let mut rand_write_total = 0.0;
    let mut rand_read_total = 0.0;
    let mut mixed_write_total = 0.0;
    let mut mixed_read_total = 0.0;

    for _ in 0..REPEAT {
        seq_write_total += runner.run(bs, size, AccessMode::Write, None)?.require_write()?;
        seq_read_total += runner.run(bs, size, AccessMode::Read, None)?.require_read()?;
        runner.remove_temp()?;
        rand_write_total += runner
            .run(bs, size, AccessMode::RandWrite, None)?
            .require_write()?;
        runner.remove_temp()?;
        rand_read_total += runner
            .run(bs, size, AccessMode::RandRead, None)?
            .require_read()?;
        runner.remove_temp()?;
        let mixed = runner.run(bs, size, AccessMode::RandRw, Some(MIX_READ_PERCENT))?;
        mixed_write_total += mixed.require_write()?;
        mixed_read_total += mixed.require_read()?;
        runner.remove_temp()?;
    }

    let n = f64::from(REPEAT);
    Ok(FioAverages {
        seq_write: seq_write_total / n,
        seq_read: seq_read_total / n,
        rand_write: rand_write_total / n,
        rand_read: rand_read_total / n,
        mixed_rand_write: mixed_write_total / n,
        mixed_rand_read: mixed_read_total / n,
    })
}

/// Walk the full file-size/block-size matrix and append one row per entry
/// to `report`: the six averages followed by the two labels.
pub fn run_matrix<R: FioRunner>(runner: &mut R, report: &mut Report) -> Result<()> {
    println!(
        "[{}] running fio benchmarks, this may take a while.....",
        current_timestamp()
    );
    report.begin_section("fio benchmarks")?;
    let pb = ProgressBar::new((FILE_SIZES.len() * FIO_BLOCK_SIZES.len()) as u64);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap()
            .progress_chars("##-"),
    );
    for fs_spec in &FILE_SIZES {
        for bs_label in FIO_BLOCK_SIZES {
            let avg = average(runner, bs_label, fs_spec.label)?;
            pb.println(format!(
                "fio {} bs={} avg: seq write = {} MB/s, seq read = {} MB/s, rand write = {} MB/s, \
                 rand read = {} MB/s, mixed rand write = {} MB/s, mixed rand read = {} MB/s",
                fs_spec.label,
                bs_label,
                avg.seq_write,
                avg.seq_read,
                avg.rand_write,
                avg.rand_read,
                avg.mixed_rand_write,
                avg.mixed_rand_read
            ));
            report.write_row(&[
                avg.seq_write.to_string(),
                avg.seq_read.to_string(),
                avg.rand_write.to_string(),
                avg.rand_read.to_string(),
                avg.mixed_rand_write.to_string(),
                avg.mixed_rand_read.to_string(),
                fs_spec.label.to_string(),
                bs_label.to_string(),
            ])?;
            pb.inc(1);
        }
    }
    pb.finish_with_message("fio benchmarks complete");
    report.end_section("fio benchmarks")?;
    Ok(())
}
