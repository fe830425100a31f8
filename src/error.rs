use std::io;
use std::process::ExitStatus;

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid fio json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{tool} exited with {status}")]
    Tool {
        tool: &'static str,
        status: ExitStatus,
    },
    #[error("could not parse {tool} output: {reason}")]
    Parse { tool: &'static str, reason: String },
    #[error("You need to have root privileges to run this benchmark.\nPlease try again, this time using 'sudo'. Exiting.")]
    NotRoot,
}

pub type Result<T> = std::result::Result<T, BenchError>;
