use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Sectioned results file. Each tool writes one section bounded by literal
/// marker lines, with one comma-separated data row per matrix entry. Rows
/// use CRLF endings and carry no header, quoting, or escaping.
pub struct Report {
    out: File,
}

impl Report {
    /// Create (or truncate) the report at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Report> {
        Ok(Report {
            out: File::create(path)?,
        })
    }

    pub fn begin_section(&mut self, name: &str) -> Result<()> {
        write!(self.out, "### {} ###\r\n", name)?;
        Ok(())
    }

    pub fn end_section(&mut self, name: &str) -> Result<()> {
        write!(self.out, "### {} end ###\r\n", name)?;
        Ok(())
    }

    /// Append one data row. Cells are joined with `", "`, matching the
    /// positional column layout the matrix drivers rely on.
    pub fn write_row(&mut self, cells: &[String]) -> Result<()> {
        write!(self.out, "{}\r\n", cells.join(", "))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn markers_and_rows_are_byte_exact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        {
            let mut report = Report::create(&path).unwrap();
            report.begin_section("dd benchmarks").unwrap();
            report
                .write_row(&[
                    "392".to_string(),
                    "311.5".to_string(),
                    "5800".to_string(),
                    "2GiB".to_string(),
                    "4KiB".to_string(),
                ])
                .unwrap();
            report.end_section("dd benchmarks").unwrap();
        }
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "### dd benchmarks ###\r\n392, 311.5, 5800, 2GiB, 4KiB\r\n### dd benchmarks end ###\r\n"
        );
    }

    #[test]
    fn create_truncates_previous_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        fs::write(&path, "stale data").unwrap();
        {
            let mut report = Report::create(&path).unwrap();
            report.begin_section("fio benchmarks").unwrap();
            report.end_section("fio benchmarks").unwrap();
        }
        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("stale"));
        assert!(contents.starts_with("### fio benchmarks ###\r\n"));
    }
}
