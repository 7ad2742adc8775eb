//! CSV export of suites that did not pass everywhere.

use std::io::Write;
use std::path::Path;

use dedup_core::{CompilerKind, SuiteReport};

use crate::ExecutorError;

/// Default export file name.
pub const DEFAULT_EXPORT_PATH: &str = "export.csv";

/// Write one row per suite that did not pass with every compiler.
///
/// Compilers a suite was not run with leave their column empty. Returns the
/// number of rows written, header excluded.
///
/// # Errors
/// Returns [`ExecutorError::Export`] if writing fails.
pub fn write_csv<W: Write>(writer: W, reports: &[SuiteReport]) -> Result<usize, ExecutorError> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec!["Path", "Elm-test version"];
    header.extend(CompilerKind::ALL.iter().map(|c| c.label()));
    csv.write_record(&header)?;

    let mut rows = 0;
    for report in reports.iter().filter(|r| !r.results.all_passed()) {
        let mut record = vec![report.path.display().to_string(), report.results.version.to_string()];
        record.extend(
            CompilerKind::ALL
                .iter()
                .map(|c| report.results.get(*c).map(|r| r.to_string()).unwrap_or_default()),
        );
        csv.write_record(&record)?;
        rows += 1;
    }
    csv.flush()?;
    Ok(rows)
}

/// Write the export to `path`, replacing any existing file.
///
/// # Errors
/// Returns [`ExecutorError::Io`] if the file cannot be created, or
/// [`ExecutorError::Export`] if writing fails.
pub fn export_to_path(path: &Path, reports: &[SuiteReport]) -> Result<usize, ExecutorError> {
    let file = std::fs::File::create(path)?;
    let rows = write_csv(std::io::BufWriter::new(file), reports)?;
    tracing::info!(path = %path.display(), rows, "results exported");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use dedup_core::{ElmTestVersion, RunResult, RunResults};

    use super::*;

    fn report(path: &str, version: ElmTestVersion, outcomes: &[RunResult]) -> SuiteReport {
        let mut results = RunResults::new(version);
        for (compiler, outcome) in version.compilers().iter().zip(outcomes) {
            results.record(*compiler, *outcome);
        }
        SuiteReport::new(PathBuf::from(path), Duration::from_secs(3), results)
    }

    const PASS: RunResult = RunResult::Finished(true);
    const FAIL: RunResult = RunResult::Finished(false);

    fn render(reports: &[SuiteReport]) -> (usize, String) {
        let mut buf = Vec::new();
        let rows = match write_csv(&mut buf, reports) {
            Ok(n) => n,
            Err(e) => panic!("export failed: {e}"),
        };
        (rows, String::from_utf8_lossy(&buf).into_owned())
    }

    #[test]
    fn header_lists_every_compiler() {
        let (rows, out) = render(&[]);
        assert_eq!(rows, 0);
        assert_eq!(
            out,
            "Path,Elm-test version,Elm,Lamdera stable no wire,Lamdera stable,Lamdera next no wire,Lamdera next\n"
        );
    }

    #[test]
    fn passing_suites_are_skipped() {
        let reports = [
            report("a/ok/1.0.0", ElmTestVersion::V1, &[PASS, PASS, PASS]),
            report("b/ok/2.0.0", ElmTestVersion::V2, &[PASS, PASS, PASS, PASS, PASS]),
        ];
        assert_eq!(render(&reports).0, 0);
    }

    #[test]
    fn v1_rows_leave_next_columns_empty() {
        let reports = [report("a/x/1.0.0", ElmTestVersion::V1, &[PASS, FAIL, RunResult::TimedOut])];
        let (rows, out) = render(&reports);
        assert_eq!(rows, 1);
        assert_eq!(out.lines().nth(1), Some("a/x/1.0.0,1,✅,❌,⏰,,"));
    }

    #[test]
    fn v2_rows_carry_their_version() {
        let reports = [report("b/y/2.0.0", ElmTestVersion::V2, &[PASS, PASS, PASS, PASS, FAIL])];
        let (_, out) = render(&reports);
        assert_eq!(out.lines().nth(1), Some("b/y/2.0.0,2,✅,✅,✅,✅,❌"));
    }

    #[test]
    fn export_to_path_writes_file() {
        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(e) => panic!("failed to create tempdir: {e}"),
        };
        let path = dir.path().join(DEFAULT_EXPORT_PATH);
        let reports = [report("a/x/1.0.0", ElmTestVersion::V1, &[FAIL, FAIL, FAIL])];
        assert_eq!(export_to_path(&path, &reports).ok(), Some(1));
        let written = std::fs::read_to_string(&path).unwrap_or_default();
        assert_eq!(written.lines().count(), 2);
    }
}
