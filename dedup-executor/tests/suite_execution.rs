//! Integration test: discover suites in a repositories tree, test them with
//! every compiler, rank and export the results.
//!
//! The fake backend stands in for the test runners; one real-process test
//! is ignored because it needs the Elm toolchain on `PATH`.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use async_trait::async_trait;
use dedup_core::results::sort_for_display;
use dedup_core::{CompilerKind, ElmTestVersion, RunResult};
use dedup_executor::{
    discover_suites, write_csv, CommandBackend, Completion, ExecutionOutput, ExecutorError,
    HarnessConfig, Invocation, ProcessBackend, SuiteRunner, TestOrchestrator,
};

/// Fails Lamdera stable for suites of the `lamdera-breaks` package and
/// passes everything else.
struct FakeRunners;

#[async_trait]
impl CommandBackend for FakeRunners {
    async fn execute(
        &self,
        invocation: &Invocation,
        _timeout: Duration,
    ) -> Result<ExecutionOutput, ExecutorError> {
        let compiler = invocation.args.last().map_or("", String::as_str);
        let breaks = invocation.current_dir.to_string_lossy().contains("lamdera-breaks");
        let success = !(breaks && compiler == "lamdera-stable");
        Ok(ExecutionOutput {
            completion: Completion::Exited { success, code: Some(i32::from(!success)) },
            stdout: Vec::new(),
            elapsed: Duration::ZERO,
        })
    }

    async fn health_check(&self, _program: &str) -> Result<(), ExecutorError> {
        Ok(())
    }
}

const V1_JSON: &str = r#"{"type":"package","test-dependencies":{"elm-explorations/test":"1.2.2 <= v < 2.0.0"}}"#;
const V2_JSON: &str = r#"{"type":"package","test-dependencies":{"elm-explorations/test":"2.1.0 <= v < 3.0.0"}}"#;

fn write_suite(root: &Path, relative: &str, elm_json: &str) {
    let dir = root.join(relative);
    std::fs::create_dir_all(dir.join("tests")).unwrap_or_else(|e| panic!("mkdir {relative}: {e}"));
    std::fs::write(dir.join("elm.json"), elm_json).unwrap_or_else(|e| panic!("write {relative}: {e}"));
}

#[tokio::test]
async fn discovered_suites_are_tested_ranked_and_exported() {
    let repos = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    write_suite(repos.path(), "alice/fine/1.0.0", V1_JSON);
    write_suite(repos.path(), "bob/lamdera-breaks/2.0.0", V2_JSON);
    std::fs::create_dir_all(repos.path().join("carol/no-tests/1.0.0"))
        .unwrap_or_else(|e| panic!("mkdir: {e}"));

    let suites = discover_suites(repos.path(), &AtomicBool::new(false))
        .await
        .unwrap_or_else(|e| panic!("discovery failed: {e}"));
    assert_eq!(suites.len(), 2, "directories without tests/ are not suites");

    let config = HarnessConfig::new(repos.path().to_owned());
    let orchestrator = TestOrchestrator::new(SuiteRunner::new(FakeRunners, &config), config.concurrency);
    let mut reports = orchestrator
        .run(suites)
        .await
        .unwrap_or_else(|e| panic!("run failed: {e}"));
    assert_eq!(reports.len(), 2);

    sort_for_display(&mut reports);
    let first = &reports[0];
    assert!(first.path.ends_with("bob/lamdera-breaks/2.0.0"));
    assert_eq!(first.results.version, ElmTestVersion::V2);
    assert_eq!(first.results.get(CompilerKind::LamderaStable), Some(RunResult::Finished(false)));
    assert_eq!(first.results.anomaly_rank(), 3);
    assert_eq!(reports[1].results.anomaly_rank(), 11);

    let mut csv = Vec::new();
    let rows = write_csv(&mut csv, &reports).unwrap_or_else(|e| panic!("export failed: {e}"));
    assert_eq!(rows, 1, "only the failing suite is exported");
    let csv = String::from_utf8_lossy(&csv);
    assert!(csv.lines().nth(1).is_some_and(|row| row.ends_with(",2,✅,✅,❌,✅,✅")), "got {csv}");
}

#[tokio::test]
#[ignore = "requires elm, npx and the lamdera compilers on PATH"]
async fn real_suite_runs_with_local_toolchain() {
    let repos = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    write_suite(repos.path(), "elm/core/1.0.5", V1_JSON);
    let runner = SuiteRunner::new(ProcessBackend::new(), &HarnessConfig::new(repos.path().to_owned()));
    let report = runner
        .run_suite(&repos.path().join("elm/core/1.0.5"))
        .await
        .unwrap_or_else(|e| panic!("run failed: {e}"));
    assert_eq!(report.results.outcomes.len(), 3);
}
