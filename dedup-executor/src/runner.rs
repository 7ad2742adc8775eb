//! Suite runner: runs one test suite with every relevant compiler.
//!
//! For each compiler the runner wipes `elm-stuff` (compiled artifacts are
//! compiler specific), launches the test runner matching the suite's
//! `elm-explorations/test` version and records pass, fail or timeout.

use std::path::Path;
use std::time::{Duration, Instant};

use dedup_core::{CompilerKind, ElmTestVersion, RunResult, RunResults, SuiteReport};

use crate::backend::{CommandBackend, Completion, Invocation};
use crate::config::{Compilers, HarnessConfig};
use crate::ExecutorError;

/// `npx` package running 1.x suites.
pub const ELM_TEST_V1_PACKAGE: &str = "elm-test@0.19.1-revision9";

/// `npx` package running 2.x suites when no binary is configured.
pub const ELM_TEST_RS_PACKAGE: &str = "elm-test-rs";

/// Worker count handed to `elm-test-rs`.
pub const ELM_TEST_RS_WORKERS: &str = "4";

/// Runs suites through a [`CommandBackend`].
pub struct SuiteRunner<B: CommandBackend> {
    backend: B,
    compilers: Compilers,
    elm_test_rs: Option<String>,
    timeout: Duration,
}

impl<B: CommandBackend> SuiteRunner<B> {
    /// Create a runner using the compilers and time budget of `config`.
    #[must_use]
    pub fn new(backend: B, config: &HarnessConfig) -> Self {
        Self {
            backend,
            compilers: config.compilers.clone(),
            elm_test_rs: config.elm_test_rs.clone(),
            timeout: config.suite_timeout,
        }
    }

    /// Backend used to launch the test runners.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run the suite rooted at `path` with every compiler of its version.
    ///
    /// # Errors
    /// Returns [`ExecutorError::MissingElmJson`] if the suite has no
    /// `elm.json`, or propagates backend spawn and I/O errors. A failing or
    /// timed-out compiler run is a result, not an error.
    pub async fn run_suite(&self, path: &Path) -> Result<SuiteReport, ExecutorError> {
        let start = Instant::now();
        let elm_json = tokio::fs::read_to_string(path.join("elm.json"))
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ExecutorError::MissingElmJson {
                    path: path.to_owned(),
                },
                _ => ExecutorError::Io(e),
            })?;
        let version = ElmTestVersion::detect(&elm_json);

        tracing::info!(suite = %path.display(), %version, "testing suite");

        let mut results = RunResults::new(version);
        for compiler in version.compilers() {
            let result = self.run_with(path, version, *compiler).await?;
            tracing::debug!(
                suite = %path.display(),
                compiler = compiler.label(),
                %result,
                "compiler run complete"
            );
            results.record(*compiler, result);
        }

        let elapsed = start.elapsed();
        tracing::info!(
            suite = %path.display(),
            elapsed_s = elapsed.as_secs(),
            rank = results.anomaly_rank(),
            "suite complete"
        );
        Ok(SuiteReport::new(path.to_owned(), elapsed, results))
    }

    /// Build the test-runner invocation for one compiler.
    #[must_use]
    pub fn invocation(&self, path: &Path, version: ElmTestVersion, compiler: CompilerKind) -> Invocation {
        let base = match version {
            ElmTestVersion::V1 => Invocation::new("npx").args(["--yes", ELM_TEST_V1_PACKAGE]),
            ElmTestVersion::V2 => {
                let runner = match &self.elm_test_rs {
                    Some(binary) => Invocation::new(binary.clone()),
                    None => Invocation::new("npx").args(["--yes", ELM_TEST_RS_PACKAGE]),
                };
                runner.args(["--workers", ELM_TEST_RS_WORKERS])
            }
        };
        base.args(["--compiler", self.compilers.executable(compiler)])
            .current_dir(path)
    }

    async fn run_with(
        &self,
        path: &Path,
        version: ElmTestVersion,
        compiler: CompilerKind,
    ) -> Result<RunResult, ExecutorError> {
        let elm_stuff = path.join("elm-stuff");
        if tokio::fs::try_exists(&elm_stuff).await? {
            tokio::fs::remove_dir_all(&elm_stuff).await?;
        }

        let output = self
            .backend
            .execute(&self.invocation(path, version, compiler), self.timeout)
            .await?;

        Ok(match output.completion {
            Completion::Exited { success, .. } => RunResult::Finished(success),
            Completion::TimedOut => RunResult::TimedOut,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::backend::ExecutionOutput;

    /// Records invocations and answers from a script keyed by compiler.
    struct ScriptedBackend {
        calls: Mutex<Vec<Invocation>>,
        answer: fn(&Invocation) -> Completion,
    }

    impl ScriptedBackend {
        fn new(answer: fn(&Invocation) -> Completion) -> Self {
            Self { calls: Mutex::new(Vec::new()), answer }
        }

        fn calls(&self) -> Vec<Invocation> {
            match self.calls.lock() {
                Ok(c) => c.clone(),
                Err(e) => panic!("lock poisoned: {e}"),
            }
        }
    }

    #[async_trait]
    impl CommandBackend for ScriptedBackend {
        async fn execute(
            &self,
            invocation: &Invocation,
            _timeout: Duration,
        ) -> Result<ExecutionOutput, ExecutorError> {
            // elm-stuff must be gone before every run.
            assert!(!invocation.current_dir.join("elm-stuff").exists(), "elm-stuff not cleared");
            std::fs::create_dir_all(invocation.current_dir.join("elm-stuff"))?;
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(invocation.clone());
            }
            Ok(ExecutionOutput {
                completion: (self.answer)(invocation),
                stdout: Vec::new(),
                elapsed: Duration::ZERO,
            })
        }

        async fn health_check(&self, _program: &str) -> Result<(), ExecutorError> {
            Ok(())
        }
    }

    fn suite(elm_json: &str) -> tempfile::TempDir {
        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(e) => panic!("failed to create tempdir: {e}"),
        };
        if let Err(e) = std::fs::write(dir.path().join("elm.json"), elm_json) {
            panic!("failed to write elm.json: {e}");
        }
        dir
    }

    const V1_JSON: &str = r#"{"type":"package","test-dependencies":{"elm-explorations/test":"1.2.2 <= v < 2.0.0"}}"#;
    const V2_JSON: &str = r#"{"type":"package","test-dependencies":{"elm-explorations/test":"2.0.0 <= v < 3.0.0"}}"#;

    fn pass(_: &Invocation) -> Completion {
        Completion::Exited { success: true, code: Some(0) }
    }

    fn compiler_of(invocation: &Invocation) -> &str {
        invocation.args.last().map_or("", String::as_str)
    }

    #[tokio::test]
    async fn v1_suite_runs_three_compilers_through_elm_test() {
        let dir = suite(V1_JSON);
        let runner = SuiteRunner::new(ScriptedBackend::new(pass), &HarnessConfig::default());
        let report = match runner.run_suite(dir.path()).await {
            Ok(r) => r,
            Err(e) => panic!("run failed: {e}"),
        };
        assert_eq!(report.results.version, ElmTestVersion::V1);
        assert!(report.results.all_passed());

        let calls = runner.backend.calls();
        let compilers: Vec<&str> = calls.iter().map(compiler_of).collect();
        assert_eq!(compilers, ["elm", "lamdera-stable-no-wire", "lamdera-stable"]);
        assert_eq!(calls[0].program, "npx");
        assert_eq!(calls[0].args[..2], ["--yes".to_owned(), ELM_TEST_V1_PACKAGE.to_owned()]);
        assert_eq!(calls[0].current_dir, dir.path());
    }

    #[tokio::test]
    async fn v2_suite_uses_configured_elm_test_rs() {
        let dir = suite(V2_JSON);
        let mut config = HarnessConfig::default();
        config.elm_test_rs = Some("/opt/elm-test-rs".to_owned());
        let runner = SuiteRunner::new(ScriptedBackend::new(pass), &config);
        let report = match runner.run_suite(dir.path()).await {
            Ok(r) => r,
            Err(e) => panic!("run failed: {e}"),
        };
        assert_eq!(report.results.outcomes.len(), 5);

        let calls = runner.backend.calls();
        assert!(calls.iter().all(|c| c.program == "/opt/elm-test-rs"));
        assert_eq!(
            calls[0].args,
            ["--workers", "4", "--compiler", "elm"].map(str::to_owned)
        );
    }

    #[test]
    fn v2_invocation_defaults_to_npx() {
        let runner = SuiteRunner::new(ScriptedBackend::new(pass), &HarnessConfig::default());
        let inv = runner.invocation(&PathBuf::from("/s"), ElmTestVersion::V2, CompilerKind::LamderaNext);
        assert_eq!(inv.program, "npx");
        assert_eq!(
            inv.args,
            ["--yes", "elm-test-rs", "--workers", "4", "--compiler", "lamdera-next"].map(str::to_owned)
        );
    }

    #[tokio::test]
    async fn timeouts_and_failures_are_recorded_per_compiler() {
        fn answer(inv: &Invocation) -> Completion {
            match compiler_of(inv) {
                "elm" => Completion::Exited { success: true, code: Some(0) },
                "lamdera-stable-no-wire" => Completion::TimedOut,
                _ => Completion::Exited { success: false, code: Some(1) },
            }
        }
        let dir = suite(V1_JSON);
        let runner = SuiteRunner::new(ScriptedBackend::new(answer), &HarnessConfig::default());
        let report = match runner.run_suite(dir.path()).await {
            Ok(r) => r,
            Err(e) => panic!("run failed: {e}"),
        };
        assert_eq!(report.results.get(CompilerKind::Elm), Some(RunResult::Finished(true)));
        assert_eq!(report.results.get(CompilerKind::LamderaStableNoWire), Some(RunResult::TimedOut));
        assert_eq!(report.results.get(CompilerKind::LamderaStable), Some(RunResult::Finished(false)));
        assert_eq!(report.results.anomaly_rank(), 2);
    }

    #[tokio::test]
    async fn missing_elm_json_is_reported() {
        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(e) => panic!("failed to create tempdir: {e}"),
        };
        let runner = SuiteRunner::new(ScriptedBackend::new(pass), &HarnessConfig::default());
        let result = runner.run_suite(dir.path()).await;
        assert!(matches!(result, Err(ExecutorError::MissingElmJson { .. })), "got {result:?}");
    }
}
