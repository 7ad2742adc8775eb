//! Human-readable output of the harness commands.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use dedup_core::results::sort_for_display;
use dedup_core::{CompilerKind, SuiteReport};
use dedup_executor::board::format_eta;
use dedup_executor::{ProgressBoard, ReviewSummary};
use tokio::task::JoinHandle;

/// Log a progress summary every `interval` until the task is aborted.
#[must_use]
pub fn spawn_progress_reporter(board: Arc<ProgressBoard>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let summary = board.summary();
            tracing::info!("{summary}");
            for (path, elapsed) in &summary.in_progress {
                tracing::debug!(suite = %path.display(), running = %format_eta(*elapsed), "in progress");
            }
        }
    })
}

/// Final results table, anomalies first.
#[must_use]
pub fn results_table(reports: &[SuiteReport]) -> String {
    let mut sorted = reports.to_vec();
    sort_for_display(&mut sorted);

    let mut out = String::new();
    let _ = write!(out, "{:>4}  {:>8}  {:<2}", "rank", "time", "v");
    for compiler in CompilerKind::ALL {
        let _ = write!(out, "  {}", compiler.label());
    }
    out.push_str("  path\n");

    for report in &sorted {
        let results = &report.results;
        let _ = write!(
            out,
            "{:>4}  {:>8}  {:<2}",
            results.anomaly_rank(),
            format_eta(report.elapsed),
            results.version
        );
        for compiler in CompilerKind::ALL {
            let cell = results.get(compiler).map(|r| r.to_string()).unwrap_or_default();
            // Pad to the label width; result symbols are one column wide.
            let width = compiler.label().chars().count();
            let _ = write!(out, "  {cell:<width$}");
        }
        let _ = writeln!(out, "  {}", report.path.display());
    }
    out
}

/// Flagged review output followed by the tally.
#[must_use]
pub fn review_report(summary: &ReviewSummary) -> String {
    let mut out = String::new();
    for (path, output) in &summary.flagged {
        let _ = write!(out, "\n\n==========================\n\n{}\n\n{output}", path.display());
    }
    let _ = writeln!(
        out,
        "\nReviewed {}: {} clean, {} flagged",
        summary.clean + summary.flagged.len(),
        summary.clean,
        summary.flagged.len()
    );
    out
}
