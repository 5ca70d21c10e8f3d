//! Checks whether the host can run the SuGaR pipeline and reports what's missing.
//!
//! Nothing in here fails: every problem ends up as a failed line in a
//! [`CheckReport`].

pub mod check;
pub mod checks;
pub mod expectations;
pub mod probe;
pub mod report;

use std::path::Path;

pub use check::{CheckLine, CheckReport, Status};
pub use expectations::EnvExpectations;

/// Run the seven checks in order, calling `on_report` as each one finishes.
pub async fn run_checks(
    expect: &EnvExpectations,
    working_dir: &Path,
    mut on_report: impl FnMut(usize, &CheckReport),
) -> Vec<CheckReport> {
    let env_value = std::env::var(&expect.env_var).ok();
    let mut reports = Vec::with_capacity(7);

    let mut finish = |report: CheckReport| {
        on_report(reports.len() + 1, &report);
        reports.push(report);
    };

    finish(checks::interpreter_version(expect).await);
    finish(checks::active_environment(expect, env_value.as_deref()));
    finish(checks::accelerator_runtime(expect).await);
    finish(checks::libraries(expect).await);
    finish(checks::external_tools(expect).await);
    finish(checks::current_device(expect).await);
    finish(checks::project_files(expect, working_dir));

    reports
}
