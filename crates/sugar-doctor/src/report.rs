use std::fmt::Write;

use crate::{check::CheckReport, expectations::EnvExpectations};

const RULE: &str = "============================================================";

pub fn render_banner() -> String {
    format!("{}\nSuGaR pipeline environment check\n{}\n", "🚀".repeat(20), "🚀".repeat(20))
}

/// One check as a numbered section.
pub fn render_section(index: usize, report: &CheckReport) -> String {
    let mut out = format!("{RULE}\n{index}. {}\n{RULE}\n", report.title);
    for line in &report.lines {
        let _ = writeln!(out, "{line}");
    }
    out
}

pub fn all_passed(reports: &[CheckReport]) -> bool {
    reports.iter().all(CheckReport::passed)
}

pub fn render_summary(expect: &EnvExpectations, reports: &[CheckReport]) -> String {
    let mut out = format!("{RULE}\nSummary\n{RULE}\n");

    if all_passed(reports) {
        out.push_str("✅ All checks passed! The environment is ready.\n\n");
        out.push_str("Start the SuGaR pipeline with:\n");
        out.push_str("  ./sugar_video_pipeline.sh <video path> <scene name>\n");
    } else {
        let failed: Vec<_> = reports
            .iter()
            .filter(|r| !r.passed())
            .map(|r| r.title)
            .collect();
        let _ = writeln!(
            out,
            "❌ Some checks failed ({}). Fix the issues reported above.",
            failed.join(", ")
        );
        out.push_str("\nCommon fixes:\n");
        let _ = writeln!(out, "  1. Activate the conda environment: conda activate {}", expect.env_name);
        out.push_str("  2. Install dependencies: pip install -r requirements.txt\n");
        out.push_str(
            "  3. Build the CUDA extensions: pip install -e gaussian_splatting/submodules/diff-gaussian-rasterization \
             gaussian_splatting/submodules/simple-knn\n",
        );
    }
    out.push_str(RULE);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_layout() {
        let mut report = CheckReport::new("External tools");
        report.pass("Git");
        let text = render_section(5, &report);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[1], "5. External tools");
        assert_eq!(lines[3], "✅ Git");
    }

    #[test]
    fn summary_hints_only_on_failure() {
        let expect = EnvExpectations::default();
        let mut good = CheckReport::new("Python");
        good.pass("Python 3.10");

        let summary = render_summary(&expect, &[good.clone()]);
        assert!(summary.contains("All checks passed"));
        assert!(!summary.contains("conda activate"));

        let mut bad = CheckReport::new("SuGaR files");
        bad.fail("metrics.py - not found");
        let summary = render_summary(&expect, &[good, bad]);
        assert!(summary.contains("Some checks failed (SuGaR files)"));
        assert!(summary.contains("conda activate gs_linux_backup"));
        assert!(summary.contains("pip install -r requirements.txt"));
    }
}
