use std::{collections::BTreeMap, path::Path};

use crate::{
    check::{CheckReport, Status},
    expectations::{EnvExpectations, ToolSpec},
    probe::{self, CommandOutcome, TorchInfo},
};

/// Pinned minor passes, same major warns, anything else fails.
pub fn classify_version(pinned: (u32, u32), found: (u32, u32)) -> Status {
    if found == pinned {
        Status::Pass
    } else if found.0 == pinned.0 {
        Status::Warn
    } else {
        Status::Fail
    }
}

pub fn version_report(
    expect: &EnvExpectations,
    version: Result<(u32, u32, u32), String>,
) -> CheckReport {
    let mut report = CheckReport::new("Python");
    let (major, minor, micro) = match version {
        Ok(version) => version,
        Err(e) => {
            report.fail(format!("Couldn't query {}: {e}", expect.python));
            return report;
        }
    };

    let (pinned_major, pinned_minor) = expect.python_version;
    report.info(format!("Python version: {major}.{minor}.{micro}"));
    match classify_version(expect.python_version, (major, minor)) {
        Status::Pass => report.pass(format!("Python {major}.{minor}")),
        Status::Warn => report.warn(format!(
            "Python {major}.{minor} - usable, but {pinned_major}.{pinned_minor} is recommended"
        )),
        Status::Fail => report.fail(format!("Python {major}.{minor} - not supported")),
    }
    report
}

pub async fn interpreter_version(expect: &EnvExpectations) -> CheckReport {
    version_report(
        expect,
        probe::python_version(&expect.python, expect.probe_timeout).await,
    )
}

/// `value` is the content of the environment variable naming the active environment.
pub fn active_environment(expect: &EnvExpectations, value: Option<&str>) -> CheckReport {
    let mut report = CheckReport::new("Conda environment");
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => report.fail(format!("No conda environment active ({} is not set)", expect.env_var)),
        Some(env) => {
            report.info(format!("Active environment: {env}"));
            if env == expect.env_name {
                report.pass(format!("Using the {env} environment"));
            } else {
                report.warn(format!(
                    "Using the {env} environment, {} is recommended",
                    expect.env_name
                ));
            }
        }
    }
    report
}

pub fn runtime_report(expect: &EnvExpectations, info: Result<TorchInfo, String>) -> CheckReport {
    let mut report = CheckReport::new("PyTorch and CUDA");
    let info = match info {
        Ok(info) => info,
        Err(e) => {
            report.fail(format!("PyTorch not usable: {e}"));
            return report;
        }
    };

    report.info(format!("PyTorch version: {}", info.version));
    report.info(format!("CUDA available: {}", info.cuda_available));
    if !info.cuda_available {
        report.fail("CUDA not available");
        return report;
    }

    let cuda_version = info.cuda_version.as_deref().unwrap_or("unknown");
    report.info(format!("CUDA version: {cuda_version}"));
    report.info(format!("CUDA devices: {}", info.devices.len()));
    if info.devices.is_empty() {
        report.fail("No CUDA device found");
        return report;
    }

    for (i, device) in info.devices.iter().enumerate() {
        report.info(format!("  GPU {i}: {}", device.name));
        report.info(format!("    Memory: {:.1} GB", device.memory_gb()));
        report.info(format!(
            "    Compute capability: {}.{}",
            device.major, device.minor
        ));
    }

    let cuda_major = cuda_version.split('.').next().unwrap_or_default();
    if cuda_major == expect.cuda_major {
        report.pass(format!("CUDA {}", expect.cuda_major));
    } else {
        report.warn(format!(
            "CUDA {cuda_version} - upgrading to CUDA {} is recommended",
            expect.cuda_major
        ));
    }
    report
}

pub async fn accelerator_runtime(expect: &EnvExpectations) -> CheckReport {
    runtime_report(
        expect,
        probe::torch_info(&expect.python, expect.probe_timeout).await,
    )
}

pub fn libraries_report(
    expect: &EnvExpectations,
    imports: Result<BTreeMap<String, Option<String>>, String>,
) -> CheckReport {
    let mut report = CheckReport::new("SuGaR dependencies");
    let imports = match imports {
        Ok(imports) => imports,
        Err(e) => {
            report.info(format!("Import probe failed: {e}"));
            BTreeMap::new()
        }
    };

    for lib in &expect.libraries {
        match imports.get(&lib.module) {
            Some(None) => report.pass(&lib.display),
            Some(Some(error)) => {
                log::debug!("Importing {} failed: {error}", lib.module);
                report.fail(format!("{} - not installed", lib.display));
            }
            None => report.fail(format!("{} - not installed", lib.display)),
        }
    }
    report
}

pub async fn libraries(expect: &EnvExpectations) -> CheckReport {
    let modules: Vec<&str> = expect.libraries.iter().map(|l| l.module.as_str()).collect();
    let imports = probe::import_modules(&expect.python, &modules, expect.probe_timeout).await;
    libraries_report(expect, imports)
}

fn tool_line(report: &mut CheckReport, tool: &ToolSpec, outcome: &CommandOutcome) {
    match outcome {
        CommandOutcome::Exited { code: Some(0), .. } => report.pass(&tool.display),
        CommandOutcome::Exited { .. } => {
            report.warn(format!("{} - found, but the probe reported a problem", tool.display));
        }
        CommandOutcome::Missing(_) | CommandOutcome::TimedOut => {
            report.fail(format!("{} - not found", tool.display));
        }
    }
}

pub async fn external_tools(expect: &EnvExpectations) -> CheckReport {
    let mut report = CheckReport::new("External tools");
    for tool in &expect.tools {
        let outcome =
            probe::run_command(&tool.command, &[&tool.probe_arg], expect.tool_timeout).await;
        tool_line(&mut report, tool, &outcome);
    }
    report
}

pub fn device_report(expect: &EnvExpectations, info: Result<TorchInfo, String>) -> CheckReport {
    let mut report = CheckReport::new("GPU");
    let info = match info {
        Ok(info) => info,
        Err(e) => {
            report.fail(format!("Failed to query GPU info: {e}"));
            return report;
        }
    };

    let Some(device) = info.current().filter(|_| info.cuda_available) else {
        report.fail("No usable GPU");
        return report;
    };

    report.info(format!("GPU name: {}", device.name));
    report.info(format!("Total memory: {:.1} GB", device.memory_gb()));
    report.info(format!(
        "Compute capability: {}.{}",
        device.major, device.minor
    ));
    report.info(format!("Multiprocessors: {}", device.multi_processor_count));

    // Only a hint: a name match says nothing reliable about capabilities.
    if device.name.contains(&expect.gpu_hint) {
        report.pass("RTX 50 series - newest architecture, CUDA 12.8 supported");
    } else {
        report.warn("Not a 50 series GPU - there may be compatibility issues");
    }
    report
}

pub async fn current_device(expect: &EnvExpectations) -> CheckReport {
    device_report(
        expect,
        probe::torch_info(&expect.python, expect.probe_timeout).await,
    )
}

pub fn project_files(expect: &EnvExpectations, working_dir: &Path) -> CheckReport {
    let mut report = CheckReport::new("SuGaR files");
    for file in &expect.files {
        if working_dir.join(&file.path).exists() {
            report.pass(format!("{} ({})", file.path, file.description));
        } else {
            report.fail(format!("{} - not found", file.path));
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::probe::GpuDevice;

    fn torch(cuda_version: &str, name: &str) -> TorchInfo {
        TorchInfo {
            version: "2.4.0".to_owned(),
            cuda_available: true,
            cuda_version: Some(cuda_version.to_owned()),
            devices: vec![GpuDevice {
                name: name.to_owned(),
                total_memory: 8 * 1024 * 1024 * 1024,
                major: 8,
                minor: 6,
                multi_processor_count: 46,
            }],
            current_device: Some(0),
        }
    }

    #[test]
    fn version_classification() {
        assert_eq!(classify_version((3, 10), (3, 10)), Status::Pass);
        assert_eq!(classify_version((3, 10), (3, 8)), Status::Warn);
        assert_eq!(classify_version((3, 10), (3, 12)), Status::Warn);
        assert_eq!(classify_version((3, 10), (2, 10)), Status::Fail);
        assert_eq!(classify_version((3, 10), (4, 0)), Status::Fail);
    }

    #[test]
    fn version_report_outcomes() {
        let expect = EnvExpectations::default();
        assert!(version_report(&expect, Ok((3, 11, 2))).passed());
        assert!(!version_report(&expect, Ok((2, 7, 18))).passed());
        assert!(!version_report(&expect, Err("not found".to_owned())).passed());
    }

    #[test]
    fn environment_name() {
        let expect = EnvExpectations::default();

        let report = active_environment(&expect, Some("gs_linux_backup"));
        assert!(report.passed());
        assert_eq!(report.count(Status::Pass), 1);

        let report = active_environment(&expect, Some("base"));
        assert!(report.passed());
        assert_eq!(report.count(Status::Warn), 1);

        assert!(!active_environment(&expect, None).passed());
        assert!(!active_environment(&expect, Some("  ")).passed());
    }

    #[test]
    fn runtime_checks() {
        let expect = EnvExpectations::default();

        let report = runtime_report(&expect, Ok(torch("12.4", "RTX 4090")));
        assert!(report.passed());
        assert_eq!(report.count(Status::Warn), 0);
        assert!(report.lines.iter().any(|l| l.text == "    Memory: 8.0 GB"));

        let report = runtime_report(&expect, Ok(torch("11.8", "RTX 3060")));
        assert!(report.passed());
        assert_eq!(report.count(Status::Warn), 1);

        let mut no_cuda = torch("12.1", "none");
        no_cuda.cuda_available = false;
        assert!(!runtime_report(&expect, Ok(no_cuda)).passed());

        assert!(!runtime_report(&expect, Err("No module named 'torch'".to_owned())).passed());
    }

    #[test]
    fn device_hint_is_not_a_failure() {
        let expect = EnvExpectations::default();

        let report = device_report(&expect, Ok(torch("12.8", "NVIDIA GeForce RTX 5080")));
        assert!(report.passed());
        assert_eq!(report.count(Status::Pass), 1);

        let report = device_report(&expect, Ok(torch("12.8", "NVIDIA GeForce RTX 4090")));
        assert!(report.passed());
        assert_eq!(report.count(Status::Warn), 1);

        let mut no_device = torch("12.8", "x");
        no_device.current_device = None;
        assert!(!device_report(&expect, Ok(no_device)).passed());
    }

    #[test]
    fn libraries_need_every_import() {
        let expect = EnvExpectations::default();
        let all_ok: BTreeMap<_, _> = expect
            .libraries
            .iter()
            .map(|l| (l.module.clone(), None))
            .collect();
        assert!(libraries_report(&expect, Ok(all_ok.clone())).passed());

        let mut one_missing = all_ok;
        one_missing.insert(
            "pytorch3d".to_owned(),
            Some("ModuleNotFoundError: No module named 'pytorch3d'".to_owned()),
        );
        let report = libraries_report(&expect, Ok(one_missing));
        assert!(!report.passed());
        assert_eq!(report.count(Status::Fail), 1);

        let report = libraries_report(&expect, Err("Can't run python".to_owned()));
        assert_eq!(report.count(Status::Fail), expect.libraries.len());
    }

    #[test]
    fn files_relative_to_working_dir() {
        let dir = std::env::temp_dir().join(format!("sugar-doctor-files-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("Failed to create temp dir");
        let expect = EnvExpectations::default();

        let report = project_files(&expect, &dir);
        assert_eq!(report.count(Status::Fail), expect.files.len());

        for file in &expect.files {
            std::fs::write(dir.join(&file.path), "").expect("Failed to write file");
        }
        assert!(project_files(&expect, &dir).passed());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn tool_outcomes() {
        let expect = EnvExpectations {
            tools: vec![
                ToolSpec {
                    display: "True".to_owned(),
                    command: "true".to_owned(),
                    probe_arg: "--version".to_owned(),
                },
                ToolSpec {
                    display: "False".to_owned(),
                    command: "false".to_owned(),
                    probe_arg: "--version".to_owned(),
                },
            ],
            ..Default::default()
        };
        let report = external_tools(&expect).await;
        assert!(report.passed());
        assert_eq!(report.count(Status::Pass), 1);
        assert_eq!(report.count(Status::Warn), 1);

        let expect = EnvExpectations {
            tools: vec![
                ToolSpec {
                    display: "Sleepy".to_owned(),
                    command: "sleep".to_owned(),
                    probe_arg: "5".to_owned(),
                },
                ToolSpec {
                    display: "Nothing".to_owned(),
                    command: "sugar-doctor-not-a-tool".to_owned(),
                    probe_arg: "--version".to_owned(),
                },
            ],
            tool_timeout: Duration::from_millis(100),
            ..Default::default()
        };
        let report = external_tools(&expect).await;
        assert!(!report.passed());
        assert_eq!(report.count(Status::Fail), 2);
    }
}
