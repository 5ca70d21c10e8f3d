use std::{collections::BTreeMap, io, process::Stdio, time::Duration};

use serde::{de::DeserializeOwned, Deserialize};
use tokio::process::Command;

/// How a probed command ended.
#[derive(Debug)]
pub enum CommandOutcome {
    Exited {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// The command couldn't be started, usually because it isn't installed.
    Missing(io::Error),
    /// Still running after the timeout. The child has been killed.
    TimedOut,
}

impl CommandOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Exited { code: Some(0), .. })
    }
}

pub async fn run_command(program: &str, args: &[&str], timeout: Duration) -> CommandOutcome {
    log::debug!("Probing {program} {args:?}");

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    match tokio::time::timeout(timeout, command.output()).await {
        Err(_) => CommandOutcome::TimedOut,
        Ok(Err(e)) => CommandOutcome::Missing(e),
        Ok(Ok(output)) => CommandOutcome::Exited {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        },
    }
}

/// One line describing why a probe didn't succeed.
fn failure_reason(program: &str, outcome: &CommandOutcome) -> String {
    match outcome {
        CommandOutcome::Exited { code, stderr, .. } => last_line(stderr).map_or_else(
            || match code {
                Some(code) => format!("{program} exited with code {code}"),
                None => format!("{program} was terminated by a signal"),
            },
            str::to_owned,
        ),
        CommandOutcome::Missing(e) => format!("Can't run {program}: {e}"),
        CommandOutcome::TimedOut => format!("{program} timed out"),
    }
}

fn stdout_or_reason(program: &str, outcome: CommandOutcome) -> Result<String, String> {
    match outcome {
        CommandOutcome::Exited {
            code: Some(0),
            stdout,
            ..
        } => Ok(stdout),
        outcome => Err(failure_reason(program, &outcome)),
    }
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().rev().map(str::trim).find(|l| !l.is_empty())
}

/// Parse `Python 3.10.12` (or just `3.10`) into its numeric parts.
pub fn parse_python_version(text: &str) -> Option<(u32, u32, u32)> {
    let version = text
        .split_whitespace()
        .find(|word| word.starts_with(|c: char| c.is_ascii_digit()))?;
    let mut parts = version.split('.').map(|p| {
        p.chars()
            .take_while(char::is_ascii_digit)
            .collect::<String>()
            .parse::<u32>()
            .ok()
    });
    let major = parts.next()??;
    let minor = parts.next()??;
    let micro = parts.next().flatten().unwrap_or(0);
    Some((major, minor, micro))
}

pub async fn python_version(python: &str, timeout: Duration) -> Result<(u32, u32, u32), String> {
    match run_command(python, &["--version"], timeout).await {
        CommandOutcome::Exited {
            code: Some(0),
            stdout,
            stderr,
        } => {
            // Old interpreters print the version to stderr.
            parse_python_version(&stdout)
                .or_else(|| parse_python_version(&stderr))
                .ok_or_else(|| format!("Unrecognised version output: {}", stdout.trim()))
        }
        outcome => Err(failure_reason(python, &outcome)),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct GpuDevice {
    pub name: String,
    /// Bytes.
    pub total_memory: u64,
    pub major: u32,
    pub minor: u32,
    pub multi_processor_count: u32,
}

impl GpuDevice {
    pub fn memory_gb(&self) -> f64 {
        self.total_memory as f64 / 1024f64.powi(3)
    }
}

/// What PyTorch reports about the CUDA runtime.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TorchInfo {
    pub version: String,
    pub cuda_available: bool,
    pub cuda_version: Option<String>,
    #[serde(default)]
    pub devices: Vec<GpuDevice>,
    pub current_device: Option<usize>,
}

impl TorchInfo {
    pub fn current(&self) -> Option<&GpuDevice> {
        self.devices.get(self.current_device?)
    }
}

const TORCH_PROBE: &str = r#"
import json
import torch

info = {
    "version": torch.__version__,
    "cuda_available": torch.cuda.is_available(),
    "cuda_version": torch.version.cuda,
    "devices": [],
    "current_device": None,
}
if info["cuda_available"]:
    for i in range(torch.cuda.device_count()):
        p = torch.cuda.get_device_properties(i)
        info["devices"].append({
            "name": p.name,
            "total_memory": p.total_memory,
            "major": p.major,
            "minor": p.minor,
            "multi_processor_count": p.multi_processor_count,
        })
    info["current_device"] = torch.cuda.current_device()
print(json.dumps(info))
"#;

const IMPORT_PROBE: &str = r#"
import importlib
import json
import sys

errors = {}
for name in sys.argv[1:]:
    try:
        importlib.import_module(name)
        errors[name] = None
    except Exception as e:
        errors[name] = f"{type(e).__name__}: {e}"
print(json.dumps(errors))
"#;

/// Libraries can print their own banners on import, so look for the JSON
/// on the last line that has any.
fn parse_json_line<T: DeserializeOwned>(stdout: &str) -> Result<T, String> {
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with('{'))
        .ok_or_else(|| "Probe printed no result".to_owned())?;
    serde_json::from_str(line).map_err(|e| format!("Invalid probe output: {e}"))
}

pub fn parse_torch_info(stdout: &str) -> Result<TorchInfo, String> {
    parse_json_line(stdout)
}

pub async fn torch_info(python: &str, timeout: Duration) -> Result<TorchInfo, String> {
    let outcome = run_command(python, &["-c", TORCH_PROBE], timeout).await;
    parse_torch_info(&stdout_or_reason(python, outcome)?)
}

/// Import every module in one interpreter. Maps each module to its import error, if any.
pub async fn import_modules(
    python: &str,
    modules: &[&str],
    timeout: Duration,
) -> Result<BTreeMap<String, Option<String>>, String> {
    let mut args = vec!["-c", IMPORT_PROBE];
    args.extend_from_slice(modules);
    let outcome = run_command(python, &args, timeout).await;
    parse_json_line(&stdout_or_reason(python, outcome)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_versions() {
        assert_eq!(parse_python_version("Python 3.10.12\n"), Some((3, 10, 12)));
        assert_eq!(parse_python_version("Python 3.12.0rc1"), Some((3, 12, 0)));
        assert_eq!(parse_python_version("Python 2.7"), Some((2, 7, 0)));
        assert_eq!(parse_python_version("command not found"), None);
    }

    #[test]
    fn torch_probe_output() {
        let stdout = "some banner\n{\"version\": \"2.4.0+cu124\", \"cuda_available\": true, \
             \"cuda_version\": \"12.4\", \"devices\": [{\"name\": \"NVIDIA GeForce RTX 5090\", \
             \"total_memory\": 34190917632, \"major\": 12, \"minor\": 0, \
             \"multi_processor_count\": 170}], \"current_device\": 0}\n";
        let info = parse_torch_info(stdout).expect("valid probe output");
        assert!(info.cuda_available);
        let device = info.current().expect("current device");
        assert_eq!(device.multi_processor_count, 170);
        assert!((device.memory_gb() - 31.8).abs() < 0.05);
    }

    #[test]
    fn torch_probe_garbage() {
        assert!(parse_torch_info("Traceback (most recent call last):").is_err());
    }

    #[tokio::test]
    async fn missing_command() {
        let outcome = run_command(
            "sugar-doctor-definitely-not-installed",
            &["--version"],
            Duration::from_secs(2),
        )
        .await;
        assert!(matches!(outcome, CommandOutcome::Missing(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_command_times_out() {
        let outcome = run_command("sleep", &["5"], Duration::from_millis(100)).await;
        assert!(matches!(outcome, CommandOutcome::TimedOut));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_codes() {
        let ok = run_command("true", &["--version"], Duration::from_secs(2)).await;
        assert!(ok.succeeded());
        let failed = run_command("false", &["x"], Duration::from_secs(2)).await;
        assert!(matches!(failed, CommandOutcome::Exited { code: Some(1), .. }));
    }
}
