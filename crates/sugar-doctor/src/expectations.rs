use std::time::Duration;

/// Environment variable overriding the interpreter to inspect.
pub const PYTHON_OVERRIDE_VAR: &str = "SUGAR_PYTHON";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibrarySpec {
    pub display: String,
    pub module: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolSpec {
    pub display: String,
    pub command: String,
    pub probe_arg: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSpec {
    pub path: String,
    pub description: String,
}

/// What a working SuGaR environment looks like.
#[derive(Clone, Debug)]
pub struct EnvExpectations {
    pub python: String,
    /// Pinned (major, minor) interpreter version.
    pub python_version: (u32, u32),
    /// Variable naming the active conda environment.
    pub env_var: String,
    pub env_name: String,
    /// Pinned CUDA toolkit major version.
    pub cuda_major: String,
    /// Substring in a GPU name hinting at the newest architecture.
    pub gpu_hint: String,
    pub libraries: Vec<LibrarySpec>,
    pub tools: Vec<ToolSpec>,
    pub files: Vec<FileSpec>,
    pub tool_timeout: Duration,
    /// Interpreter probes import torch and friends, which can take a while.
    pub probe_timeout: Duration,
}

fn library(display: &str, module: &str) -> LibrarySpec {
    LibrarySpec {
        display: display.to_owned(),
        module: module.to_owned(),
    }
}

fn tool(display: &str, command: &str, probe_arg: &str) -> ToolSpec {
    ToolSpec {
        display: display.to_owned(),
        command: command.to_owned(),
        probe_arg: probe_arg.to_owned(),
    }
}

fn file(path: &str, description: &str) -> FileSpec {
    FileSpec {
        path: path.to_owned(),
        description: description.to_owned(),
    }
}

impl Default for EnvExpectations {
    fn default() -> Self {
        Self {
            python: "python".to_owned(),
            python_version: (3, 10),
            env_var: "CONDA_DEFAULT_ENV".to_owned(),
            env_name: "gs_linux_backup".to_owned(),
            cuda_major: "12".to_owned(),
            gpu_hint: "50".to_owned(),
            libraries: vec![
                library("diff-gaussian-rasterization", "diff_gaussian_rasterization"),
                library("simple-knn", "simple_knn"),
                library("Open3D", "open3d"),
                // PyMCubes installs as `mcubes`.
                library("PyMCubes", "mcubes"),
                library("PyTorch3D", "pytorch3d"),
                library("NumPy", "numpy"),
                library("OpenCV", "cv2"),
                library("Torch", "torch"),
                library("Matplotlib", "matplotlib"),
                library("PIL", "PIL"),
            ],
            tools: vec![
                tool("FFmpeg", "ffmpeg", "-version"),
                tool("COLMAP", "colmap", "help"),
                tool("Git", "git", "--version"),
            ],
            files: vec![
                file("train_full_pipeline.py", "main training script"),
                file("run_viewer.py", "viewer"),
                file("render_blender_scene.py", "Blender rendering"),
                file("metrics.py", "evaluation script"),
            ],
            tool_timeout: Duration::from_secs(2),
            probe_timeout: Duration::from_secs(120),
        }
    }
}

impl EnvExpectations {
    /// Defaults, with the interpreter taken from `SUGAR_PYTHON` when set.
    pub fn from_env() -> Self {
        let mut expectations = Self::default();
        if let Ok(python) = std::env::var(PYTHON_OVERRIDE_VAR) {
            if !python.trim().is_empty() {
                expectations.python = python;
            }
        }
        expectations
    }
}
