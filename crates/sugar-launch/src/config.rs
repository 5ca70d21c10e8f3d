use std::{fmt, path::PathBuf};

use clap::{ArgAction, Args, ValueEnum};

/// Iterations used when nothing else is requested.
pub const DEFAULT_ITERATIONS: u32 = 15000;
/// Iterations forced by `--fast-mode`.
pub const FAST_MODE_ITERATIONS: u32 = 7000;

/// Coarse regularization method. Decides which entry point trains the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Regularization {
    /// Density regularization with depth-normal consistency (recommended).
    #[value(name = "dn_consistency", alias = "consistency")]
    DnConsistency,
    /// Plain density regularization.
    Density,
    /// SDF regularization.
    Sdf,
}

impl Regularization {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DnConsistency => "dn_consistency",
            Self::Density => "density",
            Self::Sdf => "sdf",
        }
    }

    /// Both density flavours share one entry point.
    pub fn uses_density_trainer(self) -> bool {
        matches!(self, Self::DnConsistency | Self::Density)
    }
}

impl fmt::Display for Regularization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the usual spellings of a boolean on the command line.
pub fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "yes" | "true" | "t" | "y" | "1" => Ok(true),
        "no" | "false" | "f" | "n" | "0" => Ok(false),
        _ => Err(format!("Boolean value expected, got '{value}'")),
    }
}

#[derive(Clone, Debug, Args)]
pub struct LaunchConfig {
    /// Scene data path (COLMAP or nerfstudio layout).
    #[arg(short, long, alias = "scene_path", help_heading = "Data options")]
    pub scene_path: PathBuf,

    /// Output directory. Defaults to output/<scene name>.
    #[arg(short, long, alias = "output_dir", help_heading = "Data options")]
    pub output_dir: Option<PathBuf>,

    /// Vanilla 3DGS checkpoint to start from.
    ///
    /// When omitted, output/vanilla_gs/<scene name> is used and trained first
    /// if it doesn't contain a finished run yet.
    #[arg(short, long, alias = "checkpoint_path", help_heading = "Data options")]
    pub checkpoint_path: Option<PathBuf>,

    /// Regularization method.
    #[arg(
        short,
        long,
        value_enum,
        help_heading = "Regularization options",
        default_value = "dn_consistency"
    )]
    pub regularization: Regularization,

    /// Weight of the estimation loss (density family only).
    #[arg(
        short,
        long,
        alias = "estimation_factor",
        help_heading = "Regularization options",
        default_value = "0.2"
    )]
    pub estimation_factor: f32,

    /// Weight of the normal loss (density family only).
    #[arg(
        short,
        long,
        alias = "normal_factor",
        help_heading = "Regularization options",
        default_value = "0.2"
    )]
    pub normal_factor: f32,

    /// Number of training iterations.
    #[arg(
        short,
        long,
        help_heading = "Training options",
        default_value = "15000",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub iterations: u32,

    /// Hold out an eval split.
    #[arg(
        long,
        help_heading = "Training options",
        default_value = "true",
        value_parser = parse_bool,
        action = ArgAction::Set
    )]
    pub eval: bool,

    /// Use a white background instead of black.
    #[arg(
        long,
        alias = "white_background",
        help_heading = "Training options",
        default_value = "false",
        value_parser = parse_bool,
        action = ArgAction::Set
    )]
    pub white_background: bool,

    /// GPU device index.
    #[arg(long, help_heading = "Training options", default_value = "0")]
    pub gpu: u32,

    /// Fast mode: train for 7000 iterations without an eval split.
    #[arg(long, alias = "fast_mode", help_heading = "Training options")]
    pub fast_mode: bool,
}

impl LaunchConfig {
    /// Config with every optional field at its command line default.
    pub fn new(scene_path: impl Into<PathBuf>) -> Self {
        Self {
            scene_path: scene_path.into(),
            output_dir: None,
            checkpoint_path: None,
            regularization: Regularization::DnConsistency,
            estimation_factor: 0.2,
            normal_factor: 0.2,
            iterations: DEFAULT_ITERATIONS,
            eval: true,
            white_background: false,
            gpu: 0,
            fast_mode: false,
        }
    }

    /// Fast mode overrides whatever was asked for.
    pub fn apply_fast_mode(&mut self) {
        if self.fast_mode {
            self.iterations = FAST_MODE_ITERATIONS;
            self.eval = false;
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct LauncherSettings {
    /// Python interpreter used to run the training scripts.
    #[arg(long, help_heading = "Launcher options", default_value = "python")]
    pub python: String,

    /// Vanilla 3DGS training script.
    #[arg(
        long,
        help_heading = "Launcher options",
        default_value = "./gaussian_splatting/train.py"
    )]
    pub gs_train_script: PathBuf,

    /// Directory holding the SuGaR coarse training scripts.
    #[arg(long, help_heading = "Launcher options", default_value = ".")]
    pub sugar_root: PathBuf,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            python: "python".to_owned(),
            gs_train_script: PathBuf::from("./gaussian_splatting/train.py"),
            sugar_root: PathBuf::from("."),
        }
    }
}
