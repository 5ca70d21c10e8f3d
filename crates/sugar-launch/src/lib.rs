//! Launches SuGaR coarse training, training the vanilla 3DGS checkpoint it
//! starts from when there isn't one yet.

pub mod config;
pub mod launch;
pub mod paths;
pub mod prerequisite;
pub mod trainer;


pub use config::{LaunchConfig, LauncherSettings, Regularization};
pub use launch::{LaunchError, LaunchMessage, LaunchSummary, Launcher};
pub use prerequisite::{PrerequisiteCommand, PrerequisiteRunner, ShellRunner};
pub use trainer::{CoarseTrainer, DensityTrainArgs, ScriptTrainer, SdfTrainArgs};
