use std::{
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, Result};
use serde::Serialize;

/// Arguments for coarse training with density regularization.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DensityTrainArgs {
    pub scene_path: PathBuf,
    /// Vanilla 3DGS checkpoint directory, always ending in a separator.
    pub checkpoint_path: PathBuf,
    pub output_dir: PathBuf,
    pub iteration_to_load: u32,
    pub num_iterations: u32,
    pub eval: bool,
    pub white_background: bool,
    pub estimation_factor: f32,
    pub normal_factor: f32,
    pub gpu: u32,
}

/// Arguments for coarse training with SDF regularization. Takes no loss factors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SdfTrainArgs {
    pub scene_path: PathBuf,
    /// Vanilla 3DGS checkpoint directory, always ending in a separator.
    pub checkpoint_path: PathBuf,
    pub output_dir: PathBuf,
    pub iteration_to_load: u32,
    pub num_iterations: u32,
    pub eval: bool,
    pub white_background: bool,
    pub gpu: u32,
}

/// The two coarse training entry points. Both block until training is done.
pub trait CoarseTrainer {
    fn train_density(&mut self, args: DensityTrainArgs) -> Result<()>;
    fn train_sdf(&mut self, args: SdfTrainArgs) -> Result<()>;
}

/// A python function taking a single namespace of training arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryPoint {
    pub module: &'static str,
    pub function: &'static str,
}

pub const DENSITY_ENTRY: EntryPoint = EntryPoint {
    module: "sugar_trainers.coarse_density",
    function: "coarse_training_with_density_regularization",
};

pub const SDF_ENTRY: EntryPoint = EntryPoint {
    module: "sugar_trainers.coarse_sdf",
    function: "coarse_training_with_sdf_regularization",
};

// argv: module, function, JSON object of arguments.
const BOOTSTRAP: &str = "\
import importlib, json, sys, types
module, function, record = sys.argv[1:4]
args = types.SimpleNamespace(**json.loads(record))
getattr(importlib.import_module(module), function)(args)
";

/// Calls the SuGaR coarse trainers in a python interpreter started from the SuGaR root.
#[derive(Clone, Debug)]
pub struct ScriptTrainer {
    python: String,
    sugar_root: PathBuf,
    working_dir: PathBuf,
}

impl ScriptTrainer {
    /// A relative `sugar_root` is taken relative to `working_dir`, as are the
    /// paths in the training arguments.
    pub fn new(python: String, sugar_root: PathBuf, working_dir: PathBuf) -> Self {
        Self {
            python,
            sugar_root,
            working_dir,
        }
    }

    // The interpreter runs from the SuGaR root, so relative paths would point
    // somewhere else.
    fn rebase(&self, paths: [&mut PathBuf; 3]) {
        for path in paths {
            *path = self.working_dir.join(&*path);
        }
    }

    fn command(&self, entry: EntryPoint, args: &impl Serialize) -> Result<Command> {
        let record =
            serde_json::to_string(args).context("Failed to serialize training arguments")?;

        let mut command = Command::new(&self.python);
        command
            .arg("-c")
            .arg(BOOTSTRAP)
            .arg(entry.module)
            .arg(entry.function)
            .arg(record)
            .current_dir(self.working_dir.join(&self.sugar_root));
        Ok(command)
    }

    fn run_entry(&self, entry: EntryPoint, args: &impl Serialize) -> Result<()> {
        let mut command = self.command(entry, args)?;
        log::info!(
            "Calling {}.{} from {}",
            entry.module,
            entry.function,
            self.sugar_root.display()
        );

        let status = command
            .status()
            .with_context(|| format!("Failed to start {}", self.python))?;
        if !status.success() {
            anyhow::bail!("{} failed ({status})", entry.function);
        }
        Ok(())
    }
}

impl CoarseTrainer for ScriptTrainer {
    fn train_density(&mut self, mut args: DensityTrainArgs) -> Result<()> {
        self.rebase([
            &mut args.scene_path,
            &mut args.checkpoint_path,
            &mut args.output_dir,
        ]);
        self.run_entry(DENSITY_ENTRY, &args)
    }

    fn train_sdf(&mut self, mut args: SdfTrainArgs) -> Result<()> {
        self.rebase([
            &mut args.scene_path,
            &mut args.checkpoint_path,
            &mut args.output_dir,
        ]);
        self.run_entry(SDF_ENTRY, &args)
    }
}
