use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Serialize;
use thiserror::Error;

use crate::{
    config::{LaunchConfig, LauncherSettings, Regularization},
    paths,
    prerequisite::{PrerequisiteCommand, PrerequisiteRunner},
    trainer::{CoarseTrainer, DensityTrainArgs, SdfTrainArgs},
};

/// Name of the argument record written next to the coarse training output.
pub const TRAIN_ARGS_FILE: &str = "coarse_train_args.json";

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Scene path {} is not a directory", .0.display())]
    MissingScene(PathBuf),

    #[error("Can't derive a scene name from {}", .0.display())]
    SceneName(PathBuf),

    #[error("Path {} is not valid UTF-8", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("Vanilla 3DGS training failed ({status}). Check the errors above and retry.\n  command: {command}")]
    PrerequisiteFailed { command: String, status: String },

    #[error("Coarse training failed")]
    Trainer(#[source] anyhow::Error),
}

fn io_error(context: impl Into<String>) -> impl FnOnce(io::Error) -> LaunchError {
    let context = context.into();
    move |source| LaunchError::Io { context, source }
}

/// Progress of a launch, in the order it happens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LaunchMessage {
    /// Paths and settings are final, fast mode already applied.
    Resolved {
        scene_path: PathBuf,
        output_dir: PathBuf,
        regularization: Regularization,
        iterations: u32,
        fast_mode: bool,
    },
    /// A vanilla 3DGS checkpoint was already there.
    CheckpointFound { dir: PathBuf },
    /// About to train the vanilla 3DGS checkpoint. Blocks until done.
    TrainingCheckpoint {
        dir: PathBuf,
        iterations: u32,
        command: String,
    },
    CheckpointTrained { dir: PathBuf },
    /// About to run coarse training from this checkpoint.
    CoarseTraining {
        checkpoint_dir: PathBuf,
        regularization: Regularization,
    },
}

/// Where a finished launch left its results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchSummary {
    pub scene_path: PathBuf,
    pub output_dir: PathBuf,
    pub checkpoint_dir: PathBuf,
    pub regularization: Regularization,
    pub iterations: u32,
    /// Whether the vanilla 3DGS checkpoint was trained during this launch.
    pub trained_prerequisite: bool,
}

pub struct Launcher<R, T> {
    working_dir: PathBuf,
    settings: LauncherSettings,
    runner: R,
    trainer: T,
}

impl<R: PrerequisiteRunner, T: CoarseTrainer> Launcher<R, T> {
    /// Relative paths in a launch config are taken relative to `working_dir`.
    pub fn new(working_dir: PathBuf, settings: LauncherSettings, runner: R, trainer: T) -> Self {
        Self {
            working_dir,
            settings,
            runner,
            trainer,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn trainer(&self) -> &T {
        &self.trainer
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.working_dir.join(path)
    }

    fn scene_name(&self, scene_path: &Path) -> Result<String, LaunchError> {
        if let Some(name) = paths::scene_name(scene_path) {
            return Ok(name);
        }
        // Paths like `.` or `..` only have a name once resolved.
        fs::canonicalize(self.resolve(scene_path))
            .ok()
            .as_deref()
            .and_then(paths::scene_name)
            .ok_or_else(|| LaunchError::SceneName(scene_path.to_path_buf()))
    }

    /// Make sure a vanilla 3DGS checkpoint exists, training one if needed.
    ///
    /// Returns the checkpoint directory and whether it was trained now.
    fn ensure_checkpoint(
        &mut self,
        config: &LaunchConfig,
        scene_name: &str,
        on_message: &mut impl FnMut(LaunchMessage),
    ) -> Result<(PathBuf, bool), LaunchError> {
        if let Some(checkpoint) = &config.checkpoint_path {
            log::info!("Using provided checkpoint {}", checkpoint.display());
            return Ok((checkpoint.clone(), false));
        }

        let checkpoint_dir = paths::default_checkpoint_dir(scene_name);
        let resolved = self.resolve(&checkpoint_dir);

        if resolved.join(paths::CHECKPOINT_MARKER).exists() {
            on_message(LaunchMessage::CheckpointFound {
                dir: checkpoint_dir.clone(),
            });
            return Ok((checkpoint_dir, false));
        }

        fs::create_dir_all(&resolved).map_err(io_error(format!(
            "Failed to create checkpoint directory {}",
            resolved.display()
        )))?;

        let command = PrerequisiteCommand {
            gpu: config.gpu,
            python: self.settings.python.clone(),
            script: self.settings.gs_train_script.clone(),
            scene_path: config.scene_path.clone(),
            model_dir: checkpoint_dir.clone(),
            white_background: config.white_background,
            iterations: config.iterations,
        };
        on_message(LaunchMessage::TrainingCheckpoint {
            dir: checkpoint_dir.clone(),
            iterations: config.iterations,
            command: command.shell_line(),
        });

        let code = self
            .runner
            .run(&command, &self.working_dir)
            .map_err(io_error(format!(
                "Failed to run vanilla 3DGS training: {}",
                command.shell_line()
            )))?;

        match code {
            Some(0) => {
                on_message(LaunchMessage::CheckpointTrained {
                    dir: checkpoint_dir.clone(),
                });
                Ok((checkpoint_dir, true))
            }
            code => Err(LaunchError::PrerequisiteFailed {
                command: command.shell_line(),
                status: code.map_or_else(
                    || "terminated by signal".to_owned(),
                    |code| format!("exit code {code}"),
                ),
            }),
        }
    }

    fn write_train_args(&self, output_dir: &Path, args: &impl Serialize) -> Result<(), LaunchError> {
        let dir = self.resolve(output_dir);
        fs::create_dir_all(&dir)
            .map_err(io_error(format!("Failed to create {}", dir.display())))?;

        let path = dir.join(TRAIN_ARGS_FILE);
        let json = serde_json::to_vec_pretty(args)
            .map_err(|e| io_error("Failed to serialize training arguments")(e.into()))?;
        fs::write(&path, json).map_err(io_error(format!("Failed to write {}", path.display())))
    }

    /// [`Launcher::launch_with`], ignoring progress.
    pub fn launch(&mut self, config: LaunchConfig) -> Result<LaunchSummary, LaunchError> {
        self.launch_with(config, |_| {})
    }

    /// Resolve paths, make sure the vanilla checkpoint exists and run coarse training.
    pub fn launch_with(
        &mut self,
        config: LaunchConfig,
        mut on_message: impl FnMut(LaunchMessage),
    ) -> Result<LaunchSummary, LaunchError> {
        let mut config = config;

        // Everything below ends up in a shell line or a JSON record.
        let user_paths = [
            Some(&config.scene_path),
            config.output_dir.as_ref(),
            config.checkpoint_path.as_ref(),
            Some(&self.settings.gs_train_script),
        ];
        if let Some(path) = user_paths.into_iter().flatten().find(|p| p.to_str().is_none()) {
            return Err(LaunchError::NonUtf8Path(path.clone()));
        }

        if !self.resolve(&config.scene_path).is_dir() {
            return Err(LaunchError::MissingScene(config.scene_path));
        }
        if !paths::looks_like_scene(&self.resolve(&config.scene_path)) {
            log::warn!(
                "{} has no COLMAP or nerfstudio data that we recognise",
                config.scene_path.display()
            );
        }

        let scene_name = self.scene_name(&config.scene_path)?;
        let output_dir = config
            .output_dir
            .clone()
            .unwrap_or_else(|| paths::default_output_dir(&scene_name));

        config.apply_fast_mode();
        on_message(LaunchMessage::Resolved {
            scene_path: config.scene_path.clone(),
            output_dir: output_dir.clone(),
            regularization: config.regularization,
            iterations: config.iterations,
            fast_mode: config.fast_mode,
        });

        let (checkpoint_dir, trained_prerequisite) =
            self.ensure_checkpoint(&config, &scene_name, &mut on_message)?;
        let checkpoint_dir = paths::with_trailing_separator(checkpoint_dir);

        log::info!(
            "Coarse training of {} with {} regularization",
            config.scene_path.display(),
            config.regularization
        );
        on_message(LaunchMessage::CoarseTraining {
            checkpoint_dir: checkpoint_dir.clone(),
            regularization: config.regularization,
        });

        if config.regularization.uses_density_trainer() {
            let args = DensityTrainArgs {
                scene_path: config.scene_path.clone(),
                checkpoint_path: checkpoint_dir.clone(),
                output_dir: output_dir.clone(),
                iteration_to_load: config.iterations,
                num_iterations: config.iterations,
                eval: config.eval,
                white_background: config.white_background,
                estimation_factor: config.estimation_factor,
                normal_factor: config.normal_factor,
                gpu: config.gpu,
            };
            self.write_train_args(&output_dir, &args)?;
            self.trainer
                .train_density(args)
                .map_err(LaunchError::Trainer)?;
        } else {
            let args = SdfTrainArgs {
                scene_path: config.scene_path.clone(),
                checkpoint_path: checkpoint_dir.clone(),
                output_dir: output_dir.clone(),
                iteration_to_load: config.iterations,
                num_iterations: config.iterations,
                eval: config.eval,
                white_background: config.white_background,
                gpu: config.gpu,
            };
            self.write_train_args(&output_dir, &args)?;
            self.trainer.train_sdf(args).map_err(LaunchError::Trainer)?;
        }

        Ok(LaunchSummary {
            scene_path: config.scene_path,
            output_dir,
            checkpoint_dir,
            regularization: config.regularization,
            iterations: config.iterations,
            trained_prerequisite,
        })
    }
}
