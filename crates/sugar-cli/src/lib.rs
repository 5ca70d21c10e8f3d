pub mod ui;

use clap::Parser;
use sugar_launch::{LaunchConfig, LauncherSettings};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "SuGaR fast training - coarse training only, no mesh extraction"
)]
pub struct Cli {
    #[clap(flatten)]
    pub launch: LaunchConfig,

    #[clap(flatten)]
    pub settings: LauncherSettings,
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::CommandFactory;
    use sugar_launch::Regularization;

    use super::*;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["sugar_train_fast", "-s", "data/room"]).expect("valid args");
        let launch = cli.launch;
        assert_eq!(launch.scene_path, Path::new("data/room"));
        assert_eq!(launch.output_dir, None);
        assert_eq!(launch.checkpoint_path, None);
        assert_eq!(launch.regularization, Regularization::DnConsistency);
        assert_eq!(launch.iterations, 15000);
        assert!(launch.eval);
        assert!(!launch.white_background);
        assert_eq!((launch.estimation_factor, launch.normal_factor), (0.2, 0.2));
        assert_eq!(launch.gpu, 0);
        assert!(!launch.fast_mode);
        assert_eq!(cli.settings.python, "python");
    }

    #[test]
    fn original_spellings() {
        let cli = Cli::try_parse_from([
            "sugar_train_fast",
            "--scene_path",
            "data/room",
            "--output_dir",
            "out",
            "-r",
            "consistency",
            "--eval",
            "no",
            "--white_background",
            "yes",
            "--fast_mode",
            "-i",
            "3000",
            "-e",
            "0.5",
            "--gpu",
            "1",
        ])
        .expect("valid args");
        let launch = cli.launch;
        assert_eq!(launch.output_dir.as_deref(), Some(Path::new("out")));
        assert_eq!(launch.regularization, Regularization::DnConsistency);
        assert!(!launch.eval);
        assert!(launch.white_background);
        assert!(launch.fast_mode);
        assert_eq!(launch.iterations, 3000);
        assert_eq!(launch.estimation_factor, 0.5);
        assert_eq!(launch.gpu, 1);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Cli::try_parse_from(["sugar_train_fast"]).is_err());
        assert!(Cli::try_parse_from(["sugar_train_fast", "-s", "x", "-r", "mesh"]).is_err());
        assert!(Cli::try_parse_from(["sugar_train_fast", "-s", "x", "-i", "0"]).is_err());
        assert!(Cli::try_parse_from(["sugar_train_fast", "-s", "x", "--eval", "maybe"]).is_err());
    }
}
