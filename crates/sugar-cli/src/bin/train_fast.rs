use std::process::ExitCode;

use clap::Parser;
use sugar_cli::{ui, Cli};
use sugar_launch::{Launcher, ScriptTrainer, ShellRunner};

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::init();

    let working_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            log::error!("Can't determine the working directory: {e}");
            return ExitCode::FAILURE;
        }
    };

    let trainer = ScriptTrainer::new(
        cli.settings.python.clone(),
        cli.settings.sugar_root.clone(),
        working_dir.clone(),
    );
    let mut launcher = Launcher::new(working_dir, cli.settings, ShellRunner, trainer);

    match launcher.launch_with(cli.launch, |msg| ui::print_message(&msg)) {
        Ok(summary) => {
            ui::print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(error) => {
            ui::print_error(error);
            ExitCode::from(1)
        }
    }
}
