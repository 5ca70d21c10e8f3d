use sugar_launch::{LaunchError, LaunchMessage, LaunchSummary};

const RULE: &str = "======================================================================";

pub fn print_message(message: &LaunchMessage) {
    match message {
        LaunchMessage::Resolved {
            scene_path,
            output_dir,
            regularization,
            iterations,
            fast_mode,
        } => {
            if *fast_mode {
                println!("🚀 Fast mode enabled!");
                println!("  - iterations reduced to {iterations}");
                println!("  - eval split disabled");
            }
            println!("{RULE}");
            println!("SuGaR fast training (no mesh extraction)");
            println!("{RULE}");
            println!("Scene path:     {}", scene_path.display());
            println!("Output dir:     {}", output_dir.display());
            println!("Regularization: {regularization}");
            println!("Iterations:     {iterations}");
            println!("Fast mode:      {}", if *fast_mode { "yes" } else { "no" });
            println!("{RULE}");
            println!();
        }
        LaunchMessage::CheckpointFound { dir } => {
            println!("✅ Found existing vanilla 3DGS checkpoint: {}", dir.display());
        }
        LaunchMessage::TrainingCheckpoint {
            dir,
            iterations,
            command,
        } => {
            println!("📦 No vanilla 3DGS checkpoint found, training one...");
            println!("   output dir: {}", dir.display());
            println!("   iterations: {iterations}");
            println!();
            println!("Running:");
            println!("{command}");
            println!();
        }
        LaunchMessage::CheckpointTrained { .. } => {
            println!();
            println!("✅ Vanilla 3DGS training done!");
        }
        LaunchMessage::CoarseTraining {
            checkpoint_dir,
            regularization,
        } => {
            println!();
            println!("Using vanilla 3DGS checkpoint: {}", checkpoint_dir.display());
            println!();
            if regularization.uses_density_trainer() {
                println!("Training with density regularization...");
            } else {
                println!("Training with SDF regularization...");
            }
        }
    }
}

pub fn print_summary(summary: &LaunchSummary) {
    let out = summary.output_dir.display();

    println!();
    println!("{RULE}");
    println!("✅ Training done!");
    println!("{RULE}");
    println!();
    println!("Output files:");
    println!("  - Checkpoints: {out}/");
    println!("  - Point cloud: {out}/point_cloud/");
    println!();
    println!("Next steps:");
    println!("  1. Open the SuGaR viewer:");
    println!("     python run_viewer.py -p {out}/");
    println!();
    println!("  2. Or run the full pipeline to extract a mesh:");
    println!(
        "     python train_full_pipeline.py -s {} -r {} --gs_output_dir {out}",
        summary.scene_path.display(),
        summary.regularization
    );
    println!();
}

pub fn print_error(error: LaunchError) {
    let prerequisite = matches!(error, LaunchError::PrerequisiteFailed { .. });
    let error = anyhow::Error::new(error);
    println!();
    println!("❌ {error:#}");
    if prerequisite {
        println!("The coarse training needs a vanilla 3DGS checkpoint, pass one with --checkpoint-path or fix the run above.");
    }
}
