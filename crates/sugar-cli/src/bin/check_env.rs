use std::path::PathBuf;

use sugar_doctor::{report, EnvExpectations};

// Purely informational: always exits successfully, whatever the checks found.
fn main() {
    env_logger::init();

    let expect = EnvExpectations::from_env();
    let working_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to initialize tokio runtime: {e}");
            return;
        }
    };

    println!("{}", report::render_banner());

    let reports = runtime.block_on(sugar_doctor::run_checks(
        &expect,
        &working_dir,
        |index, check| println!("{}", report::render_section(index, check)),
    ));

    println!("{}", report::render_summary(&expect, &reports));
}
