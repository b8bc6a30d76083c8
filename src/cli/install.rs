//! `warden install` — install frame bundles declared in config.

use crate::cli::InstallArgs;
use crate::config::Config;
use crate::installer::install_frames;
use crate::utils::paths::canonicalize_safe;

pub async fn run(args: InstallArgs, quiet: bool) -> anyhow::Result<i32> {
    let root = canonicalize_safe(&args.path);
    let config = Config::load(&root)?;

    if config.frames.install.is_empty() {
        if !quiet {
            println!("no frames declared under frames.install");
        }
        return Ok(0);
    }

    let summary = install_frames(&root, &config.frames.install, args.force_update)?;
    if !quiet {
        for name in &summary.installed {
            println!("installed: {}", name);
        }
        for name in &summary.up_to_date {
            println!("up to date: {}", name);
        }
        for name in &summary.failed {
            eprintln!("failed: {}", name);
        }
    }

    Ok(if summary.failed.is_empty() { 0 } else { 2 })
}
