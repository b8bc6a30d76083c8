//! `warden frames` — list registered frames in execution order.

use crate::cli::FramesArgs;
use crate::config::RulesFile;
use crate::frames::FrameRegistry;
use crate::utils::paths::canonicalize_safe;

pub async fn run(args: FramesArgs) -> anyhow::Result<i32> {
    let root = canonicalize_safe(&args.path);
    let rules = RulesFile::load(&root).unwrap_or_default();
    let registry = FrameRegistry::with_builtins(&root, &rules);

    println!(
        "{:<14} {:<16} {:<16} {:<10} {:<8}",
        "ID", "NAME", "PHASE", "PRIORITY", "BLOCKER"
    );
    for frame in registry.ordered(&[]) {
        let metadata = frame.metadata();
        println!(
            "{:<14} {:<16} {:<16} {:<10} {:<8}",
            metadata.id,
            metadata.name,
            metadata.phase.as_str(),
            metadata.priority.as_str(),
            if metadata.is_blocker { "yes" } else { "no" },
        );
    }
    Ok(0)
}
