//! `warden status` — print the last-run summary from `ai_status.md`.

use crate::cli::StatusArgs;
use crate::report::read_ai_status;
use crate::utils::paths::canonicalize_safe;

pub async fn run(args: StatusArgs) -> anyhow::Result<i32> {
    let root = canonicalize_safe(&args.path);
    print!("{}", read_ai_status(&root).await);
    Ok(0)
}
