use anyhow::Result;

use crate::commands::CommandReport;
use crate::digest::config::load_config;
use crate::digest::paths::resolve_paths;
use crate::digest::pipeline;

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config()?;
    let mut report = CommandReport::new("run");

    report.detail(format!("events_dir={}", paths.events_dir.display()));
    report.detail(format!("summary_file={}", paths.summary_file.display()));
    report.detail(format!("users_file={}", paths.users_file.display()));
    report.detail(format!(
        "cache.on_incomplete={}",
        cfg.cache.on_incomplete.as_str()
    ));

    if !paths.events_dir.is_dir() {
        report.issue(format!(
            "events dir does not exist: {}",
            paths.events_dir.display()
        ));
        return Ok(report);
    }

    let outcome = pipeline::run(&paths, &cfg)?;
    report.detail(format!("files={}", outcome.files));
    report.detail(format!("files.computed={}", outcome.fresh));
    report.detail(format!("files.cached={}", outcome.cached));
    report.detail(format!("files.recomputed={}", outcome.recomputed));
    report.detail(format!("events={}", outcome.total_events));
    report.detail(format!("users.known_before={}", outcome.known_users_before));
    report.detail(format!("users.new={}", outcome.new_users));

    Ok(report)
}
