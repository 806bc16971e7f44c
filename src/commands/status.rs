use anyhow::Result;
use std::env;

use crate::commands::CommandReport;
use crate::digest::cache::{self, CacheLookup};
use crate::digest::config::{load_config, resolve_config_path};
use crate::digest::known_users;
use crate::digest::paths::resolve_paths;
use crate::digest::pipeline::list_inputs;

include!(concat!(env!("OUT_DIR"), "/event_digest_env_allowlist.rs"));

fn env_keys_set() -> Vec<&'static str> {
    GENERATED_EVENT_DIGEST_ENV_ALLOWLIST
        .iter()
        .copied()
        .filter(|key| env::var_os(key).is_some())
        .collect()
}

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("events_dir={}", paths.events_dir.display()));
    report.detail(format!("summary_file={}", paths.summary_file.display()));
    report.detail(format!("users_file={}", paths.users_file.display()));
    if let Some(path) = resolve_config_path() {
        report.detail(format!("config_file={}", path.display()));
    }
    report.detail(format!(
        "stream.read_buffer_bytes={}",
        cfg.stream.read_buffer_bytes
    ));
    report.detail(format!(
        "cache.on_incomplete={}",
        cfg.cache.on_incomplete.as_str()
    ));
    report.detail(format!("env.set={}", env_keys_set().join(",")));

    if !paths.events_dir.is_dir() {
        report.issue(format!(
            "events dir does not exist: {}",
            paths.events_dir.display()
        ));
        return Ok(report);
    }

    let inputs = list_inputs(&paths.events_dir)?;
    let (mut cached, mut pending) = (0usize, 0usize);
    for input in &inputs {
        match cache::lookup(input)? {
            CacheLookup::Hit(_) => cached += 1,
            CacheLookup::Miss => pending += 1,
            CacheLookup::Incomplete { reason } => report.issue(format!(
                "incomplete cache artifact {}: {reason}",
                cache::artifact_path(input).display()
            )),
        }
    }
    report.detail(format!("files={}", inputs.len()));
    report.detail(format!("files.cached={cached}"));
    report.detail(format!("files.pending={pending}"));

    if paths.users_file.exists() {
        let users = known_users::load(&paths.users_file)?;
        report.detail(format!("users.known={}", users.len()));
    } else {
        report.detail("users.known=0 (file absent)");
    }
    report.detail(format!("summary.present={}", paths.summary_file.exists()));

    Ok(report)
}
