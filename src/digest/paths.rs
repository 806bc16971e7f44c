use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DigestPaths {
    pub events_dir: PathBuf,
    pub summary_file: PathBuf,
    pub users_file: PathBuf,
}

fn env_path(var: &str) -> Option<PathBuf> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(PathBuf::from(v.trim())),
        _ => None,
    }
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    env_path(var).unwrap_or(fallback)
}

pub fn resolve_paths() -> Result<DigestPaths> {
    let events_dir = match env_path("EVENT_DIGEST_EVENTS_DIR").or_else(|| env_path("GHC_EVENTS_PATH")) {
        Some(dir) => dir,
        None => env::current_dir().context("current directory could not be resolved")?,
    };

    let summary_file = env_or_default_path("EVENT_DIGEST_SUMMARY_FILE", events_dir.join("summary.json"));
    let users_file = env_or_default_path("EVENT_DIGEST_USERS_FILE", events_dir.join("users.txt"));

    Ok(DigestPaths {
        events_dir,
        summary_file,
        users_file,
    })
}
