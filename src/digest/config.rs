use crate::digest::stream::DEFAULT_READ_BUFFER_BYTES;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How the cache gate treats an artifact that exists but holds no valid digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncompletePolicy {
    #[default]
    Recompute,
    Fail,
}

impl IncompletePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recompute => "recompute",
            Self::Fail => "fail",
        }
    }
}

impl FromStr for IncompletePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "recompute" => Ok(Self::Recompute),
            "fail" => Ok(Self::Fail),
            other => Err(anyhow!(
                "invalid incomplete-cache policy `{other}`: use `recompute` or `fail`"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub read_buffer_bytes: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            read_buffer_bytes: DEFAULT_READ_BUFFER_BYTES,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub on_incomplete: IncompletePolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DigestConfig {
    pub stream: StreamConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PartialDigestConfig {
    stream: Option<StreamConfig>,
    cache: Option<CacheConfig>,
}

fn env_or_usize(var: &str, fallback: usize) -> usize {
    match env::var(var) {
        Ok(v) => v.trim().parse::<usize>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_policy(var: &str, fallback: IncompletePolicy) -> Result<IncompletePolicy> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.parse(),
        _ => Ok(fallback),
    }
}

fn validate(cfg: &DigestConfig) -> Result<()> {
    if cfg.stream.read_buffer_bytes == 0 {
        return Err(anyhow!("invalid read buffer size: must be >= 1 byte"));
    }
    Ok(())
}

pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("EVENT_DIGEST_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let home = dirs::home_dir()?;
    Some(home.join(".event-digest").join("digest.toml"))
}

fn merge_file_config(base: &mut DigestConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    merge_file_config_at(base, &path)
}

fn merge_file_config_at(base: &mut DigestConfig, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read digest config {}", path.display()))?;
    let parsed = parse_file_config(&raw)
        .map_err(|err| anyhow!("failed to parse digest config {}: {err}", path.display()))?;
    if let Some(stream) = parsed.stream {
        base.stream = stream;
    }
    if let Some(cache) = parsed.cache {
        base.cache = cache;
    }
    Ok(())
}

fn parse_file_config(raw: &str) -> Result<PartialDigestConfig, toml::de::Error> {
    toml::from_str(raw)
}

pub fn load_config() -> Result<DigestConfig> {
    let mut cfg = DigestConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.stream.read_buffer_bytes = env_or_usize(
        "EVENT_DIGEST_READ_BUFFER_BYTES",
        cfg.stream.read_buffer_bytes,
    );
    cfg.cache.on_incomplete = env_or_policy("EVENT_DIGEST_ON_INCOMPLETE", cfg.cache.on_incomplete)?;

    validate(&cfg)?;
    Ok(cfg)
}
