use crate::digest::config::IncompletePolicy;
use crate::digest::model::Digest;
use crate::digest::stream::digest_archive;
use crate::digest::users::UsernameSet;
use crate::digest::warn::{self, WarnEvent};
use crate::error::{DigestError, DigestResult, Stage};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const ARTIFACT_SUFFIX: &str = ".digest.json";

/// What an existing (or absent) cache artifact holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(Digest),
    /// The artifact exists but is empty or undecodable, typically because a
    /// previous run stopped between claiming and populating it.
    Incomplete { reason: String },
    Miss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestSource {
    Fresh,
    Cached,
    Recomputed,
}

impl DigestSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fresh => "computed",
            Self::Cached => "cached",
            Self::Recomputed => "recomputed",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    pub read_buffer_bytes: usize,
    pub on_incomplete: IncompletePolicy,
}

pub fn artifact_path(input: &Path) -> PathBuf {
    let mut raw = input.as_os_str().to_owned();
    raw.push(ARTIFACT_SUFFIX);
    PathBuf::from(raw)
}

fn classify(raw: &str) -> CacheLookup {
    if raw.trim().is_empty() {
        return CacheLookup::Incomplete {
            reason: "artifact is empty".to_string(),
        };
    }
    match serde_json::from_str::<Digest>(raw) {
        Ok(digest) => CacheLookup::Hit(digest),
        Err(err) => CacheLookup::Incomplete {
            reason: format!("artifact does not decode: {err}"),
        },
    }
}

/// Inspect the cache artifact of `input` without claiming it.
pub fn lookup(input: &Path) -> DigestResult<CacheLookup> {
    let artifact = artifact_path(input);
    match fs::read_to_string(&artifact) {
        Ok(raw) => Ok(classify(&raw)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(CacheLookup::Miss),
        Err(err) => Err(DigestError::io(Stage::ReadCache, &artifact, err)),
    }
}

fn compute(input: &Path, users: &mut UsernameSet, opts: &CacheOptions) -> DigestResult<Digest> {
    let mut file = File::open(input).map_err(|err| DigestError::io(Stage::OpenInput, input, err))?;
    digest_archive(input, &mut file, users, opts.read_buffer_bytes)
}

fn encode(artifact: &Path, digest: &Digest) -> DigestResult<String> {
    let data = serde_json::to_string(digest)
        .map_err(|err| DigestError::json(Stage::WriteCache, artifact, err))?;
    Ok(format!("{data}\n"))
}

fn populate(artifact: &Path, mut file: File, digest: &Digest) -> DigestResult<()> {
    let data = encode(artifact, digest)?;
    file.write_all(data.as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(|err| DigestError::io(Stage::WriteCache, artifact, err))
}

fn replace(artifact: &Path, digest: &Digest) -> DigestResult<()> {
    let data = encode(artifact, digest)?;
    let dir = artifact
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|err| DigestError::io(Stage::WriteCache, artifact, err))?;
    tmp.write_all(data.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|err| DigestError::io(Stage::WriteCache, artifact, err))?;
    tmp.persist(artifact)
        .map_err(|err| DigestError::io(Stage::WriteCache, artifact, err.error))?;
    Ok(())
}

/// Return the digest of `input`, from its cache artifact when one exists.
///
/// The artifact is claimed with exclusive creation. On a valid hit the input
/// is not read at all, so its usernames are not extracted again; only a fresh
/// or recomputed digest feeds `users`.
pub fn compute_or_fetch(
    input: &Path,
    users: &mut UsernameSet,
    opts: &CacheOptions,
) -> DigestResult<(Digest, DigestSource)> {
    let artifact = artifact_path(input);
    let claimed = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&artifact);

    match claimed {
        Ok(file) => {
            let digest = compute(input, users, opts)?;
            populate(&artifact, file, &digest)?;
            Ok((digest, DigestSource::Fresh))
        }
        Err(err) if err.kind() == ErrorKind::AlreadyExists => match lookup(input)? {
            CacheLookup::Hit(digest) => Ok((digest, DigestSource::Cached)),
            CacheLookup::Incomplete { reason } => match opts.on_incomplete {
                IncompletePolicy::Fail => Err(DigestError::IncompleteCache {
                    path: artifact,
                    reason,
                }),
                IncompletePolicy::Recompute => {
                    warn::emit(WarnEvent {
                        code: "CACHE_INCOMPLETE",
                        stage: Stage::ReadCache.as_str(),
                        path: &artifact.display().to_string(),
                        action: "recompute",
                        reason: &reason,
                        err: "na",
                    });
                    let digest = compute(input, users, opts)?;
                    replace(&artifact, &digest)?;
                    Ok((digest, DigestSource::Recomputed))
                }
            },
            // Removed between the failed create and the read.
            CacheLookup::Miss => Err(DigestError::io(
                Stage::ReadCache,
                &artifact,
                std::io::Error::new(ErrorKind::NotFound, "artifact vanished after claim failed"),
            )),
        },
        Err(err) => Err(DigestError::io(Stage::ClaimCache, &artifact, err)),
    }
}
