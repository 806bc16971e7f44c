use crate::digest::cache::{self, CacheOptions, DigestSource};
use crate::digest::config::DigestConfig;
use crate::digest::known_users;
use crate::digest::model::Digest;
use crate::digest::paths::DigestPaths;
use crate::digest::summary;
use crate::error::{DigestError, DigestResult, Stage};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const INPUT_SUFFIX: &str = ".json.gz";

#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub files: usize,
    pub fresh: usize,
    pub cached: usize,
    pub recomputed: usize,
    pub known_users_before: usize,
    pub new_users: usize,
    pub total_events: u64,
    pub digests: Vec<Digest>,
}

/// Event archives in `dir`, in lexical file-name order.
pub fn list_inputs(dir: &Path) -> DigestResult<Vec<PathBuf>> {
    let read_dir = fs::read_dir(dir).map_err(|err| DigestError::io(Stage::ListInputs, dir, err))?;

    let mut out = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|err| DigestError::io(Stage::ListInputs, dir, err))?;
        let path = entry.path();
        let is_archive = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(INPUT_SUFFIX));
        if is_archive && path.is_file() {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Digest every archive under `paths.events_dir`, then write the summary and
/// append this run's newly seen usernames.
pub fn run(paths: &DigestPaths, cfg: &DigestConfig) -> DigestResult<RunOutcome> {
    info!("reading users from {}", paths.users_file.display());
    let mut users = known_users::load(&paths.users_file)?;
    let existing = users.clone();
    info!("found {} existing users", existing.len());

    let inputs = list_inputs(&paths.events_dir)?;
    let opts = CacheOptions {
        read_buffer_bytes: cfg.stream.read_buffer_bytes,
        on_incomplete: cfg.cache.on_incomplete,
    };

    let mut out = RunOutcome {
        known_users_before: existing.len(),
        digests: Vec::with_capacity(inputs.len()),
        ..RunOutcome::default()
    };

    for input in &inputs {
        let (digest, source) = cache::compute_or_fetch(input, &mut users, &opts)?;
        match source {
            DigestSource::Fresh => out.fresh += 1,
            DigestSource::Cached => out.cached += 1,
            DigestSource::Recomputed => out.recomputed += 1,
        }
        info!(
            file = %input.display(),
            source = source.as_str(),
            "{} {}: {}",
            source.as_str(),
            digest.date.to_rfc3339(),
            digest.count
        );
        info!("now have {} users", users.len());
        out.total_events += digest.count;
        out.digests.push(digest);
    }
    out.files = inputs.len();

    info!("computing difference in users");
    let new_users = users.difference(&existing);
    info!("done (found {})", new_users.len());
    out.new_users = new_users.len();

    summary::write(&paths.summary_file, &mut out.digests)?;
    info!("writing {} users", new_users.len());
    known_users::append(&paths.users_file, &new_users)?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{list_inputs, run};
    use crate::digest::cache::artifact_path;
    use crate::digest::config::DigestConfig;
    use crate::digest::paths::DigestPaths;
    use crate::digest::stream::tests::{events, gzip};
    use crate::error::DigestError;
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn paths_for(dir: &Path) -> DigestPaths {
        DigestPaths {
            events_dir: dir.to_path_buf(),
            summary_file: dir.join("summary.json"),
            users_file: dir.join("users.txt"),
        }
    }

    // `lines` events cycling through `logins`.
    fn write_archive(dir: &Path, name: &str, lines: usize, logins: &[&str]) {
        let cycled: Vec<&str> = logins.iter().copied().cycle().take(lines).collect();
        fs::write(dir.join(name), gzip(&events(&cycled))).expect("write archive");
    }

    #[test]
    fn list_inputs_keeps_only_archives_in_name_order() {
        let tmp = tempdir().expect("tempdir");
        for name in ["2024-01-02-0.json.gz", "2024-01-01-0.json.gz", "users.txt", "x.json"] {
            fs::write(tmp.path().join(name), b"").expect("write");
        }
        fs::write(tmp.path().join("2024-01-01-0.json.gz.digest.json"), b"").expect("write");

        let names: Vec<String> = list_inputs(tmp.path())
            .expect("list")
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["2024-01-01-0.json.gz", "2024-01-02-0.json.gz"]);
    }

    #[test]
    fn two_archives_end_to_end_then_rerun_is_cached() {
        let tmp = tempdir().expect("tempdir");
        let dir = tmp.path();
        write_archive(dir, "2024-01-02-5.json.gz", 10, &["alice", "Bob", "carol"]);
        write_archive(
            dir,
            "2024-01-01-17.json.gz",
            20,
            &["dave", "erin", "frank", "gina", "ALICE"],
        );
        let paths = paths_for(dir);
        let cfg = DigestConfig::default();

        let first = run(&paths, &cfg).expect("first run");
        assert_eq!(first.files, 2);
        assert_eq!(first.fresh, 2);
        assert_eq!(first.new_users, 7);
        assert_eq!(first.total_events, 30);
        assert!(artifact_path(&dir.join("2024-01-02-5.json.gz")).exists());
        assert!(artifact_path(&dir.join("2024-01-01-17.json.gz")).exists());

        let summary = fs::read_to_string(&paths.summary_file).expect("summary");
        assert_eq!(
            summary,
            "[{\"count\":20,\"date\":\"2024-01-01T17:00:00Z\"},{\"count\":10,\"date\":\"2024-01-02T05:00:00Z\"}]\n"
        );

        let users_raw = fs::read_to_string(&paths.users_file).expect("users");
        let users: BTreeSet<&str> = users_raw.lines().collect();
        let want: BTreeSet<&str> = ["alice", "bob", "carol", "dave", "erin", "frank", "gina"]
            .into_iter()
            .collect();
        assert_eq!(users, want);
        assert_eq!(users_raw.lines().count(), 7);

        let second = run(&paths, &cfg).expect("second run");
        assert_eq!(second.cached, 2);
        assert_eq!(second.fresh, 0);
        assert_eq!(second.known_users_before, 7);
        assert_eq!(second.new_users, 0);
        assert_eq!(fs::read_to_string(&paths.summary_file).expect("summary"), summary);
        assert_eq!(fs::read_to_string(&paths.users_file).expect("users"), users_raw);
    }

    #[test]
    fn bad_file_name_aborts_before_summary() {
        let tmp = tempdir().expect("tempdir");
        let dir = tmp.path();
        write_archive(dir, "2024-01-05.json.gz", 2, &["alice"]);
        let paths = paths_for(dir);

        let err = run(&paths, &DigestConfig::default()).unwrap_err();
        assert!(matches!(err, DigestError::Stamp { .. }));
        assert!(!paths.summary_file.exists());
        assert!(!paths.users_file.exists());
    }
}
