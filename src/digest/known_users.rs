use crate::digest::users::{Username, UsernameSet};
use crate::digest::warn::{self, WarnEvent};
use crate::error::{DigestError, DigestResult, Stage};
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

fn parse_users(raw: &str) -> UsernameSet {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Username::new)
        .collect()
}

/// Load previously discovered usernames. A missing file starts the run empty.
pub fn load(path: &Path) -> DigestResult<UsernameSet> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(parse_users(&raw)),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn::emit(WarnEvent {
                code: "USERS_MISSING",
                stage: Stage::LoadUsers.as_str(),
                path: &path.display().to_string(),
                action: "start-empty",
                reason: "known-users-file-absent",
                err: &err.to_string(),
            });
            Ok(UsernameSet::new())
        }
        Err(err) => Err(DigestError::io(Stage::LoadUsers, path, err)),
    }
}

fn ends_mid_line(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Append `new_users` to the known-users file, one per line. The file is
/// created when absent and never truncated; an unterminated last line is
/// closed before anything is added.
pub fn append(path: &Path, new_users: &UsernameSet) -> DigestResult<()> {
    let mut file = fs::OpenOptions::new()
        .read(true)
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| DigestError::io(Stage::AppendUsers, path, err))?;
    let needs_newline = !new_users.is_empty()
        && ends_mid_line(&mut file).map_err(|err| DigestError::io(Stage::AppendUsers, path, err))?;

    let mut out = BufWriter::new(file);
    if needs_newline {
        out.write_all(b"\n")
            .map_err(|err| DigestError::io(Stage::AppendUsers, path, err))?;
    }
    for user in new_users.iter() {
        writeln!(out, "{user}").map_err(|err| DigestError::io(Stage::AppendUsers, path, err))?;
    }
    out.flush()
        .map_err(|err| DigestError::io(Stage::AppendUsers, path, err))
}
