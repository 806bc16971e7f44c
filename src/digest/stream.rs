use crate::digest::model::{Digest, EventRecord};
use crate::digest::stamp::parse_hour_stamp;
use crate::digest::users::{Username, UsernameSet};
use crate::error::{DigestError, DigestResult, Stage};
use flate2::read::MultiGzDecoder;
use std::io::{self, BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

pub const DEFAULT_READ_BUFFER_BYTES: usize = 1024 * 1024;

/// Count lines in `reader` using reads of at most `buf_size` bytes.
///
/// A non-empty final line without a trailing newline still counts, so `a\nb\n`
/// and `a\nb` both report 2.
pub fn count_lines<R: Read>(mut reader: R, buf_size: usize) -> io::Result<u64> {
    let mut buf = vec![0u8; buf_size.max(1)];
    let mut count = 0u64;
    let mut last = None;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        count += buf[..n].iter().filter(|b| **b == b'\n').count() as u64;
        last = Some(buf[n - 1]);
    }

    if last.is_some_and(|b| b != b'\n') {
        count += 1;
    }
    Ok(count)
}

/// Decode JSON events one at a time and add each lowercased actor login to
/// `users`. Returns how many events were decoded.
pub fn extract_usernames<R: Read>(reader: R, users: &mut UsernameSet) -> serde_json::Result<u64> {
    let stream = serde_json::Deserializer::from_reader(reader).into_iter::<EventRecord>();
    let mut events = 0u64;
    for event in stream {
        let event = event?;
        users.add(Username::new(&event.actor.login));
        events += 1;
    }
    Ok(events)
}

/// Digest one gzip event archive in two passes: count lines, rewind, then
/// extract usernames into the live set. `path` is used for the hour stamp and
/// for error context.
pub fn digest_archive<R: Read + Seek>(
    path: &Path,
    input: &mut R,
    users: &mut UsernameSet,
    buf_size: usize,
) -> DigestResult<Digest> {
    let count = count_lines(MultiGzDecoder::new(&mut *input), buf_size)
        .map_err(|err| DigestError::io(Stage::CountLines, path, err))?;

    input
        .seek(SeekFrom::Start(0))
        .map_err(|err| DigestError::io(Stage::Rewind, path, err))?;

    let decoder = BufReader::with_capacity(buf_size.max(1), MultiGzDecoder::new(&mut *input));
    extract_usernames(decoder, users).map_err(|err| {
        if err.is_io() {
            DigestError::io(Stage::ExtractUsers, path, err.into())
        } else {
            DigestError::json(Stage::ExtractUsers, path, err)
        }
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let date = parse_hour_stamp(&name).map_err(|source| DigestError::Stamp {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Digest { count, date })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{count_lines, digest_archive, extract_usernames};
    use crate::digest::users::{Username, UsernameSet};
    use crate::error::{DigestError, Stage};
    use chrono::{TimeZone, Utc};
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::{Cursor, Write};
    use std::path::Path;

    pub(crate) fn gzip(raw: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(raw.as_bytes()).expect("gzip write");
        encoder.finish().expect("gzip finish")
    }

    pub(crate) fn events(logins: &[&str]) -> String {
        logins
            .iter()
            .map(|login| format!("{{\"type\":\"PushEvent\",\"actor\":{{\"login\":\"{login}\"}}}}\n"))
            .collect()
    }

    #[test]
    fn trailing_newline_does_not_change_the_count() {
        assert_eq!(count_lines("a\nb\nc\n".as_bytes(), 4).unwrap(), 3);
        assert_eq!(count_lines("a\nb\nc".as_bytes(), 4).unwrap(), 3);
        assert_eq!(count_lines("".as_bytes(), 4).unwrap(), 0);
        assert_eq!(count_lines("\n".as_bytes(), 4).unwrap(), 1);
    }

    #[test]
    fn count_is_independent_of_buffer_size() {
        let raw = events(&["a", "b", "c", "d", "e"]);
        for size in [1, 2, 7, 1024] {
            assert_eq!(count_lines(raw.as_bytes(), size).unwrap(), 5);
        }
    }

    #[test]
    fn extraction_lowercases_and_dedups() {
        let mut users = UsernameSet::new();
        let raw = events(&["Alice", "alice", "Bob"]);
        let decoded = extract_usernames(raw.as_bytes(), &mut users).expect("extract");
        assert_eq!(decoded, 3);
        assert_eq!(users.len(), 2);
        assert!(users.contains(&Username::new("bob")));
    }

    #[test]
    fn extraction_fails_on_malformed_json() {
        let mut users = UsernameSet::new();
        let raw = "{\"actor\":{\"login\":\"a\"}}\n{\"actor\":";
        assert!(extract_usernames(raw.as_bytes(), &mut users).is_err());
    }

    #[test]
    fn digest_archive_counts_and_extracts() {
        let raw = events(&["Alice", "bob", "ALICE"]);
        let mut input = Cursor::new(gzip(&raw));
        let mut users = UsernameSet::new();

        let digest = digest_archive(
            Path::new("/events/2024-01-05-9.json.gz"),
            &mut input,
            &mut users,
            16,
        )
        .expect("digest");

        assert_eq!(digest.count, 3);
        assert_eq!(digest.date, Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap());
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn digest_archive_accepts_concatenated_gzip_members() {
        let mut bytes = gzip(&events(&["a", "b"]));
        bytes.extend(gzip(&events(&["c"])));
        let mut users = UsernameSet::new();

        let digest = digest_archive(
            Path::new("2024-01-05-10.json.gz"),
            &mut Cursor::new(bytes),
            &mut users,
            1024,
        )
        .expect("digest");

        assert_eq!(digest.count, 3);
        assert_eq!(users.len(), 3);
    }

    #[test]
    fn digest_archive_rejects_name_without_hour() {
        let mut users = UsernameSet::new();
        let err = digest_archive(
            Path::new("2024-01-05.json.gz"),
            &mut Cursor::new(gzip(&events(&["a"]))),
            &mut users,
            1024,
        )
        .unwrap_err();
        assert!(matches!(err, DigestError::Stamp { .. }));
    }

    #[test]
    fn digest_archive_rejects_non_gzip_input() {
        let mut users = UsernameSet::new();
        let err = digest_archive(
            Path::new("2024-01-05-1.json.gz"),
            &mut Cursor::new(b"not gzip at all".to_vec()),
            &mut users,
            1024,
        )
        .unwrap_err();
        assert_eq!(err.stage(), Stage::CountLines);
    }
}
