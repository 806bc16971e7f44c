use crate::digest::model::{Digest, sort_by_date};
use crate::error::{DigestError, DigestResult, Stage};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Sort `digests` by date and replace the summary file with them.
///
/// The array is written to a temporary file beside `path` and renamed over it,
/// so a failed write leaves the previous summary in place.
pub fn write(path: &Path, digests: &mut [Digest]) -> DigestResult<()> {
    sort_by_date(digests);

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let tmp =
        NamedTempFile::new_in(dir).map_err(|err| DigestError::io(Stage::WriteSummary, path, err))?;

    let mut out = BufWriter::new(tmp);
    serde_json::to_writer(&mut out, &*digests)
        .map_err(|err| DigestError::json(Stage::WriteSummary, path, err))?;
    out.write_all(b"\n")
        .map_err(|err| DigestError::io(Stage::WriteSummary, path, err))?;
    let tmp = out
        .into_inner()
        .map_err(|err| DigestError::io(Stage::WriteSummary, path, err.into_error()))?;
    tmp.as_file()
        .sync_all()
        .map_err(|err| DigestError::io(Stage::WriteSummary, path, err))?;
    tmp.persist(path)
        .map_err(|err| DigestError::io(Stage::WriteSummary, path, err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::write;
    use crate::digest::model::Digest;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn summary_is_sorted_and_replaced() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("summary.json");
        fs::write(&path, "stale content that is longer than the new summary").expect("seed");

        let mut digests = vec![
            Digest {
                count: 20,
                date: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            },
            Digest {
                count: 10,
                date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            },
        ];
        write(&path, &mut digests).expect("write");

        assert_eq!(
            fs::read_to_string(&path).expect("read"),
            "[{\"count\":10,\"date\":\"2024-01-01T00:00:00Z\"},{\"count\":20,\"date\":\"2024-01-02T00:00:00Z\"}]\n"
        );
    }

    #[test]
    fn empty_run_writes_empty_array() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("summary.json");
        write(&path, &mut []).expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "[]\n");
    }
}
