use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate for one hourly event archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest {
    pub count: u64,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct EventRecord {
    pub actor: ActorRecord,
}

#[derive(Debug, Deserialize)]
pub struct ActorRecord {
    pub login: String,
}

/// Order digests by hour. The sort is stable, so digests sharing an hour keep
/// their processing order.
pub fn sort_by_date(digests: &mut [Digest]) {
    digests.sort_by_key(|d| d.date);
}
