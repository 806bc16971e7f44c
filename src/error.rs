use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::digest::stamp::StampError;

/// Pipeline step an error was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadUsers,
    ListInputs,
    ClaimCache,
    ReadCache,
    WriteCache,
    OpenInput,
    CountLines,
    Rewind,
    ExtractUsers,
    ParseStamp,
    WriteSummary,
    AppendUsers,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadUsers => "load-users",
            Self::ListInputs => "list-inputs",
            Self::ClaimCache => "claim-cache",
            Self::ReadCache => "read-cache",
            Self::WriteCache => "write-cache",
            Self::OpenInput => "open-input",
            Self::CountLines => "count-lines",
            Self::Rewind => "rewind",
            Self::ExtractUsers => "extract-users",
            Self::ParseStamp => "parse-stamp",
            Self::WriteSummary => "write-summary",
            Self::AppendUsers => "append-users",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal pipeline failure. Every variant names the file and the stage so the
/// caller can print one precise diagnostic before exiting.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("{stage} failed for {}", path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{stage} failed for {}", path.display())]
    Json {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("parse-stamp failed for {}", path.display())]
    Stamp {
        path: PathBuf,
        #[source]
        source: StampError,
    },
    #[error("cache artifact {} is incomplete: {reason}", path.display())]
    IncompleteCache { path: PathBuf, reason: String },
}

impl DigestError {
    pub fn io(stage: Stage, path: &Path, source: io::Error) -> Self {
        Self::Io {
            stage,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn json(stage: Stage, path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            stage,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::Io { stage, .. } | Self::Json { stage, .. } => *stage,
            Self::Stamp { .. } => Stage::ParseStamp,
            Self::IncompleteCache { .. } => Stage::ReadCache,
        }
    }
}

pub type DigestResult<T> = Result<T, DigestError>;
