use thiserror::Error;

use crate::guide::types::RecordKind;

#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("Failed to load {file}: {reason}")]
    Load { file: String, reason: String },
    #[error("{from_kind} `{from_nid}` references missing {target_kind} `{target_nid}`")]
    Resolution {
        from_kind: RecordKind,
        from_nid: String,
        target_kind: RecordKind,
        target_nid: String,
    },
    #[error("{kind} `{conflicting_nid}` collides with `{canonical_nid}` but carries different data")]
    DuplicateConflict {
        kind: RecordKind,
        canonical_nid: String,
        conflicting_nid: String,
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Error serializing or deserializing json: {err}")]
    SerdeJson {
        #[from]
        err: serde_json::Error,
    },
    #[error("IO error")]
    IoError(#[from] std::io::Error),
}

impl ErrorKind {
    pub fn load(file: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        ErrorKind::Load {
            file: file.into(),
            reason: reason.to_string(),
        }
    }

    pub fn unresolved(
        from_kind: RecordKind,
        from_nid: &str,
        target_kind: RecordKind,
        target_nid: &str,
    ) -> Self {
        ErrorKind::Resolution {
            from_kind,
            from_nid: from_nid.to_string(),
            target_kind,
            target_nid: target_nid.to_string(),
        }
    }
}

pub type IResult<T> = Result<T, ErrorKind>;
