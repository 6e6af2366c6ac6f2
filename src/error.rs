use std::path::PathBuf;
use std::string::FromUtf8Error;

/// Boxed cause from the archive layer
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a sanitize run failed
#[derive(Debug, thiserror::Error)]
pub enum SanitizeError {
    #[error("cannot read archive {}", .path.display())]
    ArchiveRead {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("cannot write archive {}", .path.display())]
    ArchiveWrite {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("entry {entry} is not valid UTF-8")]
    Encoding {
        entry: String,
        #[source]
        source: FromUtf8Error,
    },

    #[error("destination {} is the source archive", .path.display())]
    SameFile { path: PathBuf },

    #[error("{} replacement rule(s) matched nothing: {}", .labels.len(), .labels.join(", "))]
    MissedRules { labels: Vec<String> },
}

impl SanitizeError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        Self::ArchiveRead {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        Self::ArchiveWrite {
            path: path.into(),
            source: source.into(),
        }
    }
}

pub type Result<T, E = SanitizeError> = std::result::Result<T, E>;
