use std::path::PathBuf;

/// Why the AWS CLI could not be used. Never retried; the executor turns any
/// of these into a failed refresh without spawning anything.
#[derive(Debug, thiserror::Error)]
pub enum TrustError {
    #[error("failed to run executable lookup: {0}")]
    LookupFailed(#[source] std::io::Error),

    #[error("executable lookup timed out after {0} seconds")]
    LookupTimedOut(u64),

    #[error("'{0}' was not found on the trusted search path")]
    NotFound(String),

    #[error("lookup reported {0}, but no such file exists")]
    CandidateMissing(PathBuf),

    #[error("{0} is outside the trusted install locations")]
    UntrustedLocation(PathBuf),

    #[error("failed to resolve the real path of {path}: {source}")]
    SymlinkResolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{link} resolves to {target}, which is outside the trusted install locations")]
    UntrustedSymlinkTarget { link: PathBuf, target: PathBuf },
}

/// A single MCP config file that could not be used. Only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum ConfigReadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Tool arguments rejected before any resolution takes place.
#[derive(Debug, thiserror::Error)]
pub enum ArgumentError {
    #[error("invalid arguments: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid arguments: {0}")]
    Invalid(#[from] garde::Report),
}
