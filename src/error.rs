// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between the key file and the output CSV.
///
/// `Quota`, `Auth` and `Transport` come out of the network layer and abort a
/// batch run. `MalformedResponse` means the provider broke its documented
/// shape. `FileWrite` is raised by the sink; the batch layer treats it as
/// non-fatal for the remaining days.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load service account key {path}")]
    Credentials {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("authorization failed: {reason}")]
    Auth { reason: String },

    #[error("analytics quota exhausted for view {view_id}")]
    Quota { view_id: String },

    #[error("transport error")]
    Transport(#[from] reqwest::Error),

    #[error("malformed report response: {reason}")]
    MalformedResponse { reason: String },

    #[error("failed to write report to {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
