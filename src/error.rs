use std::path::PathBuf;

use thiserror::Error;

use crate::models::Ranking;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("gradebook {path} could not be read")]
    InputUnavailable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// `ranking` is left at its three zero-mark slots.
    #[error("no gradebook rows left to aggregate ({skipped} excluded by the room filter)")]
    EmptyResultSet { skipped: usize, ranking: Ranking },
}

pub type Result<T> = std::result::Result<T, AuditError>;
