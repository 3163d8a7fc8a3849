//! Error types for synth-etl

use crate::resources::Resource;
use crate::translation::{LegacyKey, LegacyTable};
use std::path::PathBuf;
use synth_common::SynthRound;
use thiserror::Error;

/// ETL error type
#[derive(Debug, Error)]
pub enum EtlError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// synth-common error
    #[error(transparent)]
    Common(#[from] synth_common::Error),

    /// Two specific disciplines share a name across rounds but hang off
    /// different unified parent disciplines
    #[error(
        "Specific discipline {specific_discipline_id} ({name:?}) in synth round {round} has the \
         same name as a specific discipline already added from synth round {added_round} but a \
         different parent discipline ID: {discipline_id} != {added_discipline_id}"
    )]
    SpecificDisciplineParentMismatch {
        round: SynthRound,
        specific_discipline_id: i64,
        name: String,
        discipline_id: i64,
        added_round: SynthRound,
        added_discipline_id: i64,
    },

    /// A required foreign key has no registered translation
    #[error("No translation registered for {table} {key} in synth round {round}")]
    MissingTranslation {
        table: LegacyTable,
        key: LegacyKey,
        round: SynthRound,
    },

    /// A project names a call position its round does not have
    #[error(
        "Project {project_id} in synth round {round} was submitted against call position \
         {position} but the round only has {calls} calls"
    )]
    CallPositionOutOfRange {
        round: SynthRound,
        project_id: i64,
        position: i64,
        calls: usize,
    },

    /// The same GUID appears on two rows of the users resource
    #[error("Duplicate user GUID in users resource: {0}")]
    DuplicateUserGuid(String),

    /// Resource file could not be read or parsed
    #[error("Failed to read {resource} resource at {path}: {message}")]
    Resource {
        resource: Resource,
        path: PathBuf,
        message: String,
    },

    /// A pipeline step failed; its writes were rolled back
    #[error("Step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: Box<EtlError>,
    },
}

impl EtlError {
    /// The error that caused a step failure (unwraps `Step`)
    pub fn root(&self) -> &EtlError {
        match self {
            EtlError::Step { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type for ETL operations
pub type EtlResult<T> = Result<T, EtlError>;
