//! Pipeline step abstraction
//!
//! A step is one unit of work with a human-readable description. It receives
//! the target transaction, one read connection per synth round, the
//! translation table and the loaded resources. Steps never share in-memory
//! state with each other except through the translation table.

use crate::error::EtlResult;
use crate::resources::Resources;
use crate::translation::TranslationTable;
use async_trait::async_trait;
use sqlx::SqliteConnection;
use synth_common::SynthRound;

/// Lifecycle of one step within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Running,
    Committed,
    RolledBack,
}

/// Everything a step may read from or write to
pub struct StepContext<'a> {
    /// Target session; runs inside the step's transaction
    pub target: &'a mut SqliteConnection,
    /// Source sessions in chronological round order
    pub sources: &'a mut [SqliteConnection],
    pub translations: &'a mut TranslationTable,
    pub resources: &'a Resources,
}

impl StepContext<'_> {
    /// Read connection for a round's legacy database
    pub fn source(&mut self, round: SynthRound) -> &mut SqliteConnection {
        &mut self.sources[round.index()]
    }
}

/// One unit of pipeline work
#[async_trait]
pub trait Step: Send + Sync {
    /// Short description for progress reporting
    fn message(&self) -> String;

    /// Perform the step's reads and writes
    async fn run(&self, ctx: &mut StepContext<'_>) -> EtlResult<()>;
}
