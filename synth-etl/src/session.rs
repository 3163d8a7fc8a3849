//! Source/target session management
//!
//! Every step gets a fresh set of sessions: one read-only connection per
//! synth round and one target connection with an open transaction. The
//! target transaction is committed when the step succeeds and rolled back
//! when it fails. All connections are closed on every exit path.

use crate::error::EtlResult;
use crate::resources::Resources;
use crate::step::{Step, StepContext};
use crate::translation::TranslationTable;
use sqlx::{Connection, SqliteConnection};
use synth_common::config::SynthConfig;
use synth_common::db::{connect_source, connect_target};
use synth_common::SynthRound;
use tracing::{debug, warn};

/// Opens and releases the per-step database sessions
pub struct SessionManager {
    sources: Vec<String>,
    target: String,
}

impl SessionManager {
    /// Sessions for the databases named in a validated config
    pub fn new(config: &SynthConfig) -> Self {
        Self {
            sources: config.sources.clone(),
            target: config.target.clone(),
        }
    }

    pub fn target_url(&self) -> &str {
        &self.target
    }

    /// Run one step inside its own sessions
    ///
    /// The step's target writes are all-or-nothing. The error returned is
    /// the step's own error; a failed rollback is only logged.
    pub async fn run_step(
        &self,
        step: &dyn Step,
        translations: &mut TranslationTable,
        resources: &Resources,
    ) -> EtlResult<()> {
        let mut sources = self.open_sources().await?;

        let mut target = match connect_target(&self.target).await {
            Ok(conn) => conn,
            Err(e) => {
                close_all(sources).await;
                return Err(e.into());
            }
        };

        let result = run_in_transaction(step, &mut target, &mut sources, translations, resources).await;

        close_all(sources).await;
        if let Err(e) = target.close().await {
            warn!("Failed to close target session: {}", e);
        }

        result
    }

    async fn open_sources(&self) -> EtlResult<Vec<SqliteConnection>> {
        if self.sources.len() != SynthRound::ALL.len() {
            return Err(synth_common::Error::Config(format!(
                "Expected {} source databases, got {}",
                SynthRound::ALL.len(),
                self.sources.len()
            ))
            .into());
        }

        let mut sources = Vec::with_capacity(self.sources.len());
        for round in SynthRound::chronological() {
            let url = &self.sources[round.index()];
            match connect_source(url).await {
                Ok(conn) => sources.push(conn),
                Err(e) => {
                    warn!(round = %round, url = %url, "Failed to open source session: {}", e);
                    close_all(sources).await;
                    return Err(e.into());
                }
            }
        }
        Ok(sources)
    }
}

async fn run_in_transaction(
    step: &dyn Step,
    target: &mut SqliteConnection,
    sources: &mut [SqliteConnection],
    translations: &mut TranslationTable,
    resources: &Resources,
) -> EtlResult<()> {
    let mut tx = target.begin().await?;

    let outcome = {
        let mut ctx = StepContext {
            target: &mut *tx,
            sources,
            translations,
            resources,
        };
        step.run(&mut ctx).await
    };

    match outcome {
        Ok(()) => {
            tx.commit().await?;
            debug!("Committed step: {}", step.message());
            Ok(())
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback failed for step '{}': {}", step.message(), rollback_err);
            } else {
                debug!("Rolled back step: {}", step.message());
            }
            Err(e)
        }
    }
}

async fn close_all(connections: Vec<SqliteConnection>) {
    for conn in connections {
        if let Err(e) = conn.close().await {
            warn!("Failed to close source session: {}", e);
        }
    }
}
