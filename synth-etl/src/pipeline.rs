//! Pipeline driver
//!
//! The step order is fixed and encodes the foreign key dependency graph:
//! schema steps, then reference tables, then fact tables. Steps run one at a
//! time; the first failure stops the run and leaves earlier committed steps
//! in place for inspection.

use crate::error::{EtlError, EtlResult};
use crate::resources::Resources;
use crate::session::SessionManager;
use crate::step::{Step, StepState};
use crate::steps::*;
use crate::translation::TranslationTable;
use std::time::{Duration, Instant};
use synth_common::config::SynthConfig;
use tracing::{error, info};

/// Ordered steps of a rebuild
///
/// Schema steps always run; the fill steps only when fact data is requested.
pub fn etl_steps(include_fact_data: bool) -> Vec<Box<dyn Step>> {
    let mut steps: Vec<Box<dyn Step>> = vec![Box::new(ClearTargetSchema), Box::new(CreateTargetSchema)];

    if include_fact_data {
        let fills: [Box<dyn Step>; 13] = [
            Box::new(FillRound),
            Box::new(FillCall),
            Box::new(FillCountry),
            Box::new(FillDiscipline),
            Box::new(FillSpecificDiscipline),
            Box::new(FillOutput),
            Box::new(CleanOutputs),
            Box::new(FillVisitorProject),
            Box::new(FillEvaluationScore),
            Box::new(FillCategory),
            Box::new(FillInstitution),
            Box::new(FillInstallationFacility),
            Box::new(FillAccessRequest),
        ];
        steps.extend(fills);
    }

    steps
}

/// Outcome of one step
#[derive(Debug, Clone)]
pub struct StepReport {
    pub description: String,
    pub state: StepState,
    pub elapsed: Duration,
}

/// Outcome of a successful rebuild
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub steps: Vec<StepReport>,
    /// Translation table entries registered during the run
    pub translations: usize,
}

impl RunSummary {
    pub fn elapsed(&self) -> Duration {
        self.steps.iter().map(|s| s.elapsed).sum()
    }
}

pub struct Pipeline {
    sessions: SessionManager,
    resources: Resources,
}

impl Pipeline {
    pub fn new(config: &SynthConfig, resources: Resources) -> Self {
        Self {
            sessions: SessionManager::new(config),
            resources,
        }
    }

    /// Validate the config and load the resources it points at
    pub fn from_config(config: &SynthConfig) -> EtlResult<Self> {
        config.validate()?;
        let resources = Resources::load(&config.resources)?;
        Ok(Self::new(config, resources))
    }

    /// Rebuild the target schema, optionally loading all fact data
    pub async fn rebuild(&self, include_fact_data: bool) -> EtlResult<RunSummary> {
        let steps = etl_steps(include_fact_data);
        info!(
            target_url = self.sessions.target_url(),
            steps = steps.len(),
            include_fact_data,
            "Starting rebuild"
        );

        let mut translations = TranslationTable::new();
        let mut states = vec![StepState::Pending; steps.len()];
        let mut reports = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            let description = step.message();
            states[index] = StepState::Running;
            info!("{}...", description);

            let start = Instant::now();
            let result = self
                .sessions
                .run_step(step.as_ref(), &mut translations, &self.resources)
                .await;
            let elapsed = start.elapsed();

            match result {
                Ok(()) => {
                    states[index] = StepState::Committed;
                    info!("Done [took {:.2?}]", elapsed);
                    reports.push(StepReport {
                        description,
                        state: states[index],
                        elapsed,
                    });
                }
                Err(e) => {
                    states[index] = StepState::RolledBack;
                    error!(
                        step = %description,
                        completed = reports.len(),
                        "Step failed after {:.2?}, its changes were rolled back: {}",
                        elapsed,
                        e
                    );
                    return Err(EtlError::Step {
                        step: description,
                        source: Box::new(e),
                    });
                }
            }
        }

        let summary = RunSummary {
            steps: reports,
            translations: translations.len(),
        };
        info!(
            steps = summary.steps.len(),
            translations = summary.translations,
            "Rebuild complete [took {:.2?}]",
            summary.elapsed()
        );

        Ok(summary)
    }
}
