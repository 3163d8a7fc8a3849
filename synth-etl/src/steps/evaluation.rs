//! Evaluation score fill

use crate::error::EtlResult;
use crate::legacy::fetch_scores;
use crate::step::{Step, StepContext};
use crate::target::TargetRow;
use crate::translation::{IdSequence, LegacyTable};
use async_trait::async_trait;
use synth_common::db::TargetTable;
use synth_common::SynthRound;
use tracing::{debug, info};

/// Application scores for migrated projects
///
/// Scores of projects that were left behind (drafts, unidentified users)
/// are skipped.
pub struct FillEvaluationScore;

#[async_trait]
impl Step for FillEvaluationScore {
    fn message(&self) -> String {
        "Filling EvaluationScore table".to_string()
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> EtlResult<()> {
        let mut ids = IdSequence::new();
        let mut skipped = 0usize;

        for round in SynthRound::chronological() {
            let scores = fetch_scores(ctx.source(round)).await?;

            for score in scores {
                let project = score.project_id.and_then(|project_id| {
                    ctx.translations
                        .translate(LegacyTable::VisitorProject, project_id, round)
                });
                let Some(project) = project else {
                    debug!(
                        round = %round,
                        score_id = score.score_id,
                        project_id = ?score.project_id,
                        "Score for a project that was not migrated, skipping"
                    );
                    skipped += 1;
                    continue;
                };

                let id = ids.next_id();
                ctx.translations
                    .map(LegacyTable::EvaluationScore, score.score_id, id, Some(round));

                TargetRow::new(TargetTable::EvaluationScore)
                    .set("id", id)
                    .set("visitor_project", project)
                    .set("methodology", score.methodology)
                    .set("research_excellence", score.research_excellence)
                    .set("support_statement", score.support_statement)
                    .set("justification", score.justification)
                    .set("expected_gains", score.expected_gains)
                    .set("scientific_merit", score.scientific_merit)
                    .set("societal_challenge", score.societal_challenge)
                    .set("comment", score.comment)
                    .set("scored", score.scored)
                    .insert(&mut *ctx.target)
                    .await?;
            }
        }

        info!(scores = ids.issued(), skipped, "Added evaluation scores");
        Ok(())
    }
}
