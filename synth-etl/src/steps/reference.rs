//! Reference data fills: rounds, calls, countries and disciplines

use crate::countries::COUNTRIES;
use crate::error::EtlResult;
use crate::legacy::{fetch_calls, fetch_disciplines};
use crate::step::{Step, StepContext};
use crate::target::TargetRow;
use crate::text::parse_timestamp;
use crate::translation::{IdSequence, LegacyTable};
use async_trait::async_trait;
use synth_common::db::TargetTable;
use synth_common::SynthRound;
use tracing::{debug, info};

/// One Round row per synth round, id forced to the round number
///
/// The round window runs from the earliest call opening to the latest call
/// closing in that round.
pub struct FillRound;

#[async_trait]
impl Step for FillRound {
    fn message(&self) -> String {
        "Filling Round table".to_string()
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> EtlResult<()> {
        for round in SynthRound::chronological() {
            let calls = fetch_calls(ctx.source(round)).await?;

            let start = calls
                .iter()
                .filter_map(|c| parse_timestamp(c.date_open.as_deref()))
                .min();
            let end = calls
                .iter()
                .filter_map(|c| parse_timestamp(c.date_closed.as_deref()))
                .max();

            TargetRow::new(TargetTable::Round)
                .set("id", round.value())
                .set("name", round.label())
                .set("start_date", start)
                .set("end_date", end)
                .insert(&mut *ctx.target)
                .await?;

            debug!(round = %round, ?start, ?end, "Added round");
        }
        Ok(())
    }
}

/// Calls from every round under one id sequence, in call number order
pub struct FillCall;

#[async_trait]
impl Step for FillCall {
    fn message(&self) -> String {
        "Filling Call table".to_string()
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> EtlResult<()> {
        let mut ids = IdSequence::new();

        for round in SynthRound::chronological() {
            let calls = fetch_calls(ctx.source(round)).await?;

            for call in calls {
                let id = ids.next_id();
                ctx.translations
                    .map(LegacyTable::Call, call.call_id, id, Some(round));

                TargetRow::new(TargetTable::Call)
                    .set("id", id)
                    .set("round", round.value())
                    .set("call_number", call.call)
                    .set("start_date", parse_timestamp(call.date_open.as_deref()))
                    .set("end_date", parse_timestamp(call.date_closed.as_deref()))
                    .insert(&mut *ctx.target)
                    .await?;
            }
        }

        info!(calls = ids.issued(), "Added calls");
        Ok(())
    }
}

/// ISO 3166-1 alpha-2 countries, translated round-independently by code
pub struct FillCountry;

#[async_trait]
impl Step for FillCountry {
    fn message(&self) -> String {
        "Filling Country table".to_string()
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> EtlResult<()> {
        let mut ids = IdSequence::new();

        for (code, name) in COUNTRIES {
            let id = ids.next_id();
            ctx.translations.map(LegacyTable::Country, *code, id, None);

            TargetRow::new(TargetTable::Country)
                .set("id", id)
                .set("code", *code)
                .set("name", *name)
                .insert(&mut *ctx.target)
                .await?;
        }

        info!(countries = ids.issued(), "Added countries");
        Ok(())
    }
}

/// Disciplines copied verbatim from the latest round
///
/// The discipline table is identical in every round, so legacy ids are kept
/// and mapped to themselves for all rounds.
pub struct FillDiscipline;

#[async_trait]
impl Step for FillDiscipline {
    fn message(&self) -> String {
        "Filling Discipline table".to_string()
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> EtlResult<()> {
        let disciplines = fetch_disciplines(ctx.source(SynthRound::LATEST)).await?;
        let count = disciplines.len();

        for discipline in disciplines {
            ctx.translations
                .map(LegacyTable::Discipline, discipline.id, discipline.id, None);

            TargetRow::new(TargetTable::Discipline)
                .set("id", discipline.id)
                .set("name", discipline.name)
                .insert(&mut *ctx.target)
                .await?;
        }

        info!(disciplines = count, "Added disciplines");
        Ok(())
    }
}
