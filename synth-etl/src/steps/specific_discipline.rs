//! Specific discipline fill with cross-round deduplication
//!
//! Every round carries its own copy of the specific discipline table, with
//! overlapping but not identical contents. Rows are merged by exact name.
//! Rounds are visited newest first so the latest naming and parentage wins
//! when the same name shows up again in an older round.

use crate::error::{EtlError, EtlResult};
use crate::legacy::{fetch_specific_disciplines, LegacySpecificDiscipline};
use crate::step::{Step, StepContext};
use crate::target::TargetRow;
use crate::translation::{IdSequence, LegacyTable};
use async_trait::async_trait;
use std::collections::HashMap;
use synth_common::db::TargetTable;
use synth_common::SynthRound;
use tracing::{debug, info};

/// First unified row created for a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AddedSpecificDiscipline {
    id: i64,
    round: SynthRound,
    discipline_id: i64,
}

/// Outcome of matching one legacy row against the rows added so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    /// Same name and parent already added; reuse its id
    Existing(i64),
    /// First row with this name; insert it under the new id
    New(i64),
}

/// Name → first-created unified specific discipline, scoped to one run of the step
#[derive(Debug, Default)]
struct DedupSet {
    ids: IdSequence,
    added: HashMap<Option<String>, AddedSpecificDiscipline>,
}

impl DedupSet {
    fn resolve(
        &mut self,
        round: SynthRound,
        row: &LegacySpecificDiscipline,
        discipline_id: i64,
    ) -> EtlResult<Resolution> {
        if let Some(added) = self.added.get(&row.name) {
            if added.discipline_id != discipline_id {
                return Err(EtlError::SpecificDisciplineParentMismatch {
                    round,
                    specific_discipline_id: row.id,
                    name: row.name.clone().unwrap_or_default(),
                    discipline_id,
                    added_round: added.round,
                    added_discipline_id: added.discipline_id,
                });
            }
            return Ok(Resolution::Existing(added.id));
        }

        let id = self.ids.next_id();
        self.added.insert(
            row.name.clone(),
            AddedSpecificDiscipline {
                id,
                round,
                discipline_id,
            },
        );
        Ok(Resolution::New(id))
    }
}

pub struct FillSpecificDiscipline;

#[async_trait]
impl Step for FillSpecificDiscipline {
    fn message(&self) -> String {
        "Filling SpecificDiscipline table".to_string()
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> EtlResult<()> {
        let mut dedup = DedupSet::default();
        let mut merged = 0usize;

        for round in SynthRound::newest_first() {
            let rows = fetch_specific_disciplines(ctx.source(round)).await?;

            for row in rows {
                let discipline_id =
                    ctx.translations
                        .require(LegacyTable::Discipline, row.discipline_id, round)?;

                let id = match dedup.resolve(round, &row, discipline_id)? {
                    Resolution::Existing(id) => {
                        debug!(
                            round = %round,
                            legacy_id = row.id,
                            id,
                            name = ?row.name,
                            "Merged specific discipline into existing row"
                        );
                        merged += 1;
                        id
                    }
                    Resolution::New(id) => {
                        TargetRow::new(TargetTable::SpecificDiscipline)
                            .set("id", id)
                            .set("name", row.name.clone())
                            .set("discipline", discipline_id)
                            .insert(&mut *ctx.target)
                            .await?;
                        id
                    }
                };

                ctx.translations
                    .map(LegacyTable::SpecificDiscipline, row.id, id, Some(round));
            }
        }

        info!(
            specific_disciplines = dedup.ids.issued(),
            merged,
            "Added specific disciplines"
        );
        Ok(())
    }
}
