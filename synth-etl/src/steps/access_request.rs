//! Fills from the curated access request sheets
//!
//! Sheet ids only link rows between the sheets, so every sheet row gets a new
//! id and its sheet id is registered for all rounds.

use crate::error::EtlResult;
use crate::step::{Step, StepContext};
use crate::target::TargetRow;
use crate::text::country_code;
use crate::translation::{IdSequence, LegacyTable};
use async_trait::async_trait;
use synth_common::db::TargetTable;
use synth_common::SynthRound;
use tracing::{debug, info, warn};

pub struct FillCategory;

#[async_trait]
impl Step for FillCategory {
    fn message(&self) -> String {
        "Filling Category table".to_string()
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> EtlResult<()> {
        let resources = ctx.resources;
        let mut ids = IdSequence::new();

        for row in &resources.rebuild.categories {
            let id = ids.next_id();
            ctx.translations.map(LegacyTable::Category, row.id, id, None);

            TargetRow::new(TargetTable::Category)
                .set("id", id)
                .set("name", row.name.clone())
                .insert(&mut *ctx.target)
                .await?;
        }

        info!(categories = ids.issued(), "Added categories");
        Ok(())
    }
}

/// Institutions; an unknown country code leaves the country empty
pub struct FillInstitution;

#[async_trait]
impl Step for FillInstitution {
    fn message(&self) -> String {
        "Filling Institution table".to_string()
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> EtlResult<()> {
        let resources = ctx.resources;
        let mut ids = IdSequence::new();

        for row in &resources.rebuild.institutions {
            let country = country_code(row.country_code.as_deref()).and_then(|code| {
                let country =
                    ctx.translations
                        .translate(LegacyTable::Country, code.as_str(), SynthRound::LATEST);
                if country.is_none() {
                    warn!(institution = row.id, code = %code, "Unknown institution country code");
                }
                country
            });

            let id = ids.next_id();
            ctx.translations.map(LegacyTable::Institution, row.id, id, None);

            TargetRow::new(TargetTable::Institution)
                .set("id", id)
                .set("name", row.name.clone())
                .set("country", country)
                .insert(&mut *ctx.target)
                .await?;
        }

        info!(institutions = ids.issued(), "Added institutions");
        Ok(())
    }
}

/// Installation facilities; category and institution must already exist
pub struct FillInstallationFacility;

#[async_trait]
impl Step for FillInstallationFacility {
    fn message(&self) -> String {
        "Filling InstallationFacility table".to_string()
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> EtlResult<()> {
        let resources = ctx.resources;
        let mut ids = IdSequence::new();

        for row in &resources.rebuild.installation_facilities {
            let category =
                ctx.translations
                    .require(LegacyTable::Category, row.category_id, SynthRound::LATEST)?;
            let institution = ctx.translations.require(
                LegacyTable::Institution,
                row.institution_id,
                SynthRound::LATEST,
            )?;

            let id = ids.next_id();
            ctx.translations
                .map(LegacyTable::InstallationFacility, row.id, id, None);

            TargetRow::new(TargetTable::InstallationFacility)
                .set("id", id)
                .set("name", row.name.clone())
                .set("description", row.description.clone())
                .set("category", category)
                .set("institution", institution)
                .insert(&mut *ctx.target)
                .await?;
        }

        info!(installation_facilities = ids.issued(), "Added installation facilities");
        Ok(())
    }
}

/// Access requests of migrated projects
///
/// Requests for projects that were not migrated are skipped; the facility
/// is a required reference.
pub struct FillAccessRequest;

#[async_trait]
impl Step for FillAccessRequest {
    fn message(&self) -> String {
        "Filling AccessRequest table".to_string()
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> EtlResult<()> {
        let resources = ctx.resources;
        let mut ids = IdSequence::new();
        let mut skipped = 0usize;

        for row in &resources.rebuild.access_requests {
            let round = SynthRound::try_from(row.round)?;

            let Some(project) =
                ctx.translations
                    .translate(LegacyTable::VisitorProject, row.project_id, round)
            else {
                debug!(
                    round = %round,
                    project_id = row.project_id,
                    "Access request for a project that was not migrated, skipping"
                );
                skipped += 1;
                continue;
            };
            let facility = ctx.translations.require(
                LegacyTable::InstallationFacility,
                row.installation_facility_id,
                round,
            )?;

            TargetRow::new(TargetTable::AccessRequest)
                .set("id", ids.next_id())
                .set("visitor_project", project)
                .set("installation_facility", facility)
                .set("request", row.request.clone())
                .insert(&mut *ctx.target)
                .await?;
        }

        info!(access_requests = ids.issued(), skipped, "Added access requests");
        Ok(())
    }
}
