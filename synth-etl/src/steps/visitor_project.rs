//! Visitor project fill
//!
//! Drafts are left behind, and so are projects whose user could not be
//! identified: the user identity map was curated to exclude people who did
//! not consent, and their projects must not reach the analysis schema.

use crate::error::{EtlError, EtlResult};
use crate::legacy::{fetch_calls, fetch_submitted_projects, LegacyCall, LegacyProject};
use crate::step::{Step, StepContext};
use crate::target::TargetRow;
use crate::text::{country_code, parse_timestamp};
use crate::translation::{IdSequence, LegacyTable, TranslationTable};
use async_trait::async_trait;
use synth_common::db::TargetTable;
use synth_common::SynthRound;
use tracing::{debug, info, warn};

pub struct FillVisitorProject;

#[async_trait]
impl Step for FillVisitorProject {
    fn message(&self) -> String {
        "Filling VisitorProject table".to_string()
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> EtlResult<()> {
        let resources = ctx.resources;
        let mut ids = IdSequence::new();
        let mut skipped = 0usize;

        for round in SynthRound::chronological() {
            let calls = fetch_calls(ctx.source(round)).await?;
            let projects = fetch_submitted_projects(ctx.source(round)).await?;

            for project in projects {
                let guid = project
                    .user_id
                    .and_then(|user_id| resources.users.lookup_guid(round, user_id));
                let Some(guid) = guid else {
                    debug!(
                        round = %round,
                        project_id = project.project_id,
                        user_id = ?project.user_id,
                        "No GUID for project user, skipping"
                    );
                    skipped += 1;
                    continue;
                };

                let call = resolve_call(ctx.translations, round, &calls, &project)?;
                let discipline = resolve_optional(
                    ctx.translations,
                    LegacyTable::Discipline,
                    project.discipline_id,
                    round,
                )?;
                let specific_discipline = resolve_optional(
                    ctx.translations,
                    LegacyTable::SpecificDiscipline,
                    project.specific_discipline_id,
                    round,
                )?;
                let nationality = resolve_country(
                    ctx.translations,
                    project.nationality_code.as_deref(),
                    round,
                );
                let home_country = resolve_country(
                    ctx.translations,
                    project.home_institution_country_code.as_deref(),
                    round,
                );
                let home_institution = project
                    .home_institution_name
                    .as_deref()
                    .and_then(|name| resources.institutions.clean(name));

                let id = ids.next_id();
                ctx.translations
                    .map(LegacyTable::VisitorProject, project.project_id, id, Some(round));

                let p = project;
                TargetRow::new(TargetTable::VisitorProject)
                    .set("id", id)
                    .set("round", round.value())
                    .set("call", call)
                    .set("user_guid", guid)
                    .set("user_age_range", resources.users.lookup_age(round, guid))
                    .set("title", p.title)
                    .set("objectives", p.objectives)
                    .set("achievements", p.achievements)
                    .set("length_of_visit", p.length_of_visit)
                    .set("start_date", parse_timestamp(p.start_date.as_deref()))
                    .set("finish_date", parse_timestamp(p.finish_date.as_deref()))
                    .set("host_contacted", flag(p.host_contacted))
                    .set("home_facilities", flag(p.home_facilities))
                    .set("access_need", p.access_need)
                    .set("training_requirement", p.training_requirement)
                    .set("supporter_institution", p.supporter_institution)
                    .set("supporter_position", p.supporter_position)
                    .set("support_statement", p.support_statement)
                    .set("support_requested", flag(p.support_requested))
                    .set("application_state", p.application_state)
                    .set("administration_state", p.administration_state)
                    .set("acceptance", flag(p.acceptance))
                    .set("group_leader", flag(p.group_leader))
                    .set("group_members", p.group_members)
                    .set("summary", p.summary)
                    .set("background", p.background)
                    .set("reasons", p.reasons)
                    .set("expectations", p.expectations)
                    .set("outputs", p.outputs)
                    .set("new_user", flag(p.new_user))
                    .set("visited_details", p.visited_details)
                    .set("visited_link", p.visited_link)
                    .set("facility_reasons", p.facility_reasons)
                    .set("submission_date", p.submission_date)
                    .set("support_final", flag(p.support_final))
                    .set("additional_tafs", p.additional_tafs)
                    .set("discipline", discipline)
                    .set("specific_discipline", specific_discipline)
                    .set("host_department", p.host_department)
                    .set("previous_application", flag(p.previous_application))
                    .set("previous_application_details", p.previous_application_details)
                    .set("group_leader_institution", p.group_leader_institution)
                    .set("visit_funded_previously", flag(p.visit_funded_previously))
                    .set("visit_funded_tafs", p.visit_funded_tafs)
                    .set("visit_funded_details", p.visit_funded_details)
                    .set("gender", p.gender)
                    .set("nationality", nationality)
                    .set("researcher_status", p.researcher_status)
                    .set("home_institution_type", p.home_institution_type)
                    .set("home_institution_dept", p.home_institution_dept)
                    .set("home_institution_name", home_institution)
                    .set("home_institution_town", p.home_institution_town)
                    .set("home_institution_country", home_country)
                    .set("home_institution_postcode", p.home_institution_postcode)
                    .set("number_of_visits", p.number_of_visits)
                    .set("duration_of_stays", p.duration_of_stays)
                    .set("job_title", p.job_title)
                    .insert(&mut *ctx.target)
                    .await?;
            }
        }

        info!(projects = ids.issued(), skipped, "Added visitor projects");
        Ok(())
    }
}

fn flag(value: Option<i64>) -> Option<bool> {
    value.map(|v| v != 0)
}

/// Parse `Call_Submitted` as a 1-based position in the round's call order
fn call_position(value: Option<&str>) -> Option<i64> {
    let trimmed = value?.trim();
    trimmed.parse::<i64>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

/// Unified call id for the call a project was submitted against
///
/// A missing or unreadable position leaves the call empty; a position
/// outside the round's calls is an error.
fn resolve_call(
    translations: &TranslationTable,
    round: SynthRound,
    calls: &[LegacyCall],
    project: &LegacyProject,
) -> EtlResult<Option<i64>> {
    let Some(position) = call_position(project.call_submitted.as_deref()) else {
        return Ok(None);
    };

    let call = usize::try_from(position)
        .ok()
        .and_then(|p| p.checked_sub(1))
        .and_then(|index| calls.get(index))
        .ok_or(EtlError::CallPositionOutOfRange {
            round,
            project_id: project.project_id,
            position,
            calls: calls.len(),
        })?;

    translations
        .require(LegacyTable::Call, call.call_id, round)
        .map(Some)
}

/// Resolve a reference where NULL and 0 both mean "not set"
fn resolve_optional(
    translations: &TranslationTable,
    table: LegacyTable,
    legacy_id: Option<i64>,
    round: SynthRound,
) -> EtlResult<Option<i64>> {
    match legacy_id {
        None | Some(0) => Ok(None),
        Some(id) => translations.require(table, id, round).map(Some),
    }
}

fn resolve_country(
    translations: &TranslationTable,
    code: Option<&str>,
    round: SynthRound,
) -> Option<i64> {
    let code = country_code(code)?;
    let id = translations.translate(LegacyTable::Country, code.as_str(), round);
    if id.is_none() {
        warn!(round = %round, code = %code, "Unknown country code");
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calls(ids: &[i64]) -> Vec<LegacyCall> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| LegacyCall {
                call_id: *id,
                call: Some(i as i64 + 1),
                date_open: None,
                date_closed: None,
            })
            .collect()
    }

    fn project(call_submitted: Option<&str>) -> LegacyProject {
        LegacyProject {
            project_id: 11,
            user_id: Some(1),
            title: None,
            objectives: None,
            achievements: None,
            length_of_visit: None,
            start_date: None,
            finish_date: None,
            host_contacted: None,
            home_facilities: None,
            access_need: None,
            training_requirement: None,
            supporter_institution: None,
            supporter_position: None,
            support_statement: None,
            support_requested: None,
            application_state: None,
            administration_state: None,
            acceptance: None,
            group_leader: None,
            group_members: None,
            summary: None,
            background: None,
            reasons: None,
            expectations: None,
            outputs: None,
            new_user: None,
            visited_details: None,
            visited_link: None,
            facility_reasons: None,
            submission_date: None,
            support_final: None,
            additional_tafs: None,
            discipline_id: None,
            specific_discipline_id: None,
            host_department: None,
            call_submitted: call_submitted.map(str::to_string),
            previous_application: None,
            previous_application_details: None,
            group_leader_institution: None,
            visit_funded_previously: None,
            visit_funded_tafs: None,
            visit_funded_details: None,
            gender: None,
            nationality_code: None,
            researcher_status: None,
            home_institution_type: None,
            home_institution_dept: None,
            home_institution_name: None,
            home_institution_town: None,
            home_institution_country_code: None,
            home_institution_postcode: None,
            number_of_visits: None,
            duration_of_stays: None,
            job_title: None,
        }
    }

    fn translations() -> TranslationTable {
        let mut table = TranslationTable::new();
        table.map(LegacyTable::Call, 40, 5, Some(SynthRound::Two));
        table.map(LegacyTable::Call, 17, 6, Some(SynthRound::Two));
        table
    }

    #[test]
    fn test_call_resolved_by_position() {
        let calls = calls(&[40, 17]);
        let call = resolve_call(&translations(), SynthRound::Two, &calls, &project(Some("2")));
        assert_eq!(call.unwrap(), Some(6));
    }

    #[test]
    fn test_missing_or_unreadable_call_is_none() {
        let calls = calls(&[40, 17]);
        for submitted in [None, Some(""), Some("call two")] {
            let call = resolve_call(&translations(), SynthRound::Two, &calls, &project(submitted));
            assert_eq!(call.unwrap(), None);
        }
    }

    #[test]
    fn test_out_of_range_call_is_error() {
        let calls = calls(&[40, 17]);
        for submitted in ["0", "3"] {
            let err = resolve_call(&translations(), SynthRound::Two, &calls, &project(Some(submitted)))
                .unwrap_err();
            assert!(matches!(err, EtlError::CallPositionOutOfRange { calls: 2, .. }));
        }
    }

    #[test]
    fn test_zero_reference_is_unset() {
        let table = TranslationTable::new();
        assert_eq!(
            resolve_optional(&table, LegacyTable::Discipline, Some(0), SynthRound::One).unwrap(),
            None
        );
        assert!(resolve_optional(&table, LegacyTable::Discipline, Some(4), SynthRound::One).is_err());
    }

    #[test]
    fn test_unknown_country_is_soft() {
        let mut table = TranslationTable::new();
        table.map(LegacyTable::Country, "FR", 75, None);

        assert_eq!(resolve_country(&table, Some(" fr"), SynthRound::Three), Some(75));
        assert_eq!(resolve_country(&table, Some("ZZ"), SynthRound::Three), None);
        assert_eq!(resolve_country(&table, None, SynthRound::Three), None);
    }
}
