//! Legacy synth round readers
//!
//! All four rounds share one schema shape. Column types drifted between
//! rounds, so every read casts to the type the migration expects and aliases
//! to snake_case for `FromRow`. Reads are fetched in full; the largest legacy
//! table holds a few thousand rows.

use crate::error::EtlResult;
use sqlx::{FromRow, SqliteConnection};
use std::collections::HashMap;

/// `NHM_Call` row
#[derive(Debug, Clone, FromRow)]
pub struct LegacyCall {
    pub call_id: i64,
    pub call: Option<i64>,
    pub date_open: Option<String>,
    pub date_closed: Option<String>,
}

/// Read a round's calls ordered by the sequential call number
///
/// The internal `callID` is neither contiguous nor ordered, so it only breaks
/// ties. `NHM_Call` has no primary key; rows without a `callID` cannot be
/// translated and are left out.
pub async fn fetch_calls(conn: &mut SqliteConnection) -> EtlResult<Vec<LegacyCall>> {
    let calls = sqlx::query_as::<_, LegacyCall>(
        r#"
        SELECT callID AS call_id,
               CAST(call AS INTEGER) AS call,
               CAST(dateOpen AS TEXT) AS date_open,
               CAST(dateClosed AS TEXT) AS date_closed
        FROM NHM_Call
        WHERE callID IS NOT NULL
        ORDER BY call, callID
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(calls)
}

/// `NHM_Disciplines` row
#[derive(Debug, Clone, FromRow)]
pub struct LegacyDiscipline {
    pub id: i64,
    pub name: Option<String>,
}

pub async fn fetch_disciplines(conn: &mut SqliteConnection) -> EtlResult<Vec<LegacyDiscipline>> {
    let disciplines = sqlx::query_as::<_, LegacyDiscipline>(
        r#"
        SELECT DisciplineID AS id, CAST(DisciplineName AS TEXT) AS name
        FROM NHM_Disciplines
        ORDER BY DisciplineID
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(disciplines)
}

/// `NHM_Specific_Disciplines` row
#[derive(Debug, Clone, FromRow)]
pub struct LegacySpecificDiscipline {
    pub id: i64,
    pub name: Option<String>,
    pub discipline_id: i64,
}

/// Read a round's specific disciplines in ascending legacy id order
pub async fn fetch_specific_disciplines(
    conn: &mut SqliteConnection,
) -> EtlResult<Vec<LegacySpecificDiscipline>> {
    let specific = sqlx::query_as::<_, LegacySpecificDiscipline>(
        r#"
        SELECT SpecificDisciplineID AS id,
               CAST(SpecificDisciplineName AS TEXT) AS name,
               COALESCE(CAST(DisciplineID AS INTEGER), 0) AS discipline_id
        FROM NHM_Specific_Disciplines
        ORDER BY SpecificDisciplineID
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(specific)
}

/// Output type id → label
pub async fn fetch_output_types(conn: &mut SqliteConnection) -> EtlResult<HashMap<i64, String>> {
    let rows: Vec<(i64, Option<String>)> = sqlx::query_as(
        "SELECT OutputType_ID, CAST(OutputType AS TEXT) FROM NHM_OutputTypes",
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(labels(rows))
}

/// Publication status id → label
pub async fn fetch_publication_statuses(
    conn: &mut SqliteConnection,
) -> EtlResult<HashMap<i64, String>> {
    let rows: Vec<(i64, Option<String>)> = sqlx::query_as(
        "SELECT PublicationStatus_ID, CAST(PublicationStatus AS TEXT) FROM NHM_PublicationStatus",
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(labels(rows))
}

fn labels(rows: Vec<(i64, Option<String>)>) -> HashMap<i64, String> {
    rows.into_iter()
        .filter_map(|(id, label)| label.map(|label| (id, label)))
        .collect()
}

/// `NHM_Outputs` row
#[derive(Debug, Clone, FromRow)]
pub struct LegacyOutput {
    pub output_id: i64,
    pub user_id: Option<i64>,
    pub output_type_id: Option<i64>,
    pub authors: Option<String>,
    pub year: Option<String>,
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub url: Option<String>,
    pub publication_status_id: Option<i64>,
    pub volume: Option<String>,
    pub pages: Option<String>,
    pub conference: Option<String>,
    pub degree: Option<String>,
    pub updated: Option<String>,
}

pub async fn fetch_outputs(conn: &mut SqliteConnection) -> EtlResult<Vec<LegacyOutput>> {
    let outputs = sqlx::query_as::<_, LegacyOutput>(
        r#"
        SELECT Output_ID AS output_id,
               CAST(User_ID AS INTEGER) AS user_id,
               CAST(OutputType_ID AS INTEGER) AS output_type_id,
               CAST(Authors AS TEXT) AS authors,
               CAST(Year AS TEXT) AS year,
               CAST(Title AS TEXT) AS title,
               CAST(Publisher AS TEXT) AS publisher,
               CAST(URL AS TEXT) AS url,
               CAST(PublicationStatus_ID AS INTEGER) AS publication_status_id,
               CAST(Volume AS TEXT) AS volume,
               CAST(Pages AS TEXT) AS pages,
               CAST(Conference AS TEXT) AS conference,
               CAST(Degree AS TEXT) AS degree,
               CAST(UpdatedDate AS TEXT) AS updated
        FROM NHM_Outputs
        ORDER BY Output_ID
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(outputs)
}

/// Submitted `T_List_of_UserProjects` row joined with its `T_List_of_Users` row
#[derive(Debug, Clone, FromRow)]
pub struct LegacyProject {
    pub project_id: i64,
    pub user_id: Option<i64>,
    pub title: Option<String>,
    pub objectives: Option<String>,
    pub achievements: Option<String>,
    pub length_of_visit: Option<i64>,
    pub start_date: Option<String>,
    pub finish_date: Option<String>,
    pub host_contacted: Option<i64>,
    pub home_facilities: Option<i64>,
    pub access_need: Option<String>,
    pub training_requirement: Option<String>,
    pub supporter_institution: Option<String>,
    pub supporter_position: Option<String>,
    pub support_statement: Option<String>,
    pub support_requested: Option<i64>,
    pub application_state: Option<String>,
    pub administration_state: Option<String>,
    pub acceptance: Option<i64>,
    pub group_leader: Option<i64>,
    pub group_members: Option<String>,
    pub summary: Option<String>,
    pub background: Option<String>,
    pub reasons: Option<String>,
    pub expectations: Option<String>,
    pub outputs: Option<String>,
    pub new_user: Option<i64>,
    pub visited_details: Option<String>,
    pub visited_link: Option<String>,
    pub facility_reasons: Option<String>,
    pub submission_date: Option<String>,
    pub support_final: Option<i64>,
    pub additional_tafs: Option<String>,
    pub discipline_id: Option<i64>,
    pub specific_discipline_id: Option<i64>,
    pub host_department: Option<String>,
    pub call_submitted: Option<String>,
    pub previous_application: Option<i64>,
    pub previous_application_details: Option<String>,
    pub group_leader_institution: Option<String>,
    pub visit_funded_previously: Option<i64>,
    pub visit_funded_tafs: Option<String>,
    pub visit_funded_details: Option<String>,
    pub gender: Option<String>,
    pub nationality_code: Option<String>,
    pub researcher_status: Option<String>,
    pub home_institution_type: Option<String>,
    pub home_institution_dept: Option<String>,
    pub home_institution_name: Option<String>,
    pub home_institution_town: Option<String>,
    pub home_institution_country_code: Option<String>,
    pub home_institution_postcode: Option<String>,
    pub number_of_visits: Option<i64>,
    pub duration_of_stays: Option<i64>,
    pub job_title: Option<String>,
}

/// Read a round's submitted projects
///
/// Drafts (`Application_State = 'edit'`) are excluded. The comparison is
/// plain SQL, so a NULL state is excluded too.
pub async fn fetch_submitted_projects(
    conn: &mut SqliteConnection,
) -> EtlResult<Vec<LegacyProject>> {
    let projects = sqlx::query_as::<_, LegacyProject>(
        r#"
        SELECT p.UserProject_ID AS project_id,
               CAST(p.User_ID AS INTEGER) AS user_id,
               CAST(p.UserProject_Title AS TEXT) AS title,
               CAST(p.UserProject_Objectives AS TEXT) AS objectives,
               CAST(p.UserProject_Achievements AS TEXT) AS achievements,
               CAST(p.length_of_visit AS INTEGER) AS length_of_visit,
               CAST(p.start_date AS TEXT) AS start_date,
               CAST(p.finish_date AS TEXT) AS finish_date,
               CAST(p.TAF_Host_Contacted AS INTEGER) AS host_contacted,
               CAST(p.Home_Facilities AS INTEGER) AS home_facilities,
               CAST(p.TAF_access_need AS TEXT) AS access_need,
               CAST(p.Training_Requirement AS TEXT) AS training_requirement,
               CAST(p.Supporter_Institution AS TEXT) AS supporter_institution,
               CAST(p.Supporter_Position AS TEXT) AS supporter_position,
               CAST(p.Support_Statement AS TEXT) AS support_statement,
               CAST(p.Support_Requested AS INTEGER) AS support_requested,
               CAST(p.Application_State AS TEXT) AS application_state,
               CAST(p.Administration_State AS TEXT) AS administration_state,
               CAST(p.Acceptance AS INTEGER) AS acceptance,
               CAST(p.Group_leader AS INTEGER) AS group_leader,
               CAST(p.Group_Members AS TEXT) AS group_members,
               CAST(p.UserProject_Summary AS TEXT) AS summary,
               CAST(p.UserProject_Background AS TEXT) AS background,
               CAST(p.UserProject_Reasons AS TEXT) AS reasons,
               CAST(p.UserProject_Expectations AS TEXT) AS expectations,
               CAST(p.UserProject_Outputs AS TEXT) AS outputs,
               CAST(p.New_User AS INTEGER) AS new_user,
               CAST(p.Visited_Details AS TEXT) AS visited_details,
               CAST(p.Visited_Link AS TEXT) AS visited_link,
               CAST(p.UserProject_Facility_Reasons AS TEXT) AS facility_reasons,
               CAST(p.Submission_Date AS TEXT) AS submission_date,
               CAST(p.Support_Final AS INTEGER) AS support_final,
               CAST(p.Additional_TAFS AS TEXT) AS additional_tafs,
               CAST(p.Project_Discipline AS INTEGER) AS discipline_id,
               CAST(p.Project_Specific_Discipline AS INTEGER) AS specific_discipline_id,
               CAST(p.TAF_Host_Dept AS TEXT) AS host_department,
               CAST(p.Call_Submitted AS TEXT) AS call_submitted,
               CAST(p.Previous_Application AS INTEGER) AS previous_application,
               CAST(p.Previous_Application_Details AS TEXT) AS previous_application_details,
               CAST(p.Group_Leader_Institution AS TEXT) AS group_leader_institution,
               CAST(p.Visit_Funded_Previously AS INTEGER) AS visit_funded_previously,
               CAST(p.Visit_Funded_TAFs AS TEXT) AS visit_funded_tafs,
               CAST(p.Visit_Funded_Details AS TEXT) AS visit_funded_details,
               CAST(u.Gender AS TEXT) AS gender,
               CAST(u.Nationality_Country_code AS TEXT) AS nationality_code,
               CAST(u.Researcher_status AS TEXT) AS researcher_status,
               CAST(u.Home_Institution_Type AS TEXT) AS home_institution_type,
               CAST(u.Home_Institution_Dept AS TEXT) AS home_institution_dept,
               CAST(u.Home_Institution_Name AS TEXT) AS home_institution_name,
               CAST(u.Home_Institution_Town AS TEXT) AS home_institution_town,
               CAST(u.Home_Institution_Country_code AS TEXT) AS home_institution_country_code,
               CAST(u.Home_Institution_Postcode AS TEXT) AS home_institution_postcode,
               CAST(u.Number_of_visits AS INTEGER) AS number_of_visits,
               CAST(u.Duration_of_stays AS INTEGER) AS duration_of_stays,
               CAST(u.jobTitle AS TEXT) AS job_title
        FROM T_List_of_UserProjects p
        LEFT JOIN T_List_of_Users u ON u.User_ID = p.User_ID
        WHERE p.Application_State != 'edit'
        ORDER BY p.UserProject_ID
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(projects)
}

/// `NHM_Application_Scores` row
#[derive(Debug, Clone, FromRow)]
pub struct LegacyScore {
    pub score_id: i64,
    pub project_id: Option<i64>,
    pub methodology: Option<f64>,
    pub research_excellence: Option<f64>,
    pub support_statement: Option<f64>,
    pub justification: Option<f64>,
    pub expected_gains: Option<f64>,
    pub scientific_merit: Option<f64>,
    pub societal_challenge: Option<f64>,
    pub comment: Option<String>,
    pub scored: Option<i64>,
}

pub async fn fetch_scores(conn: &mut SqliteConnection) -> EtlResult<Vec<LegacyScore>> {
    let scores = sqlx::query_as::<_, LegacyScore>(
        r#"
        SELECT PK_App_Score_ID AS score_id,
               CAST(UserProject_ID AS INTEGER) AS project_id,
               CAST(Methodology_Score AS REAL) AS methodology,
               CAST(Research_Excellence_Score AS REAL) AS research_excellence,
               CAST(Support_Stmt_Score AS REAL) AS support_statement,
               CAST(Justification_Score AS REAL) AS justification,
               CAST(Expected_Gains_Score AS REAL) AS expected_gains,
               CAST(Scientific_Merit_Score AS REAL) AS scientific_merit,
               CAST(Societal_Challenge_Score AS REAL) AS societal_challenge,
               CAST(USP_Comment AS TEXT) AS comment,
               CAST(Scored_Flag AS INTEGER) AS scored
        FROM NHM_Application_Scores
        ORDER BY PK_App_Score_ID
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(scores)
}
