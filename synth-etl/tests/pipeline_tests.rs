//! End-to-end pipeline tests against real SQLite databases

mod helpers;

use async_trait::async_trait;
use helpers::TestEnv;
use synth_common::db::{SchemaIntrospector, TargetTable};
use synth_common::SynthRound;
use synth_etl::steps::*;
use synth_etl::{EtlError, EtlResult, LegacyTable, Step, StepContext, TranslationTable};

#[tokio::test]
async fn test_rebuild_without_data_creates_empty_schema() {
    let env = TestEnv::new().await;

    let summary = env.pipeline().rebuild(false).await.unwrap();
    assert_eq!(summary.steps.len(), 2);
    assert_eq!(summary.translations, 0);

    let mut conn = env.target().await;
    for table in TargetTable::ALL {
        assert!(
            SchemaIntrospector::table_exists(&mut conn, table.name()).await.unwrap(),
            "{} missing",
            table.name()
        );
        assert_eq!(
            SchemaIntrospector::count_rows(&mut conn, table.name()).await.unwrap(),
            0,
            "{} not empty",
            table.name()
        );
    }
}

#[tokio::test]
async fn test_schema_steps_are_idempotent() {
    let env = TestEnv::new().await;
    let mut translations = TranslationTable::new();

    env.run_steps(
        &[
            &ClearTargetSchema,
            &ClearTargetSchema,
            &CreateTargetSchema,
            &CreateTargetSchema,
        ],
        &mut translations,
    )
    .await
    .unwrap();

    // A second full rebuild drops and recreates over an existing schema
    env.pipeline().rebuild(false).await.unwrap();
    env.pipeline().rebuild(false).await.unwrap();

    let mut conn = env.target().await;
    let tables = SchemaIntrospector::list_tables(&mut conn).await.unwrap();
    assert_eq!(tables.len(), TargetTable::ALL.len());
}

#[tokio::test]
async fn test_fill_call_orders_by_call_number() {
    let env = TestEnv::new().await;
    env.legacy(
        SynthRound::One,
        "INSERT INTO NHM_Call VALUES (10, 3, '2005-06-01', '2005-08-31'), \
         (11, 1, '2004-01-01', '2004-03-31'), (12, 2, '2004-09-01', '2004-11-30')",
    )
    .await;
    env.legacy(SynthRound::Two, "INSERT INTO NHM_Call VALUES (1, 1, '2006-01-01', '2006-03-31')")
        .await;

    let mut translations = TranslationTable::new();
    env.run_steps(
        &[&ClearTargetSchema, &CreateTargetSchema, &FillRound, &FillCall],
        &mut translations,
    )
    .await
    .unwrap();

    let mut conn = env.target().await;
    let calls: Vec<(i64, i64, i64)> =
        sqlx::query_as("SELECT id, round, call_number FROM \"Call\" ORDER BY id")
            .fetch_all(&mut conn)
            .await
            .unwrap();
    assert_eq!(calls, vec![(1, 1, 1), (2, 1, 2), (3, 1, 3), (4, 2, 1)]);

    assert_eq!(translations.translate(LegacyTable::Call, 11, SynthRound::One), Some(1));
    assert_eq!(translations.translate(LegacyTable::Call, 12, SynthRound::One), Some(2));
    assert_eq!(translations.translate(LegacyTable::Call, 10, SynthRound::One), Some(3));
    assert_eq!(translations.translate(LegacyTable::Call, 1, SynthRound::Two), Some(4));

    let (name, start): (String, String) =
        sqlx::query_as("SELECT name, CAST(start_date AS TEXT) FROM \"Round\" WHERE id = 1")
            .fetch_one(&mut conn)
            .await
            .unwrap();
    assert_eq!(name, "Synthesys 1");
    assert!(start.starts_with("2004-01-01"));
}

#[tokio::test]
async fn test_fill_call_skips_rows_without_call_id() {
    let env = TestEnv::new().await;
    env.legacy(SynthRound::Three, "DROP TABLE NHM_Call").await;
    env.legacy(
        SynthRound::Three,
        "CREATE TABLE NHM_Call (callID INTEGER, call INTEGER, dateOpen TEXT, dateClosed TEXT)",
    )
    .await;
    env.legacy(
        SynthRound::Three,
        "INSERT INTO NHM_Call VALUES (NULL, 1, '2007-01-01', '2007-03-31'), \
         (7, 2, '2007-09-01', '2007-11-30')",
    )
    .await;

    let mut translations = TranslationTable::new();
    env.run_steps(
        &[&ClearTargetSchema, &CreateTargetSchema, &FillRound, &FillCall],
        &mut translations,
    )
    .await
    .unwrap();

    let mut conn = env.target().await;
    let calls: Vec<(i64, i64, i64)> =
        sqlx::query_as("SELECT id, round, call_number FROM \"Call\" ORDER BY id")
            .fetch_all(&mut conn)
            .await
            .unwrap();
    assert_eq!(calls, vec![(1, 3, 2)]);
    assert_eq!(translations.translate(LegacyTable::Call, 7, SynthRound::Three), Some(1));
}

#[tokio::test]
async fn test_specific_discipline_merged_across_rounds() {
    let env = TestEnv::new().await;
    env.legacy_all("INSERT INTO NHM_Disciplines VALUES (1, 'Life Sciences')").await;
    for round in SynthRound::chronological() {
        env.legacy(
            round,
            &format!(
                "INSERT INTO NHM_Specific_Disciplines VALUES ({}, 'Entomology', 1)",
                round.value() * 10
            ),
        )
        .await;
    }

    let mut translations = TranslationTable::new();
    env.run_steps(
        &[
            &ClearTargetSchema,
            &CreateTargetSchema,
            &FillDiscipline,
            &FillSpecificDiscipline,
        ],
        &mut translations,
    )
    .await
    .unwrap();

    assert_eq!(env.count("SpecificDiscipline").await, 1);
    for round in SynthRound::chronological() {
        assert_eq!(
            translations.translate(LegacyTable::SpecificDiscipline, round.value() * 10, round),
            Some(1)
        );
    }
}

#[tokio::test]
async fn test_specific_discipline_parent_mismatch_aborts_step() {
    let env = TestEnv::new().await;
    env.legacy_all("INSERT INTO NHM_Disciplines VALUES (1, 'Botany'), (2, 'Zoology')")
        .await;
    env.legacy(
        SynthRound::Four,
        "INSERT INTO NHM_Specific_Disciplines VALUES (3, 'Systematics', 1)",
    )
    .await;
    env.legacy(
        SynthRound::Two,
        "INSERT INTO NHM_Specific_Disciplines VALUES (7, 'Systematics', 2)",
    )
    .await;

    let mut translations = TranslationTable::new();
    env.run_steps(
        &[&ClearTargetSchema, &CreateTargetSchema, &FillDiscipline],
        &mut translations,
    )
    .await
    .unwrap();

    let err = env
        .run_steps(&[&FillSpecificDiscipline], &mut translations)
        .await
        .unwrap_err();

    match err {
        EtlError::SpecificDisciplineParentMismatch {
            round,
            specific_discipline_id,
            discipline_id,
            added_round,
            added_discipline_id,
            ..
        } => {
            assert_eq!(round, SynthRound::Two);
            assert_eq!(specific_discipline_id, 7);
            assert_eq!(discipline_id, 2);
            assert_eq!(added_round, SynthRound::Four);
            assert_eq!(added_discipline_id, 1);
        }
        other => panic!("unexpected error: {}", other),
    }

    // The row added before the conflict was rolled back with the step
    assert_eq!(env.count("SpecificDiscipline").await, 0);
    assert_eq!(env.count("Discipline").await, 2);
}

#[tokio::test]
async fn test_failed_rebuild_names_step_and_keeps_earlier_steps() {
    let env = TestEnv::new().await;
    env.legacy_all("INSERT INTO NHM_Disciplines VALUES (1, 'Botany'), (2, 'Zoology')")
        .await;
    env.legacy(SynthRound::Four, "INSERT INTO NHM_Specific_Disciplines VALUES (1, 'Algae', 1)")
        .await;
    env.legacy(SynthRound::One, "INSERT INTO NHM_Specific_Disciplines VALUES (1, 'Algae', 2)")
        .await;

    let err = env.pipeline().rebuild(true).await.unwrap_err();

    match &err {
        EtlError::Step { step, .. } => assert_eq!(step, "Filling SpecificDiscipline table"),
        other => panic!("unexpected error: {}", other),
    }
    assert!(matches!(
        err.root(),
        EtlError::SpecificDisciplineParentMismatch { .. }
    ));

    assert_eq!(env.count("Round").await, 4);
    assert_eq!(env.count("Discipline").await, 2);
    assert_eq!(env.count("SpecificDiscipline").await, 0);
    assert_eq!(env.count("Output").await, 0);
}

struct InsertThenFail;

#[async_trait]
impl Step for InsertThenFail {
    fn message(&self) -> String {
        "Inserting then failing".to_string()
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> EtlResult<()> {
        sqlx::query("INSERT INTO \"Discipline\" (id, name) VALUES (1, 'Doomed')")
            .execute(&mut *ctx.target)
            .await?;
        ctx.translations
            .require(LegacyTable::Discipline, 99, SynthRound::One)
            .map(|_| ())
    }
}

#[tokio::test]
async fn test_failed_step_is_rolled_back() {
    let env = TestEnv::new().await;
    let mut translations = TranslationTable::new();
    env.run_steps(&[&ClearTargetSchema, &CreateTargetSchema], &mut translations)
        .await
        .unwrap();

    let err = env
        .run_steps(&[&InsertThenFail], &mut translations)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EtlError::MissingTranslation {
            table: LegacyTable::Discipline,
            ..
        }
    ));
    assert_eq!(env.count("Discipline").await, 0);
}

/// Legacy content shared by the full rebuild scenarios
async fn seed_round_one(env: &TestEnv) {
    env.legacy_all("INSERT INTO NHM_Disciplines VALUES (1, 'Earth Sciences')").await;
    env.legacy_all("INSERT INTO NHM_Specific_Disciplines VALUES (4, 'Mineralogy', 1)")
        .await;
    env.legacy_all("INSERT INTO NHM_OutputTypes VALUES (1, 'Journal article')").await;
    env.legacy_all("INSERT INTO NHM_PublicationStatus VALUES (2, 'Published')").await;
    env.legacy(
        SynthRound::One,
        "INSERT INTO NHM_Call VALUES (21, 2, '2005-01-01', '2005-03-01'), \
         (20, 1, '2004-01-01', '2004-03-01')",
    )
    .await;
    env.legacy(
        SynthRound::One,
        "INSERT INTO T_List_of_Users (User_ID, Gender, Nationality_Country_code, \
         Home_Institution_Name, Home_Institution_Country_code) VALUES \
         (100, 'F', 'gb', 'NHM London', 'NL'), (101, 'M', 'XX', NULL, NULL)",
    )
    .await;
    env.legacy(
        SynthRound::One,
        "INSERT INTO T_List_of_UserProjects (UserProject_ID, User_ID, UserProject_Title, \
         Application_State, Call_Submitted, Project_Discipline, Project_Specific_Discipline, \
         TAF_Host_Contacted, start_date) VALUES \
         (1, 100, 'Crystal habits', 'submitted', '2', 1, 4, 1, '2004-05-01'), \
         (2, 101, 'Unconsented', 'submitted', NULL, 0, 0, 0, NULL), \
         (3, 100, 'Draft', 'edit', NULL, NULL, NULL, NULL, NULL)",
    )
    .await;
    env.legacy(
        SynthRound::One,
        "INSERT INTO NHM_Application_Scores (PK_App_Score_ID, UserProject_ID, \
         Methodology_Score, USP_Comment, Scored_Flag) VALUES \
         (1, 1, 4.5, 'Strong', 1), (2, 2, 1.0, 'Not migrated', 1)",
    )
    .await;
    env.legacy(
        SynthRound::One,
        "INSERT INTO NHM_Outputs (Output_ID, User_ID, OutputType_ID, Authors, Year, Title, \
         PublicationStatus_ID, Publisher) VALUES \
         (1, 100, 1, ' Smith,\n J. ', '2007.0', '<b>Quartz</b> &amp; feldspar', 2, 'Old'), \
         (2, 100, 9, 'Jones', 'in press', 'Calcite', NULL, NULL)",
    )
    .await;

    env.write_users("guid-a,100,,,,30-39,,,\n");
    env.write_resource(
        "institutions.json",
        r#"{"NHM London": "Natural History Museum"}"#,
    );
    env.write_resource("output_dois.csv", "round,output_id,doi\n1,1,10.1000/QTZ\n");
    env.write_resource(
        "doi_metadata.jsonl",
        r#"{"DOI": "10.1000/qtz", "author": [{"given": "Jane", "family": "Smith"}], "issued": {"date-parts": [[2008, 2]]}, "title": ["Quartz and feldspar"], "volume": "12"}"#,
    );
    env.write_resource("access_request_rebuild/Category.csv", "id,name\n7,Imaging\n");
    env.write_resource(
        "access_request_rebuild/Institution.csv",
        "id,name,country_code\n3,Natural History Museum,GB\n4,Nowhere,ZZ\n",
    );
    env.write_resource(
        "access_request_rebuild/InstallationFacility.csv",
        "id,name,description,category_id,institution_id\n9,Micro-CT,X-ray,7,3\n",
    );
    env.write_resource(
        "access_request_rebuild/AccessRequest.csv",
        "round,project_id,installation_facility_id,request\n1,1,9,2 days\n1,2,9,ignored\n",
    );
}

#[tokio::test]
async fn test_full_rebuild() {
    let env = TestEnv::new().await;
    seed_round_one(&env).await;

    let summary = env.pipeline().rebuild(true).await.unwrap();
    assert_eq!(summary.steps.len(), 15);
    assert!(summary.translations > 0);

    assert_eq!(env.count("Round").await, 4);
    assert_eq!(env.count("Call").await, 2);
    assert_eq!(env.count("Discipline").await, 1);
    assert_eq!(env.count("SpecificDiscipline").await, 1);
    assert_eq!(env.count("Output").await, 2);
    assert_eq!(env.count("Category").await, 1);
    assert_eq!(env.count("Institution").await, 2);
    assert_eq!(env.count("InstallationFacility").await, 1);

    let mut conn = env.target().await;

    // Only the identified, submitted project is migrated
    let projects: Vec<(i64, String, Option<String>, Option<i64>, Option<i64>, Option<String>, Option<bool>)> =
        sqlx::query_as(
            "SELECT id, user_guid, user_age_range, \"call\", specific_discipline, \
             home_institution_name, host_contacted FROM VisitorProject",
        )
        .fetch_all(&mut conn)
        .await
        .unwrap();
    assert_eq!(projects.len(), 1);
    let (id, guid, age, call, specific, institution, host_contacted) = projects[0].clone();
    assert_eq!(id, 1);
    assert_eq!(guid, "guid-a");
    assert_eq!(age.as_deref(), Some("30-39"));
    // Position 2 is legacy call 21, the second call by number
    assert_eq!(call, Some(2));
    assert_eq!(specific, Some(1));
    assert_eq!(institution.as_deref(), Some("Natural History Museum"));
    assert_eq!(host_contacted, Some(true));

    let (nationality, home_country): (Option<String>, Option<String>) = sqlx::query_as(
        "SELECT n.code, h.code FROM VisitorProject p \
         LEFT JOIN Country n ON n.id = p.nationality \
         LEFT JOIN Country h ON h.id = p.home_institution_country",
    )
    .fetch_one(&mut conn)
    .await
    .unwrap();
    assert_eq!(nationality.as_deref(), Some("GB"));
    assert_eq!(home_country.as_deref(), Some("NL"));

    // Scores follow their projects
    let scores: Vec<(i64, Option<f64>)> =
        sqlx::query_as("SELECT visitor_project, methodology FROM EvaluationScore")
            .fetch_all(&mut conn)
            .await
            .unwrap();
    assert_eq!(scores, vec![(1, Some(4.5))]);

    // Enriched from the DOI cache
    let enriched: (Option<String>, Option<i64>, Option<String>, Option<String>, Option<String>, Option<String>, Option<String>) =
        sqlx::query_as(
            "SELECT authors, year, title, publisher, volume, doi, output_type FROM Output WHERE id = 1",
        )
        .fetch_one(&mut conn)
        .await
        .unwrap();
    assert_eq!(enriched.0.as_deref(), Some("Jane Smith"));
    assert_eq!(enriched.1, Some(2008));
    assert_eq!(enriched.2.as_deref(), Some("Quartz and feldspar"));
    assert_eq!(enriched.3.as_deref(), Some("Old"));
    assert_eq!(enriched.4.as_deref(), Some("12"));
    assert_eq!(enriched.5.as_deref(), Some("10.1000/QTZ"));
    assert_eq!(enriched.6.as_deref(), Some("Journal article"));

    // Cleaned but not enriched; unknown type and unparseable year are empty
    let plain: (Option<String>, Option<i64>, Option<String>, Option<String>) =
        sqlx::query_as("SELECT authors, year, output_type, doi FROM Output WHERE id = 2")
            .fetch_one(&mut conn)
            .await
            .unwrap();
    assert_eq!(plain, (Some("Jones".to_string()), None, None, None));

    // Institution with an unknown country keeps an empty country
    let countries: Vec<(String, Option<i64>)> =
        sqlx::query_as("SELECT name, country FROM Institution ORDER BY id")
            .fetch_all(&mut conn)
            .await
            .unwrap();
    assert!(countries[0].1.is_some());
    assert_eq!(countries[1].1, None);

    // The request for the unmigrated project is dropped
    let requests: Vec<(i64, i64, Option<String>)> = sqlx::query_as(
        "SELECT visitor_project, installation_facility, request FROM AccessRequest",
    )
    .fetch_all(&mut conn)
    .await
    .unwrap();
    assert_eq!(requests, vec![(1, 1, Some("2 days".to_string()))]);
}

#[tokio::test]
async fn test_project_without_guid_is_skipped() {
    let env = TestEnv::new().await;
    seed_round_one(&env).await;
    // Nobody is identified
    env.write_users("");

    env.pipeline().rebuild(true).await.unwrap();

    assert_eq!(env.count("VisitorProject").await, 0);
    assert_eq!(env.count("EvaluationScore").await, 0);
    assert_eq!(env.count("AccessRequest").await, 0);
}

#[tokio::test]
async fn test_call_position_out_of_range_is_fatal() {
    let env = TestEnv::new().await;
    seed_round_one(&env).await;
    env.legacy(
        SynthRound::One,
        "UPDATE T_List_of_UserProjects SET Call_Submitted = '5' WHERE UserProject_ID = 1",
    )
    .await;

    let err = env.pipeline().rebuild(true).await.unwrap_err();

    assert!(matches!(
        err.root(),
        EtlError::CallPositionOutOfRange { position: 5, calls: 2, .. }
    ));
    assert_eq!(env.count("VisitorProject").await, 0);
}
