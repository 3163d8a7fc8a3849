//! Test fixtures: four legacy synth round databases and a resource directory
//!
//! Every test gets its own temp directory holding `synth{1..4}.db`, an empty
//! `resources/` folder and the target `analysis.db` (created on first use).

#![allow(dead_code)]

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection, SqliteConnection};
use std::path::PathBuf;
use std::str::FromStr;
use synth_common::config::SynthConfig;
use synth_common::SynthRound;
use synth_etl::{Pipeline, Resources, SessionManager, Step, TranslationTable};
use tempfile::TempDir;

/// Legacy schema, identical in every round
const LEGACY_SCHEMA: &[&str] = &[
    "CREATE TABLE NHM_Call (callID INTEGER PRIMARY KEY, call INTEGER, dateOpen TEXT, dateClosed TEXT)",
    "CREATE TABLE NHM_Disciplines (DisciplineID INTEGER PRIMARY KEY, DisciplineName TEXT)",
    "CREATE TABLE NHM_Specific_Disciplines (SpecificDisciplineID INTEGER PRIMARY KEY, SpecificDisciplineName TEXT, DisciplineID INTEGER)",
    "CREATE TABLE NHM_OutputTypes (OutputType_ID INTEGER PRIMARY KEY, OutputType TEXT)",
    "CREATE TABLE NHM_PublicationStatus (PublicationStatus_ID INTEGER PRIMARY KEY, PublicationStatus TEXT)",
    r#"CREATE TABLE NHM_Outputs (
        Output_ID INTEGER PRIMARY KEY, User_ID INTEGER, OutputType_ID INTEGER, Authors TEXT,
        Year TEXT, Title TEXT, Publisher TEXT, URL TEXT, PublicationStatus_ID INTEGER,
        Volume TEXT, Pages TEXT, Conference TEXT, Degree TEXT, UpdatedDate TEXT)"#,
    r#"CREATE TABLE T_List_of_Users (
        User_ID INTEGER PRIMARY KEY, Gender TEXT, Nationality_Country_code TEXT,
        Researcher_status TEXT, Home_Institution_Type TEXT, Home_Institution_Dept TEXT,
        Home_Institution_Name TEXT, Home_Institution_Town TEXT,
        Home_Institution_Country_code TEXT, Home_Institution_Postcode TEXT,
        Number_of_visits INTEGER, Duration_of_stays INTEGER, jobTitle TEXT)"#,
    r#"CREATE TABLE T_List_of_UserProjects (
        UserProject_ID INTEGER PRIMARY KEY, User_ID INTEGER, UserProject_Title TEXT,
        UserProject_Objectives TEXT, UserProject_Achievements TEXT, length_of_visit INTEGER,
        start_date TEXT, finish_date TEXT, TAF_Host_Contacted INTEGER, Home_Facilities INTEGER,
        TAF_access_need TEXT, Training_Requirement TEXT, Supporter_Institution TEXT,
        Supporter_Position TEXT, Support_Statement TEXT, Support_Requested INTEGER,
        Application_State TEXT, Administration_State TEXT, Acceptance INTEGER,
        Group_leader INTEGER, Group_Members TEXT, UserProject_Summary TEXT,
        UserProject_Background TEXT, UserProject_Reasons TEXT, UserProject_Expectations TEXT,
        UserProject_Outputs TEXT, New_User INTEGER, Visited_Details TEXT, Visited_Link TEXT,
        UserProject_Facility_Reasons TEXT, Submission_Date TEXT, Support_Final INTEGER,
        Additional_TAFS TEXT, Project_Discipline INTEGER, Project_Specific_Discipline INTEGER,
        TAF_Host_Dept TEXT, Call_Submitted TEXT, Previous_Application INTEGER,
        Previous_Application_Details TEXT, Group_Leader_Institution TEXT,
        Visit_Funded_Previously INTEGER, Visit_Funded_TAFs TEXT, Visit_Funded_Details TEXT)"#,
    r#"CREATE TABLE NHM_Application_Scores (
        PK_App_Score_ID INTEGER PRIMARY KEY, UserProject_ID INTEGER, Methodology_Score REAL,
        Research_Excellence_Score REAL, Support_Stmt_Score REAL, Justification_Score REAL,
        Expected_Gains_Score REAL, Scientific_Merit_Score REAL, Societal_Challenge_Score REAL,
        USP_Comment TEXT, Scored_Flag INTEGER)"#,
];

pub const USERS_HEADER: &str = "GUID,synth1,synth2,synth3,synth4,synth round 1 age,synth round 2 age,synth round 3 age,synth round 4 age\n";

pub struct TestEnv {
    pub dir: TempDir,
    pub config: SynthConfig,
}

impl TestEnv {
    /// Four empty legacy databases and an empty resource directory
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let resources = dir.path().join("resources");
        std::fs::create_dir_all(&resources).unwrap();

        let mut sources = Vec::new();
        for round in SynthRound::chronological() {
            let path = dir.path().join(format!("synth{}.db", round.value()));
            let mut conn = SqliteConnectOptions::from_str(&url(&path))
                .unwrap()
                .create_if_missing(true)
                .connect()
                .await
                .unwrap();
            for ddl in LEGACY_SCHEMA {
                sqlx::query(ddl).execute(&mut conn).await.unwrap();
            }
            conn.close().await.unwrap();
            sources.push(url(&path));
        }

        let target = url(&dir.path().join("analysis.db"));
        let config = SynthConfig::new(sources, target, resources);
        Self { dir, config }
    }

    /// Run SQL against one round's legacy database
    pub async fn legacy(&self, round: SynthRound, sql: &str) {
        let mut conn = SqliteConnection::connect(self.config.source(round)).await.unwrap();
        sqlx::query(sql).execute(&mut conn).await.unwrap();
        conn.close().await.unwrap();
    }

    /// Run the same SQL against every round's legacy database
    pub async fn legacy_all(&self, sql: &str) {
        for round in SynthRound::chronological() {
            self.legacy(round, sql).await;
        }
    }

    pub fn resource_path(&self, name: &str) -> PathBuf {
        self.config.resources.join(name)
    }

    pub fn write_resource(&self, name: &str, contents: &str) {
        let path = self.resource_path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    pub fn write_users(&self, rows: &str) {
        self.write_resource("users.csv", &format!("{}{}", USERS_HEADER, rows));
    }

    pub fn resources(&self) -> Resources {
        Resources::load(&self.config.resources).unwrap()
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::from_config(&self.config).unwrap()
    }

    pub fn sessions(&self) -> SessionManager {
        SessionManager::new(&self.config)
    }

    /// Run steps one after another through the session manager
    pub async fn run_steps(
        &self,
        steps: &[&dyn Step],
        translations: &mut TranslationTable,
    ) -> synth_etl::EtlResult<()> {
        let resources = self.resources();
        let sessions = self.sessions();
        for step in steps {
            sessions.run_step(*step, translations, &resources).await?;
        }
        Ok(())
    }

    /// Open the analysis database for assertions
    pub async fn target(&self) -> SqliteConnection {
        SqliteConnection::connect(&self.config.target).await.unwrap()
    }

    pub async fn count(&self, table: &str) -> i64 {
        let mut conn = self.target().await;
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM \"{}\"", table))
            .fetch_one(&mut conn)
            .await
            .unwrap();
        conn.close().await.unwrap();
        count
    }
}

fn url(path: &std::path::Path) -> String {
    format!("sqlite://{}", path.display())
}
