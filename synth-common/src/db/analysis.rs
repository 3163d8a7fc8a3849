//! Unified analysis schema
//!
//! Table declaration order is dependency order: every table only references
//! tables declared before it. Creation walks the list forwards, dropping walks
//! it backwards.

use super::schema::{ColumnDefinition, TableDefinition};

/// Tables of the analysis schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetTable {
    Round,
    Call,
    Country,
    Discipline,
    SpecificDiscipline,
    Output,
    VisitorProject,
    EvaluationScore,
    Category,
    Institution,
    InstallationFacility,
    AccessRequest,
}

impl TargetTable {
    /// All tables in dependency order
    pub const ALL: [TargetTable; 12] = [
        TargetTable::Round,
        TargetTable::Call,
        TargetTable::Country,
        TargetTable::Discipline,
        TargetTable::SpecificDiscipline,
        TargetTable::Output,
        TargetTable::VisitorProject,
        TargetTable::EvaluationScore,
        TargetTable::Category,
        TargetTable::Institution,
        TargetTable::InstallationFacility,
        TargetTable::AccessRequest,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TargetTable::Round => "Round",
            TargetTable::Call => "Call",
            TargetTable::Country => "Country",
            TargetTable::Discipline => "Discipline",
            TargetTable::SpecificDiscipline => "SpecificDiscipline",
            TargetTable::Output => "Output",
            TargetTable::VisitorProject => "VisitorProject",
            TargetTable::EvaluationScore => "EvaluationScore",
            TargetTable::Category => "Category",
            TargetTable::Institution => "Institution",
            TargetTable::InstallationFacility => "InstallationFacility",
            TargetTable::AccessRequest => "AccessRequest",
        }
    }

    pub fn definition(self) -> TableDefinition {
        let id = || ColumnDefinition::new("id", "INTEGER").primary_key();
        let text = |name: &str| ColumnDefinition::new(name, "TEXT");
        let integer = |name: &str| ColumnDefinition::new(name, "INTEGER");
        let boolean = |name: &str| ColumnDefinition::new(name, "BOOLEAN");
        let real = |name: &str| ColumnDefinition::new(name, "REAL");
        let timestamp = |name: &str| ColumnDefinition::new(name, "TIMESTAMP");

        let columns = match self {
            TargetTable::Round => vec![
                id(),
                text("name"),
                timestamp("start_date"),
                timestamp("end_date"),
            ],
            TargetTable::Call => vec![
                id(),
                integer("round").not_null().references("Round"),
                integer("call_number"),
                timestamp("start_date"),
                timestamp("end_date"),
            ],
            TargetTable::Country => vec![
                id(),
                ColumnDefinition::new("code", "TEXT").not_null().unique(),
                text("name"),
            ],
            TargetTable::Discipline => vec![id(), text("name")],
            TargetTable::SpecificDiscipline => vec![
                id(),
                text("name"),
                integer("discipline").not_null().references("Discipline"),
            ],
            TargetTable::Output => vec![
                id(),
                integer("round").not_null().references("Round"),
                text("output_type"),
                text("authors"),
                integer("year"),
                text("title"),
                text("publisher"),
                text("url"),
                text("publication_status"),
                text("volume"),
                text("pages"),
                text("conference"),
                text("degree"),
                text("updated"),
                text("doi"),
            ],
            TargetTable::VisitorProject => vec![
                id(),
                integer("round").not_null().references("Round"),
                integer("call").references("Call"),
                text("user_guid").not_null(),
                text("user_age_range"),
                text("title"),
                text("objectives"),
                text("achievements"),
                integer("length_of_visit"),
                timestamp("start_date"),
                timestamp("finish_date"),
                boolean("host_contacted"),
                boolean("home_facilities"),
                text("access_need"),
                text("training_requirement"),
                text("supporter_institution"),
                text("supporter_position"),
                text("support_statement"),
                boolean("support_requested"),
                text("application_state"),
                text("administration_state"),
                boolean("acceptance"),
                boolean("group_leader"),
                text("group_members"),
                text("summary"),
                text("background"),
                text("reasons"),
                text("expectations"),
                text("outputs"),
                boolean("new_user"),
                text("visited_details"),
                text("visited_link"),
                text("facility_reasons"),
                text("submission_date"),
                boolean("support_final"),
                text("additional_tafs"),
                integer("discipline").references("Discipline"),
                integer("specific_discipline").references("SpecificDiscipline"),
                text("host_department"),
                boolean("previous_application"),
                text("previous_application_details"),
                text("group_leader_institution"),
                boolean("visit_funded_previously"),
                text("visit_funded_tafs"),
                text("visit_funded_details"),
                text("gender"),
                integer("nationality").references("Country"),
                text("researcher_status"),
                text("home_institution_type"),
                text("home_institution_dept"),
                text("home_institution_name"),
                text("home_institution_town"),
                integer("home_institution_country").references("Country"),
                text("home_institution_postcode"),
                integer("number_of_visits"),
                integer("duration_of_stays"),
                text("job_title"),
            ],
            TargetTable::EvaluationScore => vec![
                id(),
                integer("visitor_project").not_null().references("VisitorProject"),
                real("methodology"),
                real("research_excellence"),
                real("support_statement"),
                real("justification"),
                real("expected_gains"),
                real("scientific_merit"),
                real("societal_challenge"),
                text("comment"),
                integer("scored"),
            ],
            TargetTable::Category => vec![id(), text("name")],
            TargetTable::Institution => vec![
                id(),
                text("name"),
                integer("country").references("Country"),
            ],
            TargetTable::InstallationFacility => vec![
                id(),
                text("name"),
                text("description"),
                integer("category").not_null().references("Category"),
                integer("institution").not_null().references("Institution"),
            ],
            TargetTable::AccessRequest => vec![
                id(),
                integer("visitor_project").not_null().references("VisitorProject"),
                integer("installation_facility")
                    .not_null()
                    .references("InstallationFacility"),
                text("request"),
            ],
        };

        TableDefinition::new(self.name(), columns)
    }
}

/// All analysis table definitions in dependency order
pub fn analysis_tables() -> Vec<TableDefinition> {
    TargetTable::ALL.iter().map(|t| t.definition()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tables_only_reference_earlier_tables() {
        let mut seen = HashSet::new();
        for table in analysis_tables() {
            for dependency in table.dependencies() {
                assert!(
                    seen.contains(dependency),
                    "{} references {} which is declared later",
                    table.name,
                    dependency
                );
            }
            seen.insert(table.name.clone());
        }
    }

    #[test]
    fn test_every_table_has_integer_primary_key() {
        for table in analysis_tables() {
            let id = table.columns.iter().find(|c| c.name == "id").expect("id column");
            assert!(id.primary_key, "{} id is not a primary key", table.name);
            assert_eq!(id.sql_type, "INTEGER");
        }
    }

    #[test]
    fn test_table_names_unique() {
        let names: HashSet<&str> = TargetTable::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(names.len(), TargetTable::ALL.len());
    }
}
