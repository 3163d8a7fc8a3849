//! Pipeline steps
//!
//! Schema lifecycle first, then reference data, then fact tables. Every
//! table referenced by a foreign key is filled, with its translations
//! registered, before the table that references it.

mod access_request;
mod evaluation;
mod output;
mod reference;
mod schema;
mod specific_discipline;
mod visitor_project;

pub use access_request::{FillAccessRequest, FillCategory, FillInstallationFacility, FillInstitution};
pub use evaluation::FillEvaluationScore;
pub use output::{CleanOutputs, FillOutput};
pub use reference::{FillCall, FillCountry, FillDiscipline, FillRound};
pub use schema::{ClearTargetSchema, CreateTargetSchema};
pub use specific_discipline::FillSpecificDiscipline;
pub use visitor_project::FillVisitorProject;
