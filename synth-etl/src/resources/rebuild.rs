//! Curated access request sheets
//!
//! The access request data in the legacy databases could not be trusted, so
//! it was rebuilt by hand into four sheets. Sheet ids are local to the sheets
//! and only used to link rows between them.

use super::{read_csv, Resource};
use crate::error::EtlResult;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct CategorySheetRow {
    pub id: i64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstitutionSheetRow {
    pub id: i64,
    pub name: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallationFacilitySheetRow {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: i64,
    pub institution_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessRequestSheetRow {
    pub round: i64,
    pub project_id: i64,
    pub installation_facility_id: i64,
    pub request: Option<String>,
}

#[derive(Debug, Default)]
pub struct AccessRequestRebuild {
    pub categories: Vec<CategorySheetRow>,
    pub institutions: Vec<InstitutionSheetRow>,
    pub installation_facilities: Vec<InstallationFacilitySheetRow>,
    pub access_requests: Vec<AccessRequestSheetRow>,
}

impl AccessRequestRebuild {
    pub const CATEGORY_SHEET: &'static str = "Category.csv";
    pub const INSTITUTION_SHEET: &'static str = "Institution.csv";
    pub const INSTALLATION_FACILITY_SHEET: &'static str = "InstallationFacility.csv";
    pub const ACCESS_REQUEST_SHEET: &'static str = "AccessRequest.csv";

    /// Load every sheet from the rebuild directory; an absent sheet is empty
    pub fn load(dir: &Path) -> EtlResult<Self> {
        let resource = Resource::AccessRequestRebuild;
        Ok(Self {
            categories: read_csv(resource, &dir.join(Self::CATEGORY_SHEET))?,
            institutions: read_csv(resource, &dir.join(Self::INSTITUTION_SHEET))?,
            installation_facilities: read_csv(
                resource,
                &dir.join(Self::INSTALLATION_FACILITY_SHEET),
            )?,
            access_requests: read_csv(resource, &dir.join(Self::ACCESS_REQUEST_SHEET))?,
        })
    }
}
