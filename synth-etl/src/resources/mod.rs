//! Curated resource files
//!
//! Offline-prepared lookups the migration reads but never writes: institution
//! name cleanup, the user identity map, cached DOI matches with their
//! bibliographic metadata, and the curated access request sheets. All of
//! them are loaded once per run from one directory and handed to every step
//! by reference.
//!
//! A missing file loads as an empty resource; a file that exists but cannot
//! be parsed is an error.

mod dois;
mod institutions;
mod rebuild;
mod users;

pub use dois::{DoiMetadata, OutputDois, WorkAuthor, WorkMetadata};
pub use institutions::InstitutionAliases;
pub use rebuild::{
    AccessRequestRebuild, AccessRequestSheetRow, CategorySheetRow, InstallationFacilitySheetRow,
    InstitutionSheetRow,
};
pub use users::{UserIdentity, Users};

use crate::error::{EtlError, EtlResult};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resource identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Institutions,
    Users,
    OutputDois,
    DoiMetadata,
    AccessRequestRebuild,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Institutions,
        Resource::Users,
        Resource::OutputDois,
        Resource::DoiMetadata,
        Resource::AccessRequestRebuild,
    ];

    /// File (or directory) name inside the resource directory
    pub fn file_name(self) -> &'static str {
        match self {
            Resource::Institutions => "institutions.json",
            Resource::Users => "users.csv",
            Resource::OutputDois => "output_dois.csv",
            Resource::DoiMetadata => "doi_metadata.jsonl",
            Resource::AccessRequestRebuild => "access_request_rebuild",
        }
    }

    pub fn path_in(self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }

    pub(crate) fn error(self, path: &Path, message: impl fmt::Display) -> EtlError {
        EtlError::Resource {
            resource: self,
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Institutions => "institutions",
            Resource::Users => "users",
            Resource::OutputDois => "output DOIs",
            Resource::DoiMetadata => "DOI metadata",
            Resource::AccessRequestRebuild => "access request rebuild",
        };
        f.write_str(name)
    }
}

/// Every resource the fill steps consult
#[derive(Debug, Default)]
pub struct Resources {
    pub institutions: InstitutionAliases,
    pub users: Users,
    pub output_dois: OutputDois,
    pub doi_metadata: DoiMetadata,
    pub rebuild: AccessRequestRebuild,
}

impl Resources {
    /// Load all resources from a directory
    pub fn load(dir: &Path) -> EtlResult<Self> {
        info!(dir = %dir.display(), "Loading resources");

        let resources = Self {
            institutions: InstitutionAliases::load(&Resource::Institutions.path_in(dir))?,
            users: Users::load(&Resource::Users.path_in(dir))?,
            output_dois: OutputDois::load(&Resource::OutputDois.path_in(dir))?,
            doi_metadata: DoiMetadata::load(&Resource::DoiMetadata.path_in(dir))?,
            rebuild: AccessRequestRebuild::load(&Resource::AccessRequestRebuild.path_in(dir))?,
        };

        info!(
            institutions = resources.institutions.len(),
            users = resources.users.len(),
            output_dois = resources.output_dois.len(),
            doi_metadata = resources.doi_metadata.len(),
            access_requests = resources.rebuild.access_requests.len(),
            "Resources loaded"
        );

        Ok(resources)
    }
}

/// Deserialize every row of a headed CSV file; a missing file has no rows
pub(crate) fn read_csv<T: DeserializeOwned>(resource: Resource, path: &Path) -> EtlResult<Vec<T>> {
    if !path.exists() {
        debug!(resource = %resource, path = %path.display(), "Resource file absent, treating as empty");
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| resource.error(path, e))?;

    let mut rows = Vec::new();
    for result in reader.deserialize::<T>() {
        rows.push(result.map_err(|e| resource.error(path, e))?);
    }
    Ok(rows)
}
