//! Cached DOI matches and their bibliographic metadata
//!
//! Both caches are filled by an offline matching job; the migration only
//! reads them. A legacy output with no cached DOI, or a DOI with no cached
//! metadata, is simply left alone.

use super::{read_csv, Resource};
use crate::error::EtlResult;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;
use synth_common::SynthRound;

#[derive(Debug, Deserialize)]
struct OutputDoiRow {
    round: i64,
    output_id: i64,
    doi: String,
}

/// Best-match DOI per legacy (round, output id)
#[derive(Debug, Default)]
pub struct OutputDois {
    dois: HashMap<(SynthRound, i64), String>,
}

impl OutputDois {
    pub fn load(path: &Path) -> EtlResult<Self> {
        let resource = Resource::OutputDois;
        let rows: Vec<OutputDoiRow> = read_csv(resource, path)?;

        let mut output_dois = Self::default();
        for row in rows {
            let round = SynthRound::try_from(row.round).map_err(|e| resource.error(path, e))?;
            output_dois.insert(round, row.output_id, row.doi);
        }
        Ok(output_dois)
    }

    pub fn insert(&mut self, round: SynthRound, output_id: i64, doi: String) {
        let doi = doi.trim().to_string();
        if !doi.is_empty() {
            self.dois.insert((round, output_id), doi);
        }
    }

    /// All cached matches as ((round, legacy output id), DOI)
    pub fn iter(&self) -> impl Iterator<Item = (&(SynthRound, i64), &str)> {
        self.dois.iter().map(|(key, doi)| (key, doi.as_str()))
    }

    pub fn len(&self) -> usize {
        self.dois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dois.is_empty()
    }
}

/// Crossref author entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkAuthor {
    pub given: Option<String>,
    pub family: Option<String>,
    pub name: Option<String>,
}

impl WorkAuthor {
    /// "Given Family", falling back to an organisational name
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.given.as_deref(), self.family.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            self.name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
        } else {
            Some(parts.join(" "))
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkDate {
    #[serde(rename = "date-parts", default)]
    pub date_parts: Vec<Vec<Option<i64>>>,
}

/// The subset of a Crossref work record used to enrich outputs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkMetadata {
    #[serde(rename = "DOI")]
    pub doi: String,
    #[serde(default)]
    pub author: Vec<WorkAuthor>,
    pub issued: Option<WorkDate>,
    #[serde(default)]
    pub title: Vec<String>,
    pub publisher: Option<String>,
    #[serde(rename = "URL")]
    pub url: Option<String>,
    pub volume: Option<String>,
    pub page: Option<String>,
}

impl WorkMetadata {
    /// Authors joined as "Given Family, Given Family"
    pub fn authors(&self) -> Option<String> {
        let names: Vec<String> = self.author.iter().filter_map(WorkAuthor::display_name).collect();
        if names.is_empty() {
            None
        } else {
            Some(names.join(", "))
        }
    }

    pub fn year(&self) -> Option<i64> {
        self.issued
            .as_ref()?
            .date_parts
            .first()?
            .first()
            .copied()
            .flatten()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.first().map(String::as_str)
    }
}

/// Crossref metadata keyed by upper-cased DOI
#[derive(Debug, Default)]
pub struct DoiMetadata {
    works: HashMap<String, WorkMetadata>,
}

impl DoiMetadata {
    /// Load one JSON work per line; blank lines are skipped
    pub fn load(path: &Path) -> EtlResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let resource = Resource::DoiMetadata;
        let file = std::fs::File::open(path).map_err(|e| resource.error(path, e))?;

        let mut metadata = Self::default();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| resource.error(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let work: WorkMetadata = serde_json::from_str(&line)
                .map_err(|e| resource.error(path, format!("line {}: {}", index + 1, e)))?;
            metadata.insert(work);
        }
        Ok(metadata)
    }

    pub fn insert(&mut self, work: WorkMetadata) {
        self.works.insert(work.doi.trim().to_uppercase(), work);
    }

    pub fn get(&self, doi: &str) -> Option<&WorkMetadata> {
        self.works.get(&doi.trim().to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.works.len()
    }

    pub fn is_empty(&self) -> bool {
        self.works.is_empty()
    }
}
