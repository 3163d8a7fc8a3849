//! Institution name cleanup lookup

use super::Resource;
use crate::error::EtlResult;
use std::collections::HashMap;
use std::path::Path;

/// Raw institution name → canonical name, or `None` to discard the name
#[derive(Debug, Default)]
pub struct InstitutionAliases {
    aliases: HashMap<String, Option<String>>,
}

impl InstitutionAliases {
    pub fn new(aliases: HashMap<String, Option<String>>) -> Self {
        Self { aliases }
    }

    pub fn load(path: &Path) -> EtlResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let resource = Resource::Institutions;
        let contents = std::fs::read_to_string(path).map_err(|e| resource.error(path, e))?;
        let aliases = serde_json::from_str(&contents).map_err(|e| resource.error(path, e))?;
        Ok(Self { aliases })
    }

    /// Clean a raw institution name
    ///
    /// A known name maps to its canonical form (or nothing when it is marked
    /// for discard); an unknown name passes through trimmed.
    pub fn clean(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match self.aliases.get(raw).or_else(|| self.aliases.get(trimmed)) {
            Some(canonical) => canonical.clone(),
            None => Some(trimmed.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
