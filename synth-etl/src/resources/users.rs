//! User identity map
//!
//! Prepared offline because the legacy user tables carry personal data. Each
//! row assigns one GUID to a person and lists that person's legacy user ids
//! in every round, plus their age range at the time of the round.

use super::{read_csv, Resource};
use crate::error::{EtlError, EtlResult};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use synth_common::SynthRound;

#[derive(Debug, Deserialize)]
struct UserRow {
    #[serde(rename = "GUID")]
    guid: String,
    #[serde(default)]
    synth1: String,
    #[serde(default)]
    synth2: String,
    #[serde(default)]
    synth3: String,
    #[serde(default)]
    synth4: String,
    #[serde(rename = "synth round 1 age", default)]
    age1: Option<String>,
    #[serde(rename = "synth round 2 age", default)]
    age2: Option<String>,
    #[serde(rename = "synth round 3 age", default)]
    age3: Option<String>,
    #[serde(rename = "synth round 4 age", default)]
    age4: Option<String>,
}

/// One person's legacy ids and age range per round (indexed by round)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserIdentity {
    pub ids: [HashSet<i64>; 4],
    pub ages: [Option<String>; 4],
}

#[derive(Debug, Default)]
pub struct Users {
    identities: HashMap<String, UserIdentity>,
    by_legacy_id: HashMap<(SynthRound, i64), String>,
}

impl Users {
    pub fn load(path: &Path) -> EtlResult<Self> {
        let rows: Vec<UserRow> = read_csv(Resource::Users, path)?;

        let mut users = Users::default();
        for row in rows {
            let ids = [&row.synth1, &row.synth2, &row.synth3, &row.synth4];
            let mut identity = UserIdentity {
                ages: [row.age1, row.age2, row.age3, row.age4]
                    .map(|age| age.filter(|a| !a.trim().is_empty())),
                ..Default::default()
            };
            for round in SynthRound::chronological() {
                identity.ids[round.index()] = parse_ids(ids[round.index()])
                    .map_err(|e| Resource::Users.error(path, format!("GUID {}: {}", row.guid, e)))?;
            }
            users.insert(row.guid, identity)?;
        }

        Ok(users)
    }

    /// Register one identity; a GUID may only appear once
    pub fn insert(&mut self, guid: String, identity: UserIdentity) -> EtlResult<()> {
        if self.identities.contains_key(&guid) {
            return Err(EtlError::DuplicateUserGuid(guid));
        }
        for round in SynthRound::chronological() {
            for id in &identity.ids[round.index()] {
                // First GUID listed for a legacy id wins
                self.by_legacy_id
                    .entry((round, *id))
                    .or_insert_with(|| guid.clone());
            }
        }
        self.identities.insert(guid, identity);
        Ok(())
    }

    /// GUID of the person behind a legacy user id, if they were identified
    pub fn lookup_guid(&self, round: SynthRound, user_id: i64) -> Option<&str> {
        self.by_legacy_id.get(&(round, user_id)).map(String::as_str)
    }

    /// Age range of a person during a round
    pub fn lookup_age(&self, round: SynthRound, guid: &str) -> Option<&str> {
        self.identities
            .get(guid)
            .and_then(|identity| identity.ages[round.index()].as_deref())
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

fn parse_ids(value: &str) -> Result<HashSet<i64>, std::num::ParseIntError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::parse::<i64>)
        .collect()
}
