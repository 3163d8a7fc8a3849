//! Identity translation table
//!
//! Legacy identifiers collide across rounds (row 7 of round 1 is unrelated to
//! row 7 of round 2), so every fill step registers where each legacy row
//! landed in the analysis schema and later steps rewrite their foreign keys
//! through this table.
//!
//! Entries registered without a round apply to every round. The table only
//! grows during a run and is never persisted.

use crate::error::{EtlError, EtlResult};
use std::collections::HashMap;
use std::fmt;
use synth_common::SynthRound;
use tracing::warn;

/// Legacy table a translated identifier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyTable {
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
}

impl LegacyTable {
    pub fn name(self) -> &'static str {
        match self {
            LegacyTable::Call => "NHM_Call",
            LegacyTable::Country => "Country_Iso_Codes",
            LegacyTable::Discipline => "NHM_Disciplines",
            LegacyTable::SpecificDiscipline => "NHM_Specific_Disciplines",
            LegacyTable::Output => "NHM_Outputs",
            LegacyTable::VisitorProject => "T_List_of_UserProjects",
            LegacyTable::EvaluationScore => "NHM_Application_Scores",
            LegacyTable::Category => "Category sheet",
            LegacyTable::Institution => "Institution sheet",
            LegacyTable::InstallationFacility => "InstallationFacility sheet",
        }
    }
}

impl fmt::Display for LegacyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Legacy row identifier: a numeric id or a code such as an ISO country code
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LegacyKey {
    Id(i64),
    Code(String),
}

impl From<i64> for LegacyKey {
    fn from(id: i64) -> Self {
        LegacyKey::Id(id)
    }
}

impl From<&str> for LegacyKey {
    fn from(code: &str) -> Self {
        LegacyKey::Code(code.to_string())
    }
}

impl From<String> for LegacyKey {
    fn from(code: String) -> Self {
        LegacyKey::Code(code)
    }
}

impl fmt::Display for LegacyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegacyKey::Id(id) => write!(f, "#{}", id),
            LegacyKey::Code(code) => write!(f, "{:?}", code),
        }
    }
}

type EntryKey = (LegacyTable, Option<SynthRound>, LegacyKey);

/// Mapping (legacy table, round or all rounds, legacy id) → unified id
#[derive(Debug, Default)]
pub struct TranslationTable {
    entries: HashMap<EntryKey, i64>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a translation
    ///
    /// `round: None` registers a round-independent entry that answers for
    /// every round.
    pub fn map(
        &mut self,
        table: LegacyTable,
        original: impl Into<LegacyKey>,
        new_id: i64,
        round: Option<SynthRound>,
    ) {
        let key = (table, round, original.into());
        if let Some(previous) = self.entries.insert(key.clone(), new_id) {
            if previous != new_id {
                warn!(
                    table = %key.0,
                    original = %key.2,
                    previous,
                    new_id,
                    "Translation re-registered with a different id"
                );
            }
        }
    }

    /// Look up the unified id for a legacy id in a round
    ///
    /// A round-specific entry wins over a round-independent one. A missing
    /// translation is `None`; callers decide whether that is fatal.
    pub fn translate(
        &self,
        table: LegacyTable,
        original: impl Into<LegacyKey>,
        round: SynthRound,
    ) -> Option<i64> {
        let original = original.into();
        self.entries
            .get(&(table, Some(round), original.clone()))
            .or_else(|| self.entries.get(&(table, None, original)))
            .copied()
    }

    /// Look up a required reference, failing loudly when it is missing
    pub fn require(
        &self,
        table: LegacyTable,
        original: impl Into<LegacyKey>,
        round: SynthRound,
    ) -> EtlResult<i64> {
        let original = original.into();
        self.translate(table, original.clone(), round)
            .ok_or(EtlError::MissingTranslation {
                table,
                key: original,
                round,
            })
    }

    /// Number of registered entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of registered entries for one legacy table
    pub fn count(&self, table: LegacyTable) -> usize {
        self.entries.keys().filter(|(t, _, _)| *t == table).count()
    }
}

/// Monotonically increasing id counter for one target entity type, seeded at 1
#[derive(Debug)]
pub struct IdSequence {
    next: i64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Take the next id
    pub fn next_id(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> i64 {
        self.next - 1
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}
