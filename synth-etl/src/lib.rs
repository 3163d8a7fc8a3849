//! synth-etl library
//!
//! Migrates the four legacy synth round databases into the unified analysis
//! schema. The pipeline is a fixed, ordered list of steps; each step runs in
//! its own set of database sessions and shares state with later steps only
//! through the [`TranslationTable`].

pub mod countries;
pub mod error;
pub mod legacy;
pub mod pipeline;
pub mod resources;
pub mod session;
pub mod step;
pub mod steps;
pub mod target;
pub mod text;
pub mod translation;

pub use crate::error::{EtlError, EtlResult};
pub use crate::pipeline::{etl_steps, Pipeline, RunSummary, StepReport};
pub use crate::resources::Resources;
pub use crate::session::SessionManager;
pub use crate::step::{Step, StepContext, StepState};
pub use crate::translation::{IdSequence, LegacyKey, LegacyTable, TranslationTable};
