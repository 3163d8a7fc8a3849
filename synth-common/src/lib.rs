//! # Synth Common Library
//!
//! Shared code for the synth migration tooling including:
//! - Synth round enumeration
//! - Configuration loading and validation
//! - Database connection helpers
//! - Declarative definition of the unified analysis schema

pub mod config;
pub mod db;
pub mod error;
pub mod round;

pub use error::{Error, Result};
pub use round::SynthRound;
