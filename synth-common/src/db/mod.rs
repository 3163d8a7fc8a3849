//! Database connections and the unified analysis schema

pub mod analysis;
pub mod init;
pub mod introspect;
pub mod schema;

pub use analysis::*;
pub use init::*;
pub use introspect::*;
pub use schema::*;
