//! Target schema lifecycle

use crate::error::EtlResult;
use crate::step::{Step, StepContext};
use async_trait::async_trait;
use synth_common::db::{SchemaIntrospector, TargetTable};
use tracing::debug;

/// Drop every analysis table, newest dependency first
///
/// Tables that do not exist are skipped, so clearing an empty target is a
/// no-op.
pub struct ClearTargetSchema;

#[async_trait]
impl Step for ClearTargetSchema {
    fn message(&self) -> String {
        "Clearing target schema".to_string()
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> EtlResult<()> {
        for table in TargetTable::ALL.iter().rev() {
            if !SchemaIntrospector::table_exists(&mut *ctx.target, table.name()).await? {
                continue;
            }
            sqlx::query(&table.definition().drop_sql())
                .execute(&mut *ctx.target)
                .await?;
            debug!(table = table.name(), "Dropped table");
        }
        Ok(())
    }
}

/// Create every analysis table that does not exist yet
///
/// The target database file itself is created when the target session is
/// opened.
pub struct CreateTargetSchema;

#[async_trait]
impl Step for CreateTargetSchema {
    fn message(&self) -> String {
        "Creating target schema".to_string()
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> EtlResult<()> {
        for table in TargetTable::ALL {
            sqlx::query(&table.definition().create_sql())
                .execute(&mut *ctx.target)
                .await?;
            debug!(table = table.name(), "Ensured table");
        }
        Ok(())
    }
}
