//! Schema bootstrap.
//!
//! Every persistent entity declares its table through [`Entity`]. At startup
//! [`bootstrap_schema`] creates whatever is missing; existing tables are left
//! untouched, nothing is dropped or migrated.

use std::time::Duration;

use anyhow::Context;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::models::{detection_log::DetectionLogRow, user::UserRow};

/// Table definition owned by an entity.
#[derive(Debug, Clone, Copy)]
pub struct Table {
    pub name: &'static str,
    /// Must be `CREATE TABLE IF NOT EXISTS ...`.
    pub create: &'static str,
}

pub trait Entity {
    const TABLE: Table;
}

/// Entities known to the process.
pub const ENTITIES: &[Table] = &[UserRow::TABLE, DetectionLogRow::TABLE];

/// Create every table in [`ENTITIES`] that does not exist yet.
pub async fn init_db(db: &SqlitePool) -> anyhow::Result<()> {
    let mut tx = db.begin().await.context("begin schema tx")?;
    for table in ENTITIES {
        sqlx::query(table.create)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("create table {}", table.name))?;
        debug!(table = table.name, "table ensured");
    }
    tx.commit().await.context("commit schema tx")?;
    Ok(())
}

/// [`init_db`] bounded by `timeout`. Any failure, including expiry, is fatal
/// to the caller.
pub async fn bootstrap_schema(db: &SqlitePool, timeout: Duration) -> anyhow::Result<()> {
    tokio::time::timeout(timeout, init_db(db))
        .await
        .map_err(|_| anyhow::anyhow!("schema bootstrap timed out after {:?}", timeout))??;
    info!(tables = ENTITIES.len(), "schema ready");
    Ok(())
}
