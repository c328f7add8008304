use crate::db::connection::CanonDb;
use crate::DramaturgError;

/// Canon tables: drama, character, episode, world_entry, plot_point, scene
const SCHEMA_001: &str = include_str!("migrations/001_canon_schema.surql");

/// Vector rows for semantic retrieval
const SCHEMA_002: &str = include_str!("migrations/002_canon_vectors.surql");

/// Apply the database schema to an initialized database connection.
///
/// Migrations are applied in order:
/// - 001: Canon tables with merge-key UNIQUE indexes
/// - 002: `canon_vector` table for the semantic memory layer
///
/// Every statement uses `IF NOT EXISTS`, so calling this on every start is safe.
///
/// ```no_run
/// # use dramaturg::db::{connection::{init_db, DbConfig}, schema::apply_schema};
/// # use std::path::Path;
/// # async fn example() -> Result<(), dramaturg::DramaturgError> {
/// let config = DbConfig::Embedded { path: Some("./data/canon.db".into()) };
/// let db = init_db(&config, Path::new("./data")).await?;
/// apply_schema(&db).await?;
/// # Ok(())
/// # }
/// ```
pub async fn apply_schema(db: &CanonDb) -> Result<(), DramaturgError> {
    db.query(SCHEMA_001).await?.check()?;
    db.query(SCHEMA_002).await?.check()?;
    Ok(())
}
