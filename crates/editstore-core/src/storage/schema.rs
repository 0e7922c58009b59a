//! SQLite schema for the offline database
//!
//! One table per entity kind plus auxiliary tables. Each entity row keeps
//! the columns that are queried (owning project, branch, type, parent)
//! next to the full record serialized as JSON in `data`.
//!
//! The schema version lives in `PRAGMA user_version`, so clearing the
//! tables never loses it.

use rusqlite::{Connection, Result};

/// Current schema version. Bump for any structural change.
pub const SCHEMA_VERSION: i32 = 1;

/// Tables created by [`init_schema`]
pub const TABLES: &[&str] = &[
    "projects",
    "assets",
    "scenes",
    "branches",
    "checkpoints",
    "settings",
    "files",
    "metadata",
];

/// Initialize the database schema
///
/// Every statement is `IF NOT EXISTS`, so running this against an
/// existing database leaves present tables and indexes untouched.
pub fn init_schema(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY,
            data TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS assets (
            id INTEGER PRIMARY KEY,
            project_id INTEGER NOT NULL,
            branch_id TEXT NOT NULL,
            type TEXT NOT NULL,
            parent INTEGER,
            data TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS scenes (
            id INTEGER PRIMARY KEY,
            project_id INTEGER NOT NULL,
            branch_id TEXT NOT NULL,
            data TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS branches (
            id TEXT NOT NULL,
            project_id INTEGER NOT NULL,
            data TEXT NOT NULL,
            PRIMARY KEY (project_id, id)
        );

        CREATE TABLE IF NOT EXISTS checkpoints (
            id TEXT PRIMARY KEY,
            project_id INTEGER NOT NULL,
            branch_id TEXT NOT NULL,
            data TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            data TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS files (
            asset_id INTEGER NOT NULL,
            filename TEXT NOT NULL,
            project_id INTEGER NOT NULL,
            content BLOB NOT NULL,
            PRIMARY KEY (asset_id, filename)
        );

        CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        );

        -- Listing by owning project, then narrowing by branch in memory
        CREATE INDEX IF NOT EXISTS idx_assets_project ON assets(project_id);
        CREATE INDEX IF NOT EXISTS idx_assets_branch ON assets(branch_id);
        CREATE INDEX IF NOT EXISTS idx_assets_type ON assets(type);
        CREATE INDEX IF NOT EXISTS idx_assets_parent ON assets(parent);

        CREATE INDEX IF NOT EXISTS idx_scenes_project ON scenes(project_id);
        CREATE INDEX IF NOT EXISTS idx_scenes_branch ON scenes(branch_id);

        CREATE INDEX IF NOT EXISTS idx_branches_project ON branches(project_id);
        CREATE INDEX IF NOT EXISTS idx_checkpoints_project ON checkpoints(project_id);
        CREATE INDEX IF NOT EXISTS idx_files_project ON files(project_id);
        "#,
    )?;

    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()
}

/// Get the schema version recorded in the database (0 when never initialized)
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

/// Check if schema needs initialization or migration
pub fn needs_init(conn: &Connection) -> bool {
    match get_schema_version(conn) {
        Ok(v) => v < SCHEMA_VERSION,
        Err(_) => true,
    }
}
