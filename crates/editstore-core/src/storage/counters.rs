//! Identifier counters
//!
//! Projects, assets, and scenes each get their own monotonically
//! increasing integer id. The next value to issue is kept in memory and
//! mirrored into the `metadata` table after every issuance, so a reopened
//! store continues where the previous process stopped.
//!
//! Persisting the counter and inserting the record happen in separate
//! statements. A crash in between can leave the stored counter behind the
//! highest id in use; single-process use makes that acceptable.

use std::fmt;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::storage::error::StoreResult;

/// The entity kinds that receive integer ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Project,
    Asset,
    Scene,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Project, EntityKind::Asset, EntityKind::Scene];

    /// First id handed out on a fresh database, kept clear of seeded records
    pub fn baseline(self) -> i64 {
        match self {
            EntityKind::Project => 1_000,
            EntityKind::Scene => 5_000,
            EntityKind::Asset => 10_000,
        }
    }

    /// Row key in the `metadata` table
    pub fn metadata_key(self) -> &'static str {
        match self {
            EntityKind::Project => "nextProjectId",
            EntityKind::Asset => "nextAssetId",
            EntityKind::Scene => "nextSceneId",
        }
    }

    fn index(self) -> usize {
        match self {
            EntityKind::Project => 0,
            EntityKind::Asset => 1,
            EntityKind::Scene => 2,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Project => "project",
            EntityKind::Asset => "asset",
            EntityKind::Scene => "scene",
        };
        f.write_str(name)
    }
}

/// In-memory copy of the three next-to-issue values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdCounters {
    next: [i64; 3],
}

impl Default for IdCounters {
    fn default() -> Self {
        Self {
            next: EntityKind::ALL.map(EntityKind::baseline),
        }
    }
}

impl IdCounters {
    /// Read persisted counters, falling back to the baseline per kind
    pub fn load(conn: &Connection) -> StoreResult<Self> {
        let mut counters = Self::default();
        for kind in EntityKind::ALL {
            let stored: Option<i64> = conn
                .query_row(
                    "SELECT value FROM metadata WHERE key = ?1",
                    params![kind.metadata_key()],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(value) = stored {
                counters.next[kind.index()] = value.max(kind.baseline());
            }
        }
        Ok(counters)
    }

    /// The value the next call to [`IdCounters::issue`] returns
    pub fn peek(&self, kind: EntityKind) -> i64 {
        self.next[kind.index()]
    }

    /// Hand out the next id for `kind` and persist the advanced counter
    pub fn issue(&mut self, conn: &Connection, kind: EntityKind) -> StoreResult<i64> {
        let id = self.next[kind.index()];
        let next = id + 1;
        persist(conn, kind, next)?;
        self.next[kind.index()] = next;
        Ok(id)
    }

    /// Put every counter back to its baseline, in memory and on disk
    pub fn reset(&mut self, conn: &Connection) -> StoreResult<()> {
        for kind in EntityKind::ALL {
            persist(conn, kind, kind.baseline())?;
        }
        *self = Self::default();
        Ok(())
    }
}

fn persist(conn: &Connection, kind: EntityKind, value: i64) -> StoreResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        params![kind.metadata_key(), value],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::init_schema;

    fn conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        init_schema(&mut conn).unwrap();
        conn
    }

    #[test]
    fn test_defaults_to_baseline() {
        let conn = conn();
        let counters = IdCounters::load(&conn).unwrap();
        for kind in EntityKind::ALL {
            assert_eq!(counters.peek(kind), kind.baseline());
        }
    }

    #[test]
    fn test_issue_is_monotonic_per_kind() {
        let conn = conn();
        let mut counters = IdCounters::load(&conn).unwrap();

        let p1 = counters.issue(&conn, EntityKind::Project).unwrap();
        let p2 = counters.issue(&conn, EntityKind::Project).unwrap();
        let a1 = counters.issue(&conn, EntityKind::Asset).unwrap();

        assert_eq!(p1, EntityKind::Project.baseline());
        assert_eq!(p2, p1 + 1);
        assert_eq!(a1, EntityKind::Asset.baseline());
        assert_eq!(counters.peek(EntityKind::Scene), EntityKind::Scene.baseline());
    }

    #[test]
    fn test_reload_continues_sequence() {
        let conn = conn();
        let mut counters = IdCounters::load(&conn).unwrap();
        let last = (0..5)
            .map(|_| counters.issue(&conn, EntityKind::Scene).unwrap())
            .last()
            .unwrap();

        let mut reloaded = IdCounters::load(&conn).unwrap();
        assert!(reloaded.issue(&conn, EntityKind::Scene).unwrap() > last);
    }

    #[test]
    fn test_reset() {
        let conn = conn();
        let mut counters = IdCounters::load(&conn).unwrap();
        counters.issue(&conn, EntityKind::Asset).unwrap();
        counters.reset(&conn).unwrap();

        assert_eq!(counters, IdCounters::default());
        assert_eq!(IdCounters::load(&conn).unwrap(), IdCounters::default());
    }

    #[test]
    fn test_display() {
        assert_eq!(EntityKind::Project.to_string(), "project");
        assert_eq!(EntityKind::Scene.to_string(), "scene");
    }
}
