//! Offline storage engine
//!
//! `LocalStore` is the context object every operation goes through. It
//! owns the configuration, the database handle, and the three id
//! counters. The database is opened lazily: the first operation (or an
//! explicit [`LocalStore::ready`]) runs the open-and-upgrade sequence,
//! and every concurrent caller awaits that same initialization.
//!
//! ## Usage
//!
//! ```ignore
//! let store = LocalStore::open(Config::load()?).await?;
//!
//! let project = store.create_project(NewProject::named("Demo")).await?;
//! let models = store
//!     .create_asset(NewAsset::folder(project.id, "Models"))
//!     .await?;
//!
//! let assets = store.list_assets(project.id, None).await?;
//! ```
//!
//! Single-record operations run in one SQLite transaction. Cascading
//! deletes and imports touch several tables in sequence and are not
//! rolled back if a later step fails.

use std::path::PathBuf;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Params};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard, OnceCell};
use tracing::{debug, info};

use crate::config::Config;
use crate::models::{
    Asset, AssetId, AssetPatch, Branch, NewAsset, NewProject, NewScene, Project, ProjectId,
    ProjectPatch, Scene, SceneId, ScenePatch,
};
use crate::storage::schema::{init_schema, needs_init, TABLES};
use crate::storage::{EntityKind, IdCounters, StoreError, StoreResult};

/// Where the database lives
#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

impl Location {
    fn display_path(&self) -> PathBuf {
        match self {
            Location::File(path) => path.clone(),
            Location::Memory => PathBuf::from(":memory:"),
        }
    }
}

/// The open database handle and the counters that go with it
struct Database {
    conn: Connection,
    counters: IdCounters,
}

/// Record counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub projects: i64,
    pub assets: i64,
    pub scenes: i64,
}

/// Storage engine context
pub struct LocalStore {
    config: Config,
    location: Location,
    db: OnceCell<Mutex<Database>>,
}

impl LocalStore {
    /// Create a store backed by `config.database_path()`; nothing is opened yet
    pub fn new(config: Config) -> Self {
        let location = Location::File(config.database_path());
        Self {
            config,
            location,
            db: OnceCell::new(),
        }
    }

    /// Create a store and run initialization immediately
    pub async fn open(config: Config) -> StoreResult<Self> {
        let store = Self::new(config);
        store.ready().await?;
        Ok(store)
    }

    /// A throwaway in-memory store (for testing)
    pub fn in_memory() -> Self {
        Self {
            config: Config::default(),
            location: Location::Memory,
            db: OnceCell::new(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the database file (`:memory:` for in-memory stores)
    pub fn path(&self) -> PathBuf {
        self.location.display_path()
    }

    /// Wait until the database is open and its schema is current
    ///
    /// Safe to call from any number of tasks; the open runs once. A failed
    /// open is reported as `StoreUnavailable` and attempted again on the
    /// next call.
    pub async fn ready(&self) -> StoreResult<()> {
        self.database().await.map(|_| ())
    }

    async fn database(&self) -> StoreResult<&Mutex<Database>> {
        self.db
            .get_or_try_init(|| async { self.open_database().map(Mutex::new) })
            .await
    }

    async fn lock(&self) -> StoreResult<MutexGuard<'_, Database>> {
        Ok(self.database().await?.lock().await)
    }

    fn open_database(&self) -> StoreResult<Database> {
        let path = self.location.display_path();
        let unavailable = |e: rusqlite::Error| StoreError::StoreUnavailable {
            path: path.clone(),
            details: e.to_string(),
        };

        let mut conn = match &self.location {
            Location::File(file) => {
                if let Some(parent) = file.parent() {
                    std::fs::create_dir_all(parent).map_err(|source| {
                        StoreError::CreateDirectory {
                            path: parent.to_path_buf(),
                            source,
                        }
                    })?;
                }
                Connection::open(file).map_err(unavailable)?
            }
            Location::Memory => Connection::open_in_memory().map_err(unavailable)?,
        };

        // Re-run on every open so a current-version file missing an index
        // or table gets it back
        if needs_init(&conn) {
            info!("Initializing schema at {:?}", path);
        } else {
            debug!("Checking schema at {:?}", path);
        }
        init_schema(&mut conn).map_err(unavailable)?;

        let counters = IdCounters::load(&conn)?;
        info!(
            "Opened store at {:?} (next ids: project={}, asset={}, scene={})",
            path,
            counters.peek(EntityKind::Project),
            counters.peek(EntityKind::Asset),
            counters.peek(EntityKind::Scene)
        );

        Ok(Database { conn, counters })
    }

    // ==================== Project Operations ====================

    /// Create a project, filling unspecified fields with defaults
    ///
    /// The project's default branch is recorded alongside it.
    pub async fn create_project(&self, fields: NewProject) -> StoreResult<Project> {
        let mut guard = self.lock().await?;
        let Database { conn, counters } = &mut *guard;

        let tx = conn.transaction()?;
        let id = counters.issue(&tx, EntityKind::Project)?;
        let project = fields.into_project(id, Utc::now());
        write_project(&tx, &project)?;
        write_branch(&tx, &Branch::default_for(id, project.created))?;
        tx.commit()?;

        debug!("Created project {} ({})", project.id, project.name);
        Ok(project)
    }

    /// Get a project by ID
    pub async fn get_project(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        let db = self.lock().await?;
        read_one(&db.conn, "SELECT data FROM projects WHERE id = ?1", id)
    }

    /// Merge `patch` over an existing project
    pub async fn update_project(&self, id: ProjectId, patch: ProjectPatch) -> StoreResult<Project> {
        let mut db = self.lock().await?;
        let tx = db.conn.transaction()?;

        let mut project: Project = read_one(&tx, "SELECT data FROM projects WHERE id = ?1", id)?
            .ok_or_else(|| StoreError::not_found(EntityKind::Project, id))?;
        patch.apply(&mut project);
        project.modified = Utc::now();
        write_project(&tx, &project)?;
        tx.commit()?;

        debug!("Updated project {}", id);
        Ok(project)
    }

    /// All projects, oldest id first
    pub async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let db = self.lock().await?;
        read_all(&db.conn, "SELECT data FROM projects ORDER BY id", [])
    }

    /// Delete a project and everything that belongs to it
    ///
    /// Assets, scenes, branches, checkpoints, and stored files of the
    /// project are removed table by table. Missing projects are not an
    /// error. A failure partway leaves the tables already processed empty.
    pub async fn delete_project(&self, id: ProjectId) -> StoreResult<()> {
        let db = self.lock().await?;

        let mut removed = 0;
        for table in ["assets", "scenes", "branches", "checkpoints", "files"] {
            removed += db.conn.execute(
                &format!("DELETE FROM {} WHERE project_id = ?1", table),
                params![id],
            )?;
        }
        let found = db
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id])?;

        if found > 0 {
            info!("Deleted project {} with {} dependent records", id, removed);
        } else {
            debug!("Delete of missing project {} removed {} records", id, removed);
        }
        Ok(())
    }

    /// Branches recorded for a project
    pub async fn list_branches(&self, project_id: ProjectId) -> StoreResult<Vec<Branch>> {
        let db = self.lock().await?;
        read_all(
            &db.conn,
            "SELECT data FROM branches WHERE project_id = ?1 ORDER BY id",
            params![project_id],
        )
    }

    // ==================== Asset Operations ====================

    /// Create an asset under `fields.project_id`
    ///
    /// The owning project is not checked; a project delete is what keeps
    /// the reference valid.
    pub async fn create_asset(&self, fields: NewAsset) -> StoreResult<Asset> {
        let mut guard = self.lock().await?;
        let Database { conn, counters } = &mut *guard;

        let tx = conn.transaction()?;
        let id = counters.issue(&tx, EntityKind::Asset)?;
        let asset = fields.into_asset(id, Utc::now());
        write_asset(&tx, &asset)?;
        tx.commit()?;

        debug!(
            "Created {} asset {} in project {}",
            asset.asset_type, asset.id, asset.project_id
        );
        Ok(asset)
    }

    /// Get an asset by ID
    pub async fn get_asset(&self, id: AssetId) -> StoreResult<Option<Asset>> {
        let db = self.lock().await?;
        read_one(&db.conn, "SELECT data FROM assets WHERE id = ?1", id)
    }

    /// Merge `patch` over an existing asset
    pub async fn update_asset(&self, id: AssetId, patch: AssetPatch) -> StoreResult<Asset> {
        let mut db = self.lock().await?;
        let tx = db.conn.transaction()?;

        let mut asset: Asset = read_one(&tx, "SELECT data FROM assets WHERE id = ?1", id)?
            .ok_or_else(|| StoreError::not_found(EntityKind::Asset, id))?;
        patch.apply(&mut asset);
        asset.modified = Utc::now();
        write_asset(&tx, &asset)?;
        tx.commit()?;

        debug!("Updated asset {}", id);
        Ok(asset)
    }

    /// Delete one asset and its stored files
    ///
    /// Children of a deleted folder are left in place with a parent id
    /// that no longer resolves.
    pub async fn delete_asset(&self, id: AssetId) -> StoreResult<()> {
        let mut db = self.lock().await?;
        let tx = db.conn.transaction()?;
        tx.execute("DELETE FROM files WHERE asset_id = ?1", params![id])?;
        let removed = tx.execute("DELETE FROM assets WHERE id = ?1", params![id])?;
        tx.commit()?;

        debug!("Deleted asset {} (existed: {})", id, removed > 0);
        Ok(())
    }

    /// Assets of a project, optionally narrowed to one branch
    pub async fn list_assets(
        &self,
        project_id: ProjectId,
        branch: Option<&str>,
    ) -> StoreResult<Vec<Asset>> {
        let db = self.lock().await?;
        let assets: Vec<Asset> = read_all(
            &db.conn,
            "SELECT data FROM assets WHERE project_id = ?1 ORDER BY id",
            params![project_id],
        )?;

        Ok(match branch {
            Some(branch) => assets.into_iter().filter(|a| a.branch_id == branch).collect(),
            None => assets,
        })
    }

    /// Direct children of a folder asset
    pub async fn list_children(&self, parent: AssetId) -> StoreResult<Vec<Asset>> {
        let db = self.lock().await?;
        read_all(
            &db.conn,
            "SELECT data FROM assets WHERE parent = ?1 ORDER BY id",
            params![parent],
        )
    }

    // ==================== Scene Operations ====================

    /// Create a scene under `fields.project_id`
    pub async fn create_scene(&self, fields: NewScene) -> StoreResult<Scene> {
        let mut guard = self.lock().await?;
        let Database { conn, counters } = &mut *guard;

        let tx = conn.transaction()?;
        let id = counters.issue(&tx, EntityKind::Scene)?;
        let scene = fields.into_scene(id, Utc::now());
        write_scene(&tx, &scene)?;
        tx.commit()?;

        debug!("Created scene {} in project {}", scene.id, scene.project_id);
        Ok(scene)
    }

    /// Get a scene by ID
    pub async fn get_scene(&self, id: SceneId) -> StoreResult<Option<Scene>> {
        let db = self.lock().await?;
        read_one(&db.conn, "SELECT data FROM scenes WHERE id = ?1", id)
    }

    /// Merge `patch` over an existing scene
    pub async fn update_scene(&self, id: SceneId, patch: ScenePatch) -> StoreResult<Scene> {
        let mut db = self.lock().await?;
        let tx = db.conn.transaction()?;

        let mut scene: Scene = read_one(&tx, "SELECT data FROM scenes WHERE id = ?1", id)?
            .ok_or_else(|| StoreError::not_found(EntityKind::Scene, id))?;
        patch.apply(&mut scene);
        scene.modified = Utc::now();
        write_scene(&tx, &scene)?;
        tx.commit()?;

        debug!("Updated scene {}", id);
        Ok(scene)
    }

    /// Delete one scene
    pub async fn delete_scene(&self, id: SceneId) -> StoreResult<()> {
        let db = self.lock().await?;
        let removed = db
            .conn
            .execute("DELETE FROM scenes WHERE id = ?1", params![id])?;

        debug!("Deleted scene {} (existed: {})", id, removed > 0);
        Ok(())
    }

    /// Scenes of a project, optionally narrowed to one branch
    pub async fn list_scenes(
        &self,
        project_id: ProjectId,
        branch: Option<&str>,
    ) -> StoreResult<Vec<Scene>> {
        let db = self.lock().await?;
        let scenes: Vec<Scene> = read_all(
            &db.conn,
            "SELECT data FROM scenes WHERE project_id = ?1 ORDER BY id",
            params![project_id],
        )?;

        Ok(match branch {
            Some(branch) => scenes.into_iter().filter(|s| s.branch_id == branch).collect(),
            None => scenes,
        })
    }

    // ==================== Settings & Files ====================

    /// Read a settings blob (user or project editor settings)
    pub async fn get_setting(&self, key: &str) -> StoreResult<Option<Value>> {
        let db = self.lock().await?;
        read_one(&db.conn, "SELECT data FROM settings WHERE key = ?1", key)
    }

    /// Replace a settings blob
    pub async fn put_setting(&self, key: &str, value: &Value) -> StoreResult<()> {
        let db = self.lock().await?;
        db.conn.execute(
            "INSERT OR REPLACE INTO settings (key, data) VALUES (?1, ?2)",
            params![key, serde_json::to_string(value)?],
        )?;
        Ok(())
    }

    /// Store the file content backing an asset
    pub async fn put_file(&self, asset_id: AssetId, filename: &str, content: &[u8]) -> StoreResult<()> {
        let mut db = self.lock().await?;
        let tx = db.conn.transaction()?;

        let asset: Asset = read_one(&tx, "SELECT data FROM assets WHERE id = ?1", asset_id)?
            .ok_or_else(|| StoreError::not_found(EntityKind::Asset, asset_id))?;
        tx.execute(
            "INSERT OR REPLACE INTO files (asset_id, filename, project_id, content) VALUES (?1, ?2, ?3, ?4)",
            params![asset_id, filename, asset.project_id, content],
        )?;
        tx.commit()?;

        debug!("Stored {} bytes for asset {} ({})", content.len(), asset_id, filename);
        Ok(())
    }

    /// Read the file content backing an asset
    pub async fn get_file(&self, asset_id: AssetId, filename: &str) -> StoreResult<Option<Vec<u8>>> {
        let db = self.lock().await?;
        let content = db
            .conn
            .query_row(
                "SELECT content FROM files WHERE asset_id = ?1 AND filename = ?2",
                params![asset_id, filename],
                |row| row.get(0),
            )
            .optional()?;
        Ok(content)
    }

    // ==================== Maintenance ====================

    /// Empty every table and put the id counters back to their baselines
    pub async fn clear_all(&self) -> StoreResult<()> {
        let mut guard = self.lock().await?;
        let Database { conn, counters } = &mut *guard;

        let tx = conn.transaction()?;
        for table in TABLES {
            tx.execute(&format!("DELETE FROM {}", table), [])?;
        }
        tx.commit()?;
        counters.reset(conn)?;

        info!("Cleared all data in {:?}", self.location.display_path());
        Ok(())
    }

    /// Count records per entity kind
    pub async fn stats(&self) -> StoreResult<StoreStats> {
        let db = self.lock().await?;
        let count = |table: &str| -> StoreResult<i64> {
            Ok(db
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?)
        };

        Ok(StoreStats {
            projects: count("projects")?,
            assets: count("assets")?,
            scenes: count("scenes")?,
        })
    }

    /// The id the next create of `kind` will receive
    pub async fn next_id(&self, kind: EntityKind) -> StoreResult<i64> {
        let db = self.lock().await?;
        Ok(db.counters.peek(kind))
    }

    // ==================== Import support ====================

    /// Issue an id without writing a record
    pub(crate) async fn reserve_id(&self, kind: EntityKind) -> StoreResult<i64> {
        let mut guard = self.lock().await?;
        let Database { conn, counters } = &mut *guard;
        counters.issue(conn, kind)
    }

    /// Record a branch row for a project unless one already exists
    pub(crate) async fn record_branch(
        &self,
        project_id: ProjectId,
        branch_id: &str,
    ) -> StoreResult<()> {
        let db = self.lock().await?;
        let exists = db
            .conn
            .query_row(
                "SELECT 1 FROM branches WHERE project_id = ?1 AND id = ?2",
                params![project_id, branch_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            let branch = Branch {
                id: branch_id.to_string(),
                project_id,
                name: branch_id.to_string(),
                closed: false,
                created: Utc::now(),
            };
            write_branch(&db.conn, &branch)?;
            debug!("Recorded branch {} for project {}", branch_id, project_id);
        }
        Ok(())
    }

    /// Write a new asset under an id from [`LocalStore::reserve_id`]
    pub(crate) async fn insert_asset(&self, id: AssetId, fields: NewAsset) -> StoreResult<Asset> {
        let asset = fields.into_asset(id, Utc::now());
        let mut db = self.lock().await?;
        let tx = db.conn.transaction()?;
        write_asset(&tx, &asset)?;
        tx.commit()?;
        Ok(asset)
    }
}

// ==================== Row helpers ====================

fn read_one<T, P>(conn: &Connection, sql: &str, params: P) -> StoreResult<Option<T>>
where
    T: DeserializeOwned,
    P: rusqlite::ToSql,
{
    let data: Option<String> = conn
        .query_row(sql, [params], |row| row.get(0))
        .optional()?;
    data.map(|json| serde_json::from_str(&json).map_err(StoreError::from))
        .transpose()
}

fn read_all<T, P>(conn: &Connection, sql: &str, params: P) -> StoreResult<Vec<T>>
where
    T: DeserializeOwned,
    P: Params,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;

    let mut records = Vec::new();
    for row in rows {
        records.push(serde_json::from_str(&row?)?);
    }
    Ok(records)
}

fn write_project(conn: &Connection, project: &Project) -> StoreResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO projects (id, data) VALUES (?1, ?2)",
        params![project.id, serde_json::to_string(project)?],
    )?;
    Ok(())
}

fn write_asset(conn: &Connection, asset: &Asset) -> StoreResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO assets (id, project_id, branch_id, type, parent, data)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            asset.id,
            asset.project_id,
            asset.branch_id,
            asset.asset_type.as_str(),
            asset.parent,
            serde_json::to_string(asset)?
        ],
    )?;
    Ok(())
}

fn write_scene(conn: &Connection, scene: &Scene) -> StoreResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO scenes (id, project_id, branch_id, data) VALUES (?1, ?2, ?3, ?4)",
        params![
            scene.id,
            scene.project_id,
            scene.branch_id,
            serde_json::to_string(scene)?
        ],
    )?;
    Ok(())
}

fn write_branch(conn: &Connection, branch: &Branch) -> StoreResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO branches (id, project_id, data) VALUES (?1, ?2, ?3)",
        params![branch.id, branch.project_id, serde_json::to_string(branch)?],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetType, DEFAULT_BRANCH};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config::with_data_dir(temp_dir.path())
    }

    #[tokio::test]
    async fn test_open_creates_database() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let store = LocalStore::open(config.clone()).await.unwrap();

        assert!(config.database_path().exists());
        assert_eq!(store.path(), config.database_path());
        assert_eq!(store.stats().await.unwrap(), StoreStats::default());
    }

    #[tokio::test]
    async fn test_concurrent_ready_opens_once() {
        let store = Arc::new(LocalStore::in_memory());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.create_project(NewProject::default()).await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.sort_unstable();
        ids.dedup();

        // A second open would have reset the counters and produced duplicates
        assert_eq!(ids.len(), 8);
        assert_eq!(store.stats().await.unwrap().projects, 8);
    }

    #[tokio::test]
    async fn test_unavailable_when_file_is_not_a_database() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        std::fs::write(config.database_path(), vec![b'x'; 4096]).unwrap();

        let store = LocalStore::new(config);
        let err = store.ready().await.unwrap_err();
        assert!(matches!(err, StoreError::StoreUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_create_project_ids_and_timestamps() {
        let store = LocalStore::in_memory();

        let first = store.create_project(NewProject::named("One")).await.unwrap();
        let second = store.create_project(NewProject::named("Two")).await.unwrap();

        assert_eq!(first.id, EntityKind::Project.baseline());
        assert!(second.id > first.id);
        assert_eq!(first.created, first.modified);
        assert_eq!(second.created, second.modified);
    }

    #[tokio::test]
    async fn test_create_project_records_default_branch() {
        let store = LocalStore::in_memory();
        let project = store.create_project(NewProject::named("Demo")).await.unwrap();

        let branches = store.list_branches(project.id).await.unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].id, DEFAULT_BRANCH);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = LocalStore::in_memory();

        assert!(store.get_project(42).await.unwrap().is_none());
        assert!(store.get_asset(42).await.unwrap().is_none());
        assert!(store.get_scene(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = LocalStore::in_memory();

        let err = store
            .update_project(42, ProjectPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound {
                kind: EntityKind::Project,
                id: 42
            }
        ));

        assert!(store
            .update_asset(42, AssetPatch::rename("x"))
            .await
            .unwrap_err()
            .is_not_found());
        assert!(store
            .update_scene(42, ScenePatch::default())
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_update_project_merges_and_keeps_created() {
        let store = LocalStore::in_memory();
        let project = store
            .create_project(NewProject::named("Demo").with_description("first"))
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let updated = store
            .update_project(
                project.id,
                ProjectPatch {
                    settings: Some(json!({"antiAlias": true})),
                    ..ProjectPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, project.id);
        assert_eq!(updated.name, "Demo");
        assert_eq!(updated.description, "first");
        assert_eq!(updated.settings, json!({"antiAlias": true}));
        assert_eq!(updated.created, project.created);
        assert!(updated.modified > project.modified);

        let stored = store.get_project(project.id).await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = LocalStore::in_memory();
        let project = store.create_project(NewProject::default()).await.unwrap();
        let asset = store
            .create_asset(NewAsset::folder(project.id, "Models"))
            .await
            .unwrap();
        let scene = store
            .create_scene(NewScene::new(project.id, "Main"))
            .await
            .unwrap();

        for _ in 0..2 {
            store.delete_asset(asset.id).await.unwrap();
            store.delete_scene(scene.id).await.unwrap();
            store.delete_project(project.id).await.unwrap();
        }

        assert!(store.get_project(project.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_folder_hierarchy_scenario() {
        let store = LocalStore::in_memory();
        let demo = store.create_project(NewProject::named("Demo")).await.unwrap();

        let models = store
            .create_asset(NewAsset::folder(demo.id, "Models"))
            .await
            .unwrap();
        let hero = store
            .create_asset(
                NewAsset::new(demo.id, "Hero.glb")
                    .of_type(AssetType::Model)
                    .with_parent(models.id),
            )
            .await
            .unwrap();

        let assets = store.list_assets(demo.id, None).await.unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets.iter().filter(|a| a.parent.is_none()).count(), 1);
        assert_eq!(
            assets.iter().filter(|a| a.parent == Some(models.id)).count(),
            1
        );

        let children = store.list_children(models.id).await.unwrap();
        assert_eq!(children, vec![hero]);
    }

    #[tokio::test]
    async fn test_delete_folder_orphans_children() {
        let store = LocalStore::in_memory();
        let project = store.create_project(NewProject::default()).await.unwrap();
        let folder = store
            .create_asset(NewAsset::folder(project.id, "Textures"))
            .await
            .unwrap();
        let child = store
            .create_asset(
                NewAsset::new(project.id, "wood.png")
                    .of_type(AssetType::Texture)
                    .with_parent(folder.id),
            )
            .await
            .unwrap();

        store.delete_asset(folder.id).await.unwrap();

        let remaining = store.get_asset(child.id).await.unwrap().unwrap();
        assert_eq!(remaining.parent, Some(folder.id));
        assert!(store.get_asset(folder.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_by_branch() {
        let store = LocalStore::in_memory();
        let project = store.create_project(NewProject::default()).await.unwrap();

        store
            .create_asset(NewAsset::folder(project.id, "main"))
            .await
            .unwrap();
        store
            .create_asset(NewAsset::folder(project.id, "feature").on_branch("feature"))
            .await
            .unwrap();
        store
            .create_scene(NewScene::new(project.id, "Main").on_branch("feature"))
            .await
            .unwrap();

        assert_eq!(store.list_assets(project.id, None).await.unwrap().len(), 2);
        assert_eq!(
            store
                .list_assets(project.id, Some(DEFAULT_BRANCH))
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(store
            .list_scenes(project.id, Some(DEFAULT_BRANCH))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .list_scenes(project.id, Some("feature"))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_delete_project_cascades_all_branches() {
        let store = LocalStore::in_memory();
        let doomed = store.create_project(NewProject::named("Doomed")).await.unwrap();
        let kept = store.create_project(NewProject::named("Kept")).await.unwrap();

        let asset = store
            .create_asset(NewAsset::new(doomed.id, "logo.png").of_type(AssetType::Texture))
            .await
            .unwrap();
        store.put_file(asset.id, "logo.png", b"png").await.unwrap();
        store
            .create_asset(NewAsset::folder(doomed.id, "Other").on_branch("feature"))
            .await
            .unwrap();
        store
            .create_scene(NewScene::new(doomed.id, "Main"))
            .await
            .unwrap();
        store
            .create_scene(NewScene::new(doomed.id, "Alt").on_branch("feature"))
            .await
            .unwrap();
        store
            .create_asset(NewAsset::folder(kept.id, "Survivor"))
            .await
            .unwrap();

        store.delete_project(doomed.id).await.unwrap();

        assert!(store.get_project(doomed.id).await.unwrap().is_none());
        assert!(store.list_assets(doomed.id, None).await.unwrap().is_empty());
        assert!(store.list_scenes(doomed.id, None).await.unwrap().is_empty());
        assert!(store.list_branches(doomed.id).await.unwrap().is_empty());
        assert!(store.get_file(asset.id, "logo.png").await.unwrap().is_none());
        assert_eq!(store.list_assets(kept.id, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ids_never_reused_after_delete() {
        let store = LocalStore::in_memory();
        let project = store.create_project(NewProject::default()).await.unwrap();
        let scene = store
            .create_scene(NewScene::new(project.id, "Main"))
            .await
            .unwrap();

        store.delete_scene(scene.id).await.unwrap();
        let next = store
            .create_scene(NewScene::new(project.id, "Main"))
            .await
            .unwrap();

        assert!(next.id > scene.id);
    }

    #[tokio::test]
    async fn test_counters_survive_restart() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let mut issued = Vec::new();
        {
            let store = LocalStore::open(config.clone()).await.unwrap();
            for i in 0..5 {
                let project = store
                    .create_project(NewProject::named(format!("P{}", i)))
                    .await
                    .unwrap();
                issued.push(project.id);
            }
            // Deleting the newest must not let its id come back
            store.delete_project(issued[4]).await.unwrap();
        }

        let store = LocalStore::open(config).await.unwrap();
        let next = store.create_project(NewProject::default()).await.unwrap();
        assert!(issued.iter().all(|&id| next.id > id));
    }

    #[tokio::test]
    async fn test_reopen_restores_missing_index() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let index_count = |conn: &Connection| -> i64 {
            conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_assets_parent'",
                [],
                |row| row.get(0),
            )
            .unwrap()
        };

        LocalStore::open(config.clone()).await.unwrap();
        {
            let conn = Connection::open(config.database_path()).unwrap();
            conn.execute_batch("DROP INDEX idx_assets_parent").unwrap();
            assert_eq!(index_count(&conn), 0);
        }

        let store = LocalStore::open(config.clone()).await.unwrap();
        assert!(store.list_projects().await.unwrap().is_empty());
        drop(store);

        let conn = Connection::open(config.database_path()).unwrap();
        assert_eq!(index_count(&conn), 1);
    }

    #[tokio::test]
    async fn test_data_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let project_id;
        {
            let store = LocalStore::open(config.clone()).await.unwrap();
            let project = store.create_project(NewProject::named("Persisted")).await.unwrap();
            store
                .create_scene(
                    NewScene::new(project.id, "Main")
                        .with_entities(json!({"root": {"name": "Root", "children": []}})),
                )
                .await
                .unwrap();
            project_id = project.id;
        }

        let store = LocalStore::open(config).await.unwrap();
        let project = store.get_project(project_id).await.unwrap().unwrap();
        assert_eq!(project.name, "Persisted");

        let scenes = store.list_scenes(project_id, None).await.unwrap();
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].entities["root"]["name"], json!("Root"));
    }

    #[tokio::test]
    async fn test_clear_all_resets_counters() {
        let store = LocalStore::in_memory();
        let project = store.create_project(NewProject::default()).await.unwrap();
        store
            .create_asset(NewAsset::folder(project.id, "Models"))
            .await
            .unwrap();
        store
            .put_setting("user", &json!({"editor": {"gridDivisions": 8}}))
            .await
            .unwrap();

        store.clear_all().await.unwrap();

        assert_eq!(store.stats().await.unwrap(), StoreStats::default());
        assert!(store.get_setting("user").await.unwrap().is_none());
        for kind in EntityKind::ALL {
            assert_eq!(store.next_id(kind).await.unwrap(), kind.baseline());
        }

        let again = store.create_project(NewProject::default()).await.unwrap();
        assert_eq!(again.id, EntityKind::Project.baseline());
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let store = LocalStore::in_memory();
        assert!(store.get_setting("project:1000").await.unwrap().is_none());

        let value = json!({"editor": {"cameraNearClip": 0.1}});
        store.put_setting("project:1000", &value).await.unwrap();
        assert_eq!(store.get_setting("project:1000").await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn test_files_follow_their_asset() {
        let store = LocalStore::in_memory();
        let project = store.create_project(NewProject::default()).await.unwrap();
        let script = store
            .create_asset(NewAsset::new(project.id, "player.js").of_type(AssetType::Script))
            .await
            .unwrap();

        store
            .put_file(script.id, "player.js", b"var Player = pc.createScript('player');")
            .await
            .unwrap();
        assert!(store
            .get_file(script.id, "player.js")
            .await
            .unwrap()
            .is_some());

        store.delete_asset(script.id).await.unwrap();
        assert!(store.get_file(script.id, "player.js").await.unwrap().is_none());

        let err = store.put_file(script.id, "player.js", b"").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
