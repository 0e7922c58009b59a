//! editstore core library
//!
//! Local persistence for the scene editor's offline mode. Projects,
//! assets, and scenes that normally live behind the remote service are
//! stored in an embedded SQLite database instead, and reached through
//! the same call shapes the editor already uses.
//!
//! # Architecture
//!
//! - **Storage engine** (`store`, `storage`, `snapshot`): typed CRUD per
//!   entity kind, persisted id counters, cascading project delete,
//!   export/import of project snapshots, and a bulk clear.
//! - **Compatibility shim** (`shim`): the engine regrouped by remote
//!   resource family, answering through `on_load` / `on_error` observers.
//!
//! # Quick Start
//!
//! ```text
//! let store = LocalStore::open(Config::load()?).await?;
//!
//! let demo = store.create_project(NewProject::named("Demo")).await?;
//! let models = store.create_asset(NewAsset::folder(demo.id, "Models")).await?;
//!
//! let snapshot = store.export_project(demo.id).await?;
//! ```
//!
//! # Modules
//!
//! - `store`: the `LocalStore` engine context (main entry point)
//! - `models`: records, create inputs, and patches
//! - `snapshot`: export/import and all-projects backups
//! - `storage`: schema, id counters, and errors
//! - `shim`: remote-API-shaped facade
//! - `config`: engine configuration

pub mod config;
pub mod models;
pub mod shim;
pub mod snapshot;
pub mod storage;
pub mod store;

pub use config::Config;
pub use models::{
    Asset, AssetId, AssetPatch, AssetType, Branch, NewAsset, NewProject, NewScene, Project,
    ProjectId, ProjectPatch, Scene, SceneId, ScenePatch, DEFAULT_BRANCH,
};
pub use shim::{ApiError, ApiResponse, OfflineApi};
pub use snapshot::{Backup, ProjectSnapshot, BACKUP_VERSION};
pub use storage::{EntityKind, StoreError, StoreResult};
pub use store::{LocalStore, StoreStats};
