//! Project export and import
//!
//! A [`ProjectSnapshot`] captures one project with every asset and scene
//! it owns, across all branches. A [`Backup`] bundles snapshots of every
//! project. Both serialize to the JSON shapes the editor's file dialogs
//! read and write:
//!
//! ```text
//! { "project": {..}, "assets": [..], "scenes": [..], "exportedAt": "..." }
//! { "version": 1, "exportedAt": "...", "projects": [ <snapshot>, .. ] }
//! ```
//!
//! Importing never reuses ids from the file. The project, each asset, and
//! each scene get fresh ids; asset parents pointing inside the snapshot are
//! rewritten to the new ids and parents pointing elsewhere are dropped.
//! Import is sequential and not transactional: a failure partway leaves
//! the new project and the records created so far in place.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{Asset, AssetId, NewAsset, NewProject, NewScene, Project, ProjectId, Scene};
use crate::storage::{EntityKind, StoreError, StoreResult};
use crate::store::LocalStore;

/// Version written into all-projects backups
pub const BACKUP_VERSION: u32 = 1;

/// One project with its assets and scenes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub project: Project,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    pub exported_at: DateTime<Utc>,
}

/// Every project in the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub projects: Vec<ProjectSnapshot>,
}

impl ProjectSnapshot {
    /// Parse a snapshot file
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| StoreError::InvalidImport(format!("malformed project snapshot: {}", e)))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn to_json_pretty(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject snapshots whose asset ids repeat or whose parents form a cycle
    pub fn validate(&self) -> StoreResult<()> {
        let mut parents: HashMap<AssetId, Option<AssetId>> = HashMap::new();
        for asset in &self.assets {
            if parents.insert(asset.id, asset.parent).is_some() {
                return Err(StoreError::InvalidImport(format!(
                    "asset id {} appears more than once",
                    asset.id
                )));
            }
        }

        for asset in &self.assets {
            let mut seen = HashSet::from([asset.id]);
            let mut current = asset.parent;
            while let Some(parent) = current {
                if !seen.insert(parent) {
                    return Err(StoreError::InvalidImport(format!(
                        "asset {} is part of a parent cycle",
                        asset.id
                    )));
                }
                current = parents.get(&parent).copied().flatten();
            }
        }
        Ok(())
    }
}

impl Backup {
    /// Parse a backup file, accepting only [`BACKUP_VERSION`]
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let backup: Self = serde_json::from_str(json)
            .map_err(|e| StoreError::InvalidImport(format!("malformed backup: {}", e)))?;
        if backup.version != BACKUP_VERSION {
            return Err(StoreError::InvalidImport(format!(
                "unsupported backup version {} (expected {})",
                backup.version, BACKUP_VERSION
            )));
        }
        for snapshot in &backup.projects {
            snapshot.validate()?;
        }
        Ok(backup)
    }

    pub fn to_json_pretty(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl LocalStore {
    /// Capture a project with all of its assets and scenes
    pub async fn export_project(&self, id: ProjectId) -> StoreResult<ProjectSnapshot> {
        let project = self
            .get_project(id)
            .await?
            .ok_or_else(|| StoreError::not_found(EntityKind::Project, id))?;
        let assets = self.list_assets(id, None).await?;
        let scenes = self.list_scenes(id, None).await?;

        Ok(ProjectSnapshot {
            project,
            assets,
            scenes,
            exported_at: Utc::now(),
        })
    }

    /// Recreate a snapshot as a new project
    ///
    /// Returns the new project. Asset and scene counts match the snapshot;
    /// ids do not.
    pub async fn import_project(&self, snapshot: ProjectSnapshot) -> StoreResult<Project> {
        snapshot.validate()?;

        let source_id = snapshot.project.id;
        let project = self
            .create_project(NewProject::from(snapshot.project))
            .await?;

        let branches: BTreeSet<String> = snapshot
            .assets
            .iter()
            .map(|a| a.branch_id.clone())
            .chain(snapshot.scenes.iter().map(|s| s.branch_id.clone()))
            .collect();
        for branch_id in &branches {
            self.record_branch(project.id, branch_id).await?;
        }

        let mut new_ids = HashMap::with_capacity(snapshot.assets.len());
        for asset in &snapshot.assets {
            new_ids.insert(asset.id, self.reserve_id(EntityKind::Asset).await?);
        }

        for asset in snapshot.assets {
            let id = new_ids[&asset.id];
            let parent = asset.parent.and_then(|p| new_ids.get(&p).copied());
            let fields = NewAsset {
                project_id: project.id,
                parent,
                ..NewAsset::from(asset)
            };
            self.insert_asset(id, fields).await?;
        }

        let scene_count = snapshot.scenes.len();
        for scene in snapshot.scenes {
            let fields = NewScene {
                project_id: project.id,
                ..NewScene::from(scene)
            };
            self.create_scene(fields).await?;
        }

        info!(
            "Imported project {} as {} ({} assets, {} scenes)",
            source_id,
            project.id,
            new_ids.len(),
            scene_count
        );
        Ok(project)
    }

    /// Snapshot every project
    pub async fn export_all(&self) -> StoreResult<Backup> {
        let mut projects = Vec::new();
        for project in self.list_projects().await? {
            projects.push(self.export_project(project.id).await?);
        }

        Ok(Backup {
            version: BACKUP_VERSION,
            exported_at: Utc::now(),
            projects,
        })
    }

    /// Import every snapshot of a backup, in order
    pub async fn import_all(&self, backup: Backup) -> StoreResult<Vec<Project>> {
        if backup.version != BACKUP_VERSION {
            return Err(StoreError::InvalidImport(format!(
                "unsupported backup version {}",
                backup.version
            )));
        }

        let mut imported = Vec::with_capacity(backup.projects.len());
        for snapshot in backup.projects {
            imported.push(self.import_project(snapshot).await?);
        }
        Ok(imported)
    }
}
