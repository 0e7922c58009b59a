//! Offline stand-in for the editor's REST client
//!
//! Calls are grouped the way the remote API groups its endpoints
//! (`api.projects().get(id)`, `api.assets().list(project, branch)`, ...)
//! and every call returns an [`ApiResponse`].
//!
//! Storage-backed calls delegate to [`LocalStore`]. Calls without a local
//! equivalent (collaboration, transfer, jobs, chunked upload, checkpoints,
//! branching beyond the default branch, the asset store) load canned
//! success bodies so editor code that touches them keeps working. They do
//! nothing.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{
    Asset, AssetId, AssetPatch, Branch, NewAsset, NewProject, NewScene, Project, ProjectId,
    ProjectPatch, Scene, SceneId, ScenePatch, DEFAULT_BRANCH, LOCAL_USER_ID,
};
use crate::shim::response::ApiResponse;
use crate::snapshot::ProjectSnapshot;
use crate::storage::{EntityKind, StoreError, StoreResult};
use crate::store::LocalStore;

/// Username reported for the single local user
pub const LOCAL_USERNAME: &str = "offline";

/// Entry point of the shim
#[derive(Clone)]
pub struct OfflineApi {
    store: Arc<LocalStore>,
    delay: Duration,
}

impl OfflineApi {
    /// Wrap a store, settling responses after the store's configured delay
    pub fn new(store: Arc<LocalStore>) -> Self {
        let delay = store.config().response_delay();
        Self { store, delay }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    pub fn projects(&self) -> Projects<'_> {
        Projects { api: self }
    }

    pub fn assets(&self) -> Assets<'_> {
        Assets { api: self }
    }

    pub fn scenes(&self) -> Scenes<'_> {
        Scenes { api: self }
    }

    pub fn users(&self) -> Users<'_> {
        Users { api: self }
    }

    pub fn apps(&self) -> Apps<'_> {
        Apps { api: self }
    }

    pub fn jobs(&self) -> Jobs<'_> {
        Jobs { api: self }
    }

    pub fn upload(&self) -> Upload<'_> {
        Upload { api: self }
    }

    pub fn branches(&self) -> Branches<'_> {
        Branches { api: self }
    }

    pub fn checkpoints(&self) -> Checkpoints<'_> {
        Checkpoints { api: self }
    }

    pub fn watch(&self) -> Watch<'_> {
        Watch { api: self }
    }

    pub fn asset_store(&self) -> AssetStore<'_> {
        AssetStore { api: self }
    }

    fn call<T, F, Fut>(&self, operation: F) -> ApiResponse<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce(Arc<LocalStore>) -> Fut,
        Fut: Future<Output = StoreResult<T>> + Send + 'static,
    {
        ApiResponse::spawn(self.delay, operation(Arc::clone(&self.store)))
    }

    fn canned(&self, body: Value) -> ApiResponse<Value> {
        ApiResponse::ready(self.delay, body)
    }
}

/// Turn a missing record into an error, as the remote API answers 404
fn found<T>(record: Option<T>, kind: EntityKind, id: i64) -> StoreResult<T> {
    record.ok_or_else(|| StoreError::not_found(kind, id))
}

fn local_user() -> Value {
    json!({
        "id": LOCAL_USER_ID,
        "username": LOCAL_USERNAME,
        "full_name": "Offline User",
        "flags": {},
        "limits": {}
    })
}

// ==================== projects ====================

pub struct Projects<'a> {
    api: &'a OfflineApi,
}

impl Projects<'_> {
    pub fn get(&self, id: ProjectId) -> ApiResponse<Project> {
        self.api.call(move |store| async move {
            found(store.get_project(id).await?, EntityKind::Project, id)
        })
    }

    pub fn list(&self) -> ApiResponse<Vec<Project>> {
        self.api
            .call(|store| async move { store.list_projects().await })
    }

    pub fn create(&self, fields: NewProject) -> ApiResponse<Project> {
        self.api
            .call(move |store| async move { store.create_project(fields).await })
    }

    pub fn update(&self, id: ProjectId, patch: ProjectPatch) -> ApiResponse<Project> {
        self.api
            .call(move |store| async move { store.update_project(id, patch).await })
    }

    /// Delete the project with its assets and scenes
    pub fn delete(&self, id: ProjectId) -> ApiResponse<()> {
        self.api
            .call(move |store| async move { store.delete_project(id).await })
    }

    /// Assets of the project on its default branch
    pub fn assets(&self, id: ProjectId) -> ApiResponse<Vec<Asset>> {
        self.api.call(move |store| async move {
            store.list_assets(id, Some(DEFAULT_BRANCH)).await
        })
    }

    /// Scenes of the project on its default branch
    pub fn scenes(&self, id: ProjectId) -> ApiResponse<Vec<Scene>> {
        self.api.call(move |store| async move {
            store.list_scenes(id, Some(DEFAULT_BRANCH)).await
        })
    }

    pub fn export(&self, id: ProjectId) -> ApiResponse<ProjectSnapshot> {
        self.api
            .call(move |store| async move { store.export_project(id).await })
    }

    pub fn import(&self, snapshot: ProjectSnapshot) -> ApiResponse<Project> {
        self.api
            .call(move |store| async move { store.import_project(snapshot).await })
    }

    pub fn collaborators(&self, _id: ProjectId) -> ApiResponse<Value> {
        self.api.canned(json!([local_user()]))
    }

    pub fn transfer(&self, id: ProjectId, _owner: &str) -> ApiResponse<Value> {
        self.api.canned(json!({ "id": id, "owner": LOCAL_USER_ID }))
    }
}

// ==================== assets ====================

pub struct Assets<'a> {
    api: &'a OfflineApi,
}

impl Assets<'_> {
    pub fn get(&self, id: AssetId) -> ApiResponse<Asset> {
        self.api.call(move |store| async move {
            found(store.get_asset(id).await?, EntityKind::Asset, id)
        })
    }

    pub fn list(&self, project_id: ProjectId, branch: Option<String>) -> ApiResponse<Vec<Asset>> {
        self.api.call(move |store| async move {
            store.list_assets(project_id, branch.as_deref()).await
        })
    }

    pub fn create(&self, fields: NewAsset) -> ApiResponse<Asset> {
        self.api
            .call(move |store| async move { store.create_asset(fields).await })
    }

    pub fn update(&self, id: AssetId, patch: AssetPatch) -> ApiResponse<Asset> {
        self.api
            .call(move |store| async move { store.update_asset(id, patch).await })
    }

    pub fn delete(&self, id: AssetId) -> ApiResponse<()> {
        self.api
            .call(move |store| async move { store.delete_asset(id).await })
    }

    /// Content of a file attached to the asset
    pub fn file(&self, id: AssetId, filename: &str) -> ApiResponse<Vec<u8>> {
        let filename = filename.to_string();
        self.api.call(move |store| async move {
            found(store.get_file(id, &filename).await?, EntityKind::Asset, id)
        })
    }

    /// Attach or replace a file on the asset
    pub fn put_file(&self, id: AssetId, filename: &str, content: Vec<u8>) -> ApiResponse<()> {
        let filename = filename.to_string();
        self.api.call(move |store| async move {
            store.put_file(id, &filename, &content).await
        })
    }
}

// ==================== scenes ====================

pub struct Scenes<'a> {
    api: &'a OfflineApi,
}

impl Scenes<'_> {
    pub fn get(&self, id: SceneId) -> ApiResponse<Scene> {
        self.api.call(move |store| async move {
            found(store.get_scene(id).await?, EntityKind::Scene, id)
        })
    }

    pub fn list(&self, project_id: ProjectId, branch: Option<String>) -> ApiResponse<Vec<Scene>> {
        self.api.call(move |store| async move {
            store.list_scenes(project_id, branch.as_deref()).await
        })
    }

    pub fn create(&self, fields: NewScene) -> ApiResponse<Scene> {
        self.api
            .call(move |store| async move { store.create_scene(fields).await })
    }

    pub fn update(&self, id: SceneId, patch: ScenePatch) -> ApiResponse<Scene> {
        self.api
            .call(move |store| async move { store.update_scene(id, patch).await })
    }

    pub fn delete(&self, id: SceneId) -> ApiResponse<()> {
        self.api
            .call(move |store| async move { store.delete_scene(id).await })
    }
}

// ==================== users ====================

pub struct Users<'a> {
    api: &'a OfflineApi,
}

impl Users<'_> {
    /// Every user id resolves to the local user
    pub fn get(&self, _id: i64) -> ApiResponse<Value> {
        self.api.canned(local_user())
    }

    pub fn projects(&self, _id: i64) -> ApiResponse<Vec<Project>> {
        self.api.projects().list()
    }

    /// Editor settings of a user, `{}` when never saved
    pub fn settings(&self, id: i64) -> ApiResponse<Value> {
        self.api.call(move |store| async move {
            let settings = store.get_setting(&format!("user:{}", id)).await?;
            Ok::<_, StoreError>(settings.unwrap_or_else(|| json!({})))
        })
    }

    pub fn update_settings(&self, id: i64, settings: Value) -> ApiResponse<Value> {
        self.api.call(move |store| async move {
            store.put_setting(&format!("user:{}", id), &settings).await?;
            Ok::<_, StoreError>(settings)
        })
    }
}

// ==================== apps ====================

pub struct Apps<'a> {
    api: &'a OfflineApi,
}

impl Apps<'_> {
    /// Published builds; none exist offline
    pub fn list(&self, _project_id: ProjectId) -> ApiResponse<Value> {
        self.api.canned(json!([]))
    }

    pub fn download(&self, project_id: ProjectId) -> ApiResponse<Value> {
        self.api.canned(json!({
            "id": Uuid::new_v4().to_string(),
            "project_id": project_id,
            "status": "complete"
        }))
    }
}

// ==================== jobs ====================

pub struct Jobs<'a> {
    api: &'a OfflineApi,
}

impl Jobs<'_> {
    /// Every job is reported as already complete
    pub fn get(&self, id: &str) -> ApiResponse<Value> {
        self.api.canned(json!({ "id": id, "status": "complete", "data": {} }))
    }
}

// ==================== upload ====================

pub struct Upload<'a> {
    api: &'a OfflineApi,
}

impl Upload<'_> {
    pub fn start(&self, filename: &str) -> ApiResponse<Value> {
        self.api.canned(json!({
            "uploadId": Uuid::new_v4().to_string(),
            "key": filename
        }))
    }

    pub fn url(&self, upload_id: &str, part: u32) -> ApiResponse<Value> {
        self.api.canned(json!({
            "uploadId": upload_id,
            "part": part,
            "signedUrl": ""
        }))
    }

    pub fn complete(&self, upload_id: &str) -> ApiResponse<Value> {
        self.api.canned(json!({ "uploadId": upload_id, "complete": true }))
    }
}

// ==================== branches ====================

pub struct Branches<'a> {
    api: &'a OfflineApi,
}

impl Branches<'_> {
    pub fn list(&self, project_id: ProjectId) -> ApiResponse<Vec<Branch>> {
        self.api
            .call(move |store| async move { store.list_branches(project_id).await })
    }

    /// Accepted but not recorded; everything stays on the default branch
    pub fn create(&self, project_id: ProjectId, name: &str) -> ApiResponse<Value> {
        self.api.canned(json!({
            "id": Uuid::new_v4().to_string(),
            "projectId": project_id,
            "name": name,
            "closed": false
        }))
    }

    pub fn checkout(&self, branch_id: &str) -> ApiResponse<Value> {
        self.api.canned(json!({ "id": branch_id }))
    }

    pub fn close(&self, branch_id: &str) -> ApiResponse<Value> {
        self.api.canned(json!({ "id": branch_id, "closed": true }))
    }

    pub fn merge(&self, source: &str, _target: &str) -> ApiResponse<Value> {
        self.api.canned(json!({ "id": source, "status": "complete" }))
    }
}

// ==================== checkpoints ====================

pub struct Checkpoints<'a> {
    api: &'a OfflineApi,
}

impl Checkpoints<'_> {
    pub fn list(&self, _branch_id: &str) -> ApiResponse<Value> {
        self.api.canned(json!({ "result": [], "pagination": { "hasMore": false } }))
    }

    pub fn create(&self, project_id: ProjectId, description: &str) -> ApiResponse<Value> {
        self.api.canned(json!({
            "id": Uuid::new_v4().to_string(),
            "projectId": project_id,
            "branchId": DEFAULT_BRANCH,
            "description": description
        }))
    }

    pub fn restore(&self, id: &str) -> ApiResponse<Value> {
        self.api.canned(json!({ "id": id, "status": "complete" }))
    }
}

// ==================== watch ====================

pub struct Watch<'a> {
    api: &'a OfflineApi,
}

impl Watch<'_> {
    /// Nothing changes behind the editor's back offline
    pub fn subscribe(&self, resource: &str) -> ApiResponse<Value> {
        self.api.canned(json!({ "resource": resource, "watching": true }))
    }

    pub fn unsubscribe(&self, resource: &str) -> ApiResponse<Value> {
        self.api.canned(json!({ "resource": resource, "watching": false }))
    }
}

// ==================== store ====================

pub struct AssetStore<'a> {
    api: &'a OfflineApi,
}

impl AssetStore<'_> {
    pub fn list(&self, _search: &str) -> ApiResponse<Value> {
        self.api.canned(json!({ "result": [], "pagination": { "total": 0 } }))
    }

    pub fn clone_into(&self, item_id: &str, project_id: ProjectId) -> ApiResponse<Value> {
        self.api.canned(json!({
            "id": item_id,
            "projectId": project_id,
            "status": "complete"
        }))
    }
}
