//! Data models for the offline database
//!
//! Records serialize with the field names the remote API uses
//! (`projectId`, `branchId`, `type`, `created`, `modified`), so exported
//! snapshots and shim response bodies look like the remote service's.
//!
//! Each entity has three shapes:
//! - the record itself (`Project`, `Asset`, `Scene`)
//! - a create input with every field optional (`NewProject`, ...)
//! - a patch with every field optional (`ProjectPatch`, ...). Nullable
//!   fields use `Option<Option<_>>`: the outer `None` leaves the field
//!   alone, `Some(None)` clears it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type ProjectId = i64;
pub type AssetId = i64;
pub type SceneId = i64;

/// Branch every record lands on unless told otherwise
pub const DEFAULT_BRANCH: &str = "master";

/// Owner id stamped on locally created projects
pub const LOCAL_USER_ID: i64 = 1;

/// Default project name when none is given
pub const UNTITLED_PROJECT: &str = "Untitled";

pub(crate) fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_owner() -> i64 {
    LOCAL_USER_ID
}

fn default_true() -> bool {
    true
}

/// Top-level container of assets and scenes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_owner")]
    pub owner: i64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub private_source_assets: bool,
    /// Render and display configuration
    #[serde(default = "empty_object")]
    pub settings: Value,
    #[serde(default)]
    pub fork_from: Option<ProjectId>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Asset type tag
///
/// Tags the editor introduces later than this list deserialize as
/// [`AssetType::Other`] and are written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssetType {
    #[default]
    Folder,
    Script,
    Model,
    Texture,
    Material,
    Cubemap,
    Animation,
    Audio,
    Font,
    Json,
    Text,
    Html,
    Css,
    Shader,
    Sprite,
    TextureAtlas,
    Template,
    Render,
    Container,
    Wasm,
    Binary,
    Other(String),
}

impl AssetType {
    pub fn as_str(&self) -> &str {
        match self {
            AssetType::Folder => "folder",
            AssetType::Script => "script",
            AssetType::Model => "model",
            AssetType::Texture => "texture",
            AssetType::Material => "material",
            AssetType::Cubemap => "cubemap",
            AssetType::Animation => "animation",
            AssetType::Audio => "audio",
            AssetType::Font => "font",
            AssetType::Json => "json",
            AssetType::Text => "text",
            AssetType::Html => "html",
            AssetType::Css => "css",
            AssetType::Shader => "shader",
            AssetType::Sprite => "sprite",
            AssetType::TextureAtlas => "textureatlas",
            AssetType::Template => "template",
            AssetType::Render => "render",
            AssetType::Container => "container",
            AssetType::Wasm => "wasm",
            AssetType::Binary => "binary",
            AssetType::Other(name) => name,
        }
    }
}

impl From<&str> for AssetType {
    fn from(name: &str) -> Self {
        match name {
            "folder" => AssetType::Folder,
            "script" => AssetType::Script,
            "model" => AssetType::Model,
            "texture" => AssetType::Texture,
            "material" => AssetType::Material,
            "cubemap" => AssetType::Cubemap,
            "animation" => AssetType::Animation,
            "audio" => AssetType::Audio,
            "font" => AssetType::Font,
            "json" => AssetType::Json,
            "text" => AssetType::Text,
            "html" => AssetType::Html,
            "css" => AssetType::Css,
            "shader" => AssetType::Shader,
            "sprite" => AssetType::Sprite,
            "textureatlas" => AssetType::TextureAtlas,
            "template" => AssetType::Template,
            "render" => AssetType::Render,
            "container" => AssetType::Container,
            "wasm" => AssetType::Wasm,
            "binary" => AssetType::Binary,
            other => AssetType::Other(other.to_string()),
        }
    }
}

impl From<String> for AssetType {
    fn from(name: String) -> Self {
        match AssetType::from(name.as_str()) {
            AssetType::Other(_) => AssetType::Other(name),
            known => known,
        }
    }
}

impl From<AssetType> for String {
    fn from(asset_type: AssetType) -> Self {
        match asset_type {
            AssetType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed resource, optionally nested under a folder asset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: AssetId,
    pub project_id: ProjectId,
    #[serde(default = "default_branch")]
    pub branch_id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub asset_type: AssetType,
    #[serde(default)]
    pub parent: Option<AssetId>,
    /// Opaque type-specific payload
    #[serde(default = "empty_object")]
    pub data: Value,
    /// File descriptor (filename, size, hash) for assets backed by a file
    #[serde(default)]
    pub file: Option<Value>,
    #[serde(default)]
    pub thumbnails: Option<Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_true")]
    pub preload: bool,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// A named entity/component hierarchy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: SceneId,
    pub project_id: ProjectId,
    #[serde(default = "default_branch")]
    pub branch_id: String,
    pub name: String,
    /// Opaque entity tree
    #[serde(default = "empty_object")]
    pub entities: Value,
    #[serde(default = "empty_object")]
    pub settings: Value,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// A line of assets and scenes inside a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: String,
    pub project_id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub closed: bool,
    pub created: DateTime<Utc>,
}

impl Branch {
    /// The default branch record for a project
    pub fn default_for(project_id: ProjectId, created: DateTime<Utc>) -> Self {
        Self {
            id: DEFAULT_BRANCH.to_string(),
            project_id,
            name: DEFAULT_BRANCH.to_string(),
            closed: false,
            created,
        }
    }
}

// ==================== Create inputs ====================

/// Fields for a new project; anything left `None` gets a default
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner: Option<i64>,
    pub private: bool,
    pub private_source_assets: bool,
    pub settings: Option<Value>,
    pub fork_from: Option<ProjectId>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
}

impl NewProject {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_settings(mut self, settings: Value) -> Self {
        self.settings = Some(settings);
        self
    }

    pub(crate) fn into_project(self, id: ProjectId, now: DateTime<Utc>) -> Project {
        Project {
            id,
            name: self.name.unwrap_or_else(|| UNTITLED_PROJECT.to_string()),
            description: self.description.unwrap_or_default(),
            owner: self.owner.unwrap_or(LOCAL_USER_ID),
            created: now,
            modified: now,
            private: self.private,
            private_source_assets: self.private_source_assets,
            settings: self.settings.unwrap_or_else(empty_object),
            fork_from: self.fork_from,
            image_url: self.image_url,
            tags: self.tags,
        }
    }
}

impl From<Project> for NewProject {
    fn from(project: Project) -> Self {
        Self {
            name: Some(project.name),
            description: Some(project.description),
            owner: Some(project.owner),
            private: project.private,
            private_source_assets: project.private_source_assets,
            settings: Some(project.settings),
            fork_from: project.fork_from,
            image_url: project.image_url,
            tags: project.tags,
        }
    }
}

/// Fields for a new asset; only the owning project is required
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewAsset {
    pub project_id: ProjectId,
    pub branch_id: Option<String>,
    pub name: Option<String>,
    pub asset_type: AssetType,
    pub parent: Option<AssetId>,
    pub data: Option<Value>,
    pub file: Option<Value>,
    pub thumbnails: Option<Value>,
    pub tags: Vec<String>,
    pub preload: Option<bool>,
}

impl NewAsset {
    pub fn new(project_id: ProjectId, name: impl Into<String>) -> Self {
        Self {
            project_id,
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A folder asset, the default type
    pub fn folder(project_id: ProjectId, name: impl Into<String>) -> Self {
        Self::new(project_id, name)
    }

    pub fn of_type(mut self, asset_type: AssetType) -> Self {
        self.asset_type = asset_type;
        self
    }

    pub fn with_parent(mut self, parent: AssetId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn on_branch(mut self, branch_id: impl Into<String>) -> Self {
        self.branch_id = Some(branch_id.into());
        self
    }

    pub(crate) fn into_asset(self, id: AssetId, now: DateTime<Utc>) -> Asset {
        let asset_type = self.asset_type;
        Asset {
            id,
            project_id: self.project_id,
            branch_id: self.branch_id.unwrap_or_else(default_branch),
            name: self
                .name
                .unwrap_or_else(|| format!("New {}", asset_type.as_str())),
            asset_type,
            parent: self.parent,
            data: self.data.unwrap_or_else(empty_object),
            file: self.file,
            thumbnails: self.thumbnails,
            tags: self.tags,
            preload: self.preload.unwrap_or(true),
            created: now,
            modified: now,
        }
    }
}

impl From<Asset> for NewAsset {
    fn from(asset: Asset) -> Self {
        Self {
            project_id: asset.project_id,
            branch_id: Some(asset.branch_id),
            name: Some(asset.name),
            asset_type: asset.asset_type,
            parent: asset.parent,
            data: Some(asset.data),
            file: asset.file,
            thumbnails: asset.thumbnails,
            tags: asset.tags,
            preload: Some(asset.preload),
        }
    }
}

/// Fields for a new scene; only the owning project is required
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewScene {
    pub project_id: ProjectId,
    pub branch_id: Option<String>,
    pub name: Option<String>,
    pub entities: Option<Value>,
    pub settings: Option<Value>,
}

impl NewScene {
    pub fn new(project_id: ProjectId, name: impl Into<String>) -> Self {
        Self {
            project_id,
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_entities(mut self, entities: Value) -> Self {
        self.entities = Some(entities);
        self
    }

    pub fn on_branch(mut self, branch_id: impl Into<String>) -> Self {
        self.branch_id = Some(branch_id.into());
        self
    }

    pub(crate) fn into_scene(self, id: SceneId, now: DateTime<Utc>) -> Scene {
        Scene {
            id,
            project_id: self.project_id,
            branch_id: self.branch_id.unwrap_or_else(default_branch),
            name: self.name.unwrap_or_else(|| "Untitled".to_string()),
            entities: self.entities.unwrap_or_else(empty_object),
            settings: self.settings.unwrap_or_else(empty_object),
            created: now,
            modified: now,
        }
    }
}

impl From<Scene> for NewScene {
    fn from(scene: Scene) -> Self {
        Self {
            project_id: scene.project_id,
            branch_id: Some(scene.branch_id),
            name: Some(scene.name),
            entities: Some(scene.entities),
            settings: Some(scene.settings),
        }
    }
}

// ==================== Patches ====================

/// Partial update for a project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub private: Option<bool>,
    pub private_source_assets: Option<bool>,
    pub settings: Option<Value>,
    pub fork_from: Option<Option<ProjectId>>,
    pub image_url: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl ProjectPatch {
    /// Shallow-merge the set fields over `project`
    pub fn apply(self, project: &mut Project) {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(private) = self.private {
            project.private = private;
        }
        if let Some(flag) = self.private_source_assets {
            project.private_source_assets = flag;
        }
        if let Some(settings) = self.settings {
            project.settings = settings;
        }
        if let Some(fork_from) = self.fork_from {
            project.fork_from = fork_from;
        }
        if let Some(image_url) = self.image_url {
            project.image_url = image_url;
        }
        if let Some(tags) = self.tags {
            project.tags = tags;
        }
    }
}

/// Partial update for an asset. The owning project and branch are fixed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetPatch {
    pub name: Option<String>,
    pub asset_type: Option<AssetType>,
    pub parent: Option<Option<AssetId>>,
    pub data: Option<Value>,
    pub file: Option<Option<Value>>,
    pub thumbnails: Option<Option<Value>>,
    pub tags: Option<Vec<String>>,
    pub preload: Option<bool>,
}

impl AssetPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Move under `parent`, or to the root with `None`
    pub fn reparent(parent: Option<AssetId>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    pub fn apply(self, asset: &mut Asset) {
        if let Some(name) = self.name {
            asset.name = name;
        }
        if let Some(asset_type) = self.asset_type {
            asset.asset_type = asset_type;
        }
        if let Some(parent) = self.parent {
            asset.parent = parent;
        }
        if let Some(data) = self.data {
            asset.data = data;
        }
        if let Some(file) = self.file {
            asset.file = file;
        }
        if let Some(thumbnails) = self.thumbnails {
            asset.thumbnails = thumbnails;
        }
        if let Some(tags) = self.tags {
            asset.tags = tags;
        }
        if let Some(preload) = self.preload {
            asset.preload = preload;
        }
    }
}

/// Partial update for a scene
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenePatch {
    pub name: Option<String>,
    pub entities: Option<Value>,
    pub settings: Option<Value>,
}

impl ScenePatch {
    pub fn apply(self, scene: &mut Scene) {
        if let Some(name) = self.name {
            scene.name = name;
        }
        if let Some(entities) = self.entities {
            scene.entities = entities;
        }
        if let Some(settings) = self.settings {
            scene.settings = settings;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_project_defaults() {
        let now = Utc::now();
        let project = NewProject::default().into_project(1000, now);

        assert_eq!(project.name, UNTITLED_PROJECT);
        assert!(project.description.is_empty());
        assert_eq!(project.owner, LOCAL_USER_ID);
        assert_eq!(project.settings, json!({}));
        assert_eq!(project.created, project.modified);
        assert!(project.fork_from.is_none());
    }

    #[test]
    fn test_new_asset_defaults() {
        let asset = NewAsset {
            project_id: 1000,
            ..NewAsset::default()
        }
        .into_asset(10000, Utc::now());

        assert_eq!(asset.asset_type, AssetType::Folder);
        assert_eq!(asset.branch_id, DEFAULT_BRANCH);
        assert_eq!(asset.name, "New folder");
        assert!(asset.parent.is_none());
        assert!(asset.preload);
        assert_eq!(asset.data, json!({}));
    }

    #[test]
    fn test_new_scene_defaults() {
        let scene = NewScene {
            project_id: 1000,
            ..NewScene::default()
        }
        .into_scene(5000, Utc::now());

        assert_eq!(scene.branch_id, DEFAULT_BRANCH);
        assert_eq!(scene.entities, json!({}));
        assert_eq!(scene.created, scene.modified);
    }

    #[test]
    fn test_project_patch_merges_only_set_fields() {
        let mut project = NewProject::named("Demo")
            .with_description("first")
            .into_project(1000, Utc::now());

        ProjectPatch {
            description: Some("second".to_string()),
            image_url: Some(Some("cover.png".to_string())),
            ..ProjectPatch::default()
        }
        .apply(&mut project);

        assert_eq!(project.name, "Demo");
        assert_eq!(project.description, "second");
        assert_eq!(project.image_url.as_deref(), Some("cover.png"));
        assert_eq!(project.id, 1000);
    }

    #[test]
    fn test_asset_patch_can_clear_parent() {
        let mut asset = NewAsset::new(1000, "Hero.glb")
            .of_type(AssetType::Model)
            .with_parent(10000)
            .into_asset(10001, Utc::now());

        AssetPatch::reparent(None).apply(&mut asset);
        assert!(asset.parent.is_none());

        // Untouched parent stays put
        AssetPatch::rename("Hero").apply(&mut asset);
        assert!(asset.parent.is_none());
        assert_eq!(asset.name, "Hero");
    }

    #[test]
    fn test_asset_json_uses_remote_field_names() {
        let asset = NewAsset::new(1000, "Wood")
            .of_type(AssetType::TextureAtlas)
            .into_asset(10000, Utc::now());

        let value = serde_json::to_value(&asset).unwrap();
        assert_eq!(value["projectId"], json!(1000));
        assert_eq!(value["branchId"], json!("master"));
        assert_eq!(value["type"], json!("textureatlas"));
        assert!(value["parent"].is_null());
    }

    #[test]
    fn test_asset_deserialize_fills_defaults() {
        let asset: Asset = serde_json::from_value(json!({
            "id": 10007,
            "projectId": 1000,
            "name": "Scripts",
            "created": "2024-03-01T10:00:00Z",
            "modified": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(asset.asset_type, AssetType::Folder);
        assert_eq!(asset.branch_id, DEFAULT_BRANCH);
        assert!(asset.preload);
    }

    #[test]
    fn test_asset_type_display_matches_serde() {
        for asset_type in [AssetType::Folder, AssetType::Script, AssetType::TextureAtlas] {
            let json = serde_json::to_value(&asset_type).unwrap();
            assert_eq!(json, json!(asset_type.to_string()));
        }
    }

    #[test]
    fn test_unlisted_asset_type_round_trips() {
        let asset: Asset = serde_json::from_value(json!({
            "id": 10008,
            "projectId": 1000,
            "name": "Level props",
            "type": "bundle",
            "created": "2024-03-01T10:00:00Z",
            "modified": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(asset.asset_type, AssetType::Other("bundle".to_string()));
        assert_eq!(asset.asset_type.as_str(), "bundle");
        assert_eq!(serde_json::to_value(&asset).unwrap()["type"], json!("bundle"));

        // Known names never land in Other
        assert_eq!(AssetType::from("textureatlas".to_string()), AssetType::TextureAtlas);
    }
}
