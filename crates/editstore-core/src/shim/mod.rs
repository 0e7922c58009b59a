//! Compatibility shim
//!
//! Re-exposes the storage engine under the remote API's resource groups
//! and its callback-based response contract, so editor code written
//! against the network client runs unchanged in offline mode.
//!
//! ## Usage
//!
//! ```ignore
//! let api = OfflineApi::new(Arc::new(store));
//!
//! api.projects()
//!     .get(project_id)
//!     .on_load(|status, project| println!("{} {}", status, project.name))
//!     .on_error(|status, err| eprintln!("{} {}", status, err));
//! ```

mod api;
mod response;

pub use api::{
    Apps, AssetStore, Assets, Branches, Checkpoints, Jobs, OfflineApi, Projects, Scenes, Upload,
    Users, Watch, LOCAL_USERNAME,
};
pub use response::{ApiError, ApiResponse, STATUS_ERROR, STATUS_OK};
