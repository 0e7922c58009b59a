//! Scene command handlers

use anyhow::Result;

use editstore_core::LocalStore;

use crate::output::Output;

/// List scenes of a project, optionally on one branch
pub async fn list(
    store: &LocalStore,
    project: i64,
    branch: Option<String>,
    output: &Output,
) -> Result<()> {
    let scenes = store.list_scenes(project, branch.as_deref()).await?;
    output.print_scenes(&scenes);
    Ok(())
}
