//! Asset command handlers

use anyhow::{anyhow, Result};

use editstore_core::LocalStore;

use crate::output::Output;

/// List assets of a project, optionally on one branch
pub async fn list(
    store: &LocalStore,
    project: i64,
    branch: Option<String>,
    output: &Output,
) -> Result<()> {
    let assets = store.list_assets(project, branch.as_deref()).await?;
    output.print_assets(&assets);
    Ok(())
}

/// Show one asset
pub async fn show(store: &LocalStore, id: i64, output: &Output) -> Result<()> {
    let asset = store
        .get_asset(id)
        .await?
        .ok_or_else(|| anyhow!("Asset not found: {}", id))?;
    output.print_asset(&asset);
    Ok(())
}
