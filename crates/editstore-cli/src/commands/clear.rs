//! Clear command handler

use anyhow::{Context, Result};

use editstore_core::LocalStore;

use super::confirm;
use crate::output::Output;

/// Delete every record and reset the id counters
pub async fn clear(store: &LocalStore, yes: bool, output: &Output) -> Result<()> {
    if !yes {
        if !output.should_prompt() {
            anyhow::bail!("Refusing to clear without --yes");
        }
        let stats = store.stats().await?;
        println!(
            "This removes {} project(s), {} asset(s) and {} scene(s) from {}.",
            stats.projects,
            stats.assets,
            stats.scenes,
            store.path().display()
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.clear_all().await.context("Failed to clear database")?;

    output.success("Cleared all data");
    Ok(())
}
