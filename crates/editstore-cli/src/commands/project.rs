//! Project command handlers

use anyhow::{anyhow, Context, Result};

use editstore_core::{LocalStore, NewProject, ProjectPatch};

use super::confirm;
use crate::output::Output;

/// List all projects
pub async fn list(store: &LocalStore, output: &Output) -> Result<()> {
    let projects = store.list_projects().await?;
    output.print_projects(&projects);
    Ok(())
}

/// Create a new project
pub async fn create(
    store: &LocalStore,
    name: String,
    description: Option<String>,
    output: &Output,
) -> Result<()> {
    let mut fields = NewProject::named(name);
    if let Some(description) = description {
        fields = fields.with_description(description);
    }

    let project = store
        .create_project(fields)
        .await
        .context("Failed to create project")?;

    output.success(&format!("Created project: {}", project.id));
    output.print_project(&project, &[]);

    Ok(())
}

/// Show a project with its branches
pub async fn show(store: &LocalStore, id: i64, output: &Output) -> Result<()> {
    let project = store
        .get_project(id)
        .await?
        .ok_or_else(|| anyhow!("Project not found: {}", id))?;
    let branches = store.list_branches(id).await?;

    output.print_project(&project, &branches);
    Ok(())
}

/// Rename a project
pub async fn rename(store: &LocalStore, id: i64, name: String, output: &Output) -> Result<()> {
    let patch = ProjectPatch {
        name: Some(name),
        ..ProjectPatch::default()
    };
    let project = store
        .update_project(id, patch)
        .await
        .with_context(|| format!("Failed to rename project {}", id))?;

    output.success(&format!("Renamed project {} to {}", project.id, project.name));
    Ok(())
}

/// Delete a project and everything it owns
pub async fn delete(store: &LocalStore, id: i64, yes: bool, output: &Output) -> Result<()> {
    let project = store
        .get_project(id)
        .await?
        .ok_or_else(|| anyhow!("Project not found: {}", id))?;

    if !yes && output.should_prompt() {
        println!("Delete project: {} - {}", project.id, project.name);
        println!("All of its assets and scenes will be removed.");
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store
        .delete_project(id)
        .await
        .context("Failed to delete project")?;

    output.success(&format!("Deleted project: {}", id));

    Ok(())
}
