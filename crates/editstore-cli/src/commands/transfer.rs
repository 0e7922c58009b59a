//! Export, import, backup and restore handlers

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use editstore_core::{Backup, LocalStore, ProjectSnapshot};

use crate::output::Output;

/// Export one project as a snapshot
pub async fn export(
    store: &LocalStore,
    id: i64,
    path: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    let snapshot = store
        .export_project(id)
        .await
        .with_context(|| format!("Failed to export project {}", id))?;
    let json = snapshot.to_json_pretty()?;

    match path {
        Some(path) => {
            write_file(&path, &json)?;
            output.success(&format!(
                "Exported project {} ({} assets, {} scenes) to {}",
                id,
                snapshot.assets.len(),
                snapshot.scenes.len(),
                path.display()
            ));
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Import a snapshot as a new project
pub async fn import(store: &LocalStore, file: PathBuf, output: &Output) -> Result<()> {
    let json = read_file(&file)?;
    let snapshot = ProjectSnapshot::from_json(&json)
        .with_context(|| format!("Invalid snapshot: {}", file.display()))?;

    let project = store
        .import_project(snapshot)
        .await
        .context("Failed to import project")?;

    if output.is_quiet() {
        println!("{}", project.id);
    } else {
        output.success(&format!("Imported {} as project {}", project.name, project.id));
    }

    Ok(())
}

/// Export every project into one backup
pub async fn backup(store: &LocalStore, path: Option<PathBuf>, output: &Output) -> Result<()> {
    let backup = store.export_all().await.context("Failed to back up")?;
    let json = backup.to_json_pretty()?;

    match path {
        Some(path) => {
            write_file(&path, &json)?;
            output.success(&format!(
                "Backed up {} project(s) to {}",
                backup.projects.len(),
                path.display()
            ));
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Import every project of a backup
pub async fn restore(store: &LocalStore, file: PathBuf, output: &Output) -> Result<()> {
    let json = read_file(&file)?;
    let backup = Backup::from_json(&json)
        .with_context(|| format!("Invalid backup: {}", file.display()))?;

    let projects = store
        .import_all(backup)
        .await
        .context("Failed to restore backup")?;

    if output.is_quiet() {
        for project in &projects {
            println!("{}", project.id);
        }
    } else {
        output.success(&format!("Restored {} project(s)", projects.len()));
    }

    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
