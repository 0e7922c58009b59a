//! Status command handler

use anyhow::Result;

use editstore_core::{EntityKind, LocalStore};

use crate::output::{Output, OutputFormat};

/// Show status information
pub async fn show(store: &LocalStore, output: &Output) -> Result<()> {
    let stats = store.stats().await?;
    let path = store.path();
    let file_size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

    let mut next_ids = Vec::with_capacity(EntityKind::ALL.len());
    for kind in EntityKind::ALL {
        next_ids.push((kind, store.next_id(kind).await?));
    }

    match output.format {
        OutputFormat::Json => {
            let next: serde_json::Map<_, _> = next_ids
                .iter()
                .map(|(kind, id)| (kind.to_string(), serde_json::json!(id)))
                .collect();
            println!(
                "{}",
                serde_json::json!({
                    "database": path,
                    "database_size": file_size,
                    "counts": {
                        "projects": stats.projects,
                        "assets": stats.assets,
                        "scenes": stats.scenes
                    },
                    "next_ids": next
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", path.display());
        }
        OutputFormat::Human => {
            println!("editstore Status");
            println!("================");
            println!();
            println!("Database:");
            println!("  Path: {}", path.display());
            println!("  Size: {}", format_bytes(file_size));
            println!();
            println!("Records:");
            println!("  Projects: {}", stats.projects);
            println!("  Assets:   {}", stats.assets);
            println!("  Scenes:   {}", stats.scenes);
            println!();
            println!("Next ids:");
            for (kind, id) in &next_ids {
                println!("  {:<8} {}", format!("{}:", kind), id);
            }
        }
    }

    Ok(())
}

/// Format bytes as human-readable string
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
