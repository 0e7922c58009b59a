//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use editstore_core::{Asset, Branch, Project, Scene};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single project, with its branches when known
    pub fn print_project(&self, project: &Project, branches: &[Branch]) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:          {}", project.id);
                println!("Name:        {}", project.name);
                if !project.description.is_empty() {
                    println!("Description: {}", project.description);
                }
                println!("Created:     {}", project.created.format("%Y-%m-%d %H:%M"));
                println!("Modified:    {}", project.modified.format("%Y-%m-%d %H:%M"));
                if !branches.is_empty() {
                    let names: Vec<_> = branches.iter().map(|b| b.name.as_str()).collect();
                    println!("Branches:    {}", names.join(", "));
                }
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({
                    "project": project,
                    "branches": branches,
                }));
            }
            OutputFormat::Quiet => {
                println!("{}", project.id);
            }
        }
    }

    /// Print a list of projects
    pub fn print_projects(&self, projects: &[Project]) {
        match self.format {
            OutputFormat::Human => {
                if projects.is_empty() {
                    println!("No projects found.");
                    return;
                }
                for project in projects {
                    println!(
                        "{} | {} | {}",
                        project.id,
                        truncate(&project.name, 40),
                        project.modified.format("%Y-%m-%d")
                    );
                }
                println!("\n{} project(s)", projects.len());
            }
            OutputFormat::Json => print_json(projects),
            OutputFormat::Quiet => {
                for project in projects {
                    println!("{}", project.id);
                }
            }
        }
    }

    /// Print a single asset
    pub fn print_asset(&self, asset: &Asset) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", asset.id);
                println!("Name:     {}", asset.name);
                println!("Type:     {}", asset.asset_type);
                println!("Project:  {}", asset.project_id);
                println!("Branch:   {}", asset.branch_id);
                match asset.parent {
                    Some(parent) => println!("Parent:   {}", parent),
                    None => println!("Parent:   (root)"),
                }
                if !asset.tags.is_empty() {
                    println!("Tags:     {}", asset.tags.join(", "));
                }
                println!("Modified: {}", asset.modified.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => print_json(asset),
            OutputFormat::Quiet => {
                println!("{}", asset.id);
            }
        }
    }

    /// Print a list of assets
    pub fn print_assets(&self, assets: &[Asset]) {
        match self.format {
            OutputFormat::Human => {
                if assets.is_empty() {
                    println!("No assets found.");
                    return;
                }
                for asset in assets {
                    let parent = asset
                        .parent
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{} | {:<9} | {} | parent {}",
                        asset.id,
                        asset.asset_type.as_str(),
                        truncate(&asset.name, 35),
                        parent
                    );
                }
                println!("\n{} asset(s)", assets.len());
            }
            OutputFormat::Json => print_json(assets),
            OutputFormat::Quiet => {
                for asset in assets {
                    println!("{}", asset.id);
                }
            }
        }
    }

    /// Print a list of scenes
    pub fn print_scenes(&self, scenes: &[Scene]) {
        match self.format {
            OutputFormat::Human => {
                if scenes.is_empty() {
                    println!("No scenes found.");
                    return;
                }
                for scene in scenes {
                    println!(
                        "{} | {} | {}",
                        scene.id,
                        truncate(&scene.name, 40),
                        scene.branch_id
                    );
                }
                println!("\n{} scene(s)", scenes.len());
            }
            OutputFormat::Json => print_json(scenes),
            OutputFormat::Quiet => {
                for scene in scenes {
                    println!("{}", scene.id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode JSON output: {}", e),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("ééééééééééé", 6), "ééé...");
    }
}
