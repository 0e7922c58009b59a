//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use editstore_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config = load(config_path)?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "database_file": config.database_file,
                    "database_path": config.database_path(),
                    "response_delay_ms": config.response_delay_ms
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.database_path().display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:          {}", config.data_dir.display());
            println!("  database_file:     {}", config.database_file);
            println!("  response_delay_ms: {}", config.response_delay_ms);
            println!();
            println!("Database:    {}", config.database_path().display());
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config = load(config_path)?;
    apply(&mut config, &key, &value)?;

    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

/// Load from the `--config` path when given, else the default location
pub fn load(config_path: Option<&PathBuf>) -> Result<Config> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };
    config.context("Failed to load configuration")
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "database_file" => {
            if value.trim().is_empty() {
                bail!("database_file cannot be empty");
            }
            config.database_file = value.to_string();
        }
        "response_delay_ms" => {
            config.response_delay_ms = value
                .trim()
                .parse()
                .context("Invalid value for response_delay_ms. Use a whole number of milliseconds.")?;
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, database_file, response_delay_ms",
                key
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::with_data_dir("/tmp/a");

        apply(&mut config, "data_dir", "/tmp/b").unwrap();
        apply(&mut config, "database_file", "offline.db").unwrap();
        apply(&mut config, "response_delay_ms", "25").unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/b"));
        assert_eq!(config.database_file, "offline.db");
        assert_eq!(config.response_delay_ms, 25);
    }

    #[test]
    fn test_apply_rejects_bad_input() {
        let mut config = Config::default();

        assert!(apply(&mut config, "sync_url", "x").is_err());
        assert!(apply(&mut config, "response_delay_ms", "soon").is_err());
        assert!(apply(&mut config, "database_file", "  ").is_err());
    }

    #[test]
    fn test_set_writes_given_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let output = Output::new(OutputFormat::Quiet);

        set(
            "response_delay_ms".to_string(),
            "40".to_string(),
            Some(&path),
            &output,
        )
        .unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        let config = Config::load_from_str(&saved).unwrap();
        assert_eq!(config.response_delay_ms, 40);
    }
}
