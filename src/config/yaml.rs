//! YAML settings loading and persistence

use crate::config::Settings;
use crate::error::GitFrontError;
use crate::system::System;
use crate::utils::fs::create_parent_directories;
use anyhow::{Context as _, Result};
use std::path::Path;
use tracing::{debug, info};

/// Load, schema-check and validate settings from `path`
///
/// # Errors
///
/// Returns `GitFrontError::Configuration` if the file is missing, is not
/// valid YAML, or fails validation.
pub fn load_settings(system: &dyn System, path: &str) -> Result<Settings> {
    let path_obj = Path::new(path);

    if !system.exists(path_obj) {
        return Err(GitFrontError::configuration(format!(
            "Configuration file not found: {path}\n\
            Create a gitfront.yaml file or specify a different path with --config"
        ))
        .into());
    }

    let content = system
        .read_to_string(path_obj)
        .with_context(|| format!("Failed to read configuration file: {path}"))?;

    parse_settings(&content).with_context(|| format!("Invalid configuration file: {path}"))
}

/// Parse settings from YAML text
///
/// The raw document is checked against the schema before deserializing, so
/// unknown keys are reported instead of silently dropped.
///
/// # Errors
///
/// Returns `GitFrontError::Configuration` on syntax, schema, or semantic
/// errors.
pub fn parse_settings(content: &str) -> Result<Settings> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| {
        GitFrontError::configuration(format!(
            "Failed to parse YAML: {e}\n\
            Please check the syntax and structure of your configuration file"
        ))
    })?;

    let raw_json = serde_json::to_value(&raw).map_err(|e| {
        GitFrontError::configuration(format!("Configuration is not representable as JSON: {e}"))
    })?;
    crate::config::schema::validate_against_schema(&raw_json)?;

    let settings: Settings = serde_yaml::from_value(raw)
        .map_err(|e| GitFrontError::configuration(format!("Invalid settings: {e}")))?;

    settings.validate()?;
    debug!("Loaded settings for repository {}", settings.repo_path);
    Ok(settings)
}

/// Validate and write settings to `path`
///
/// # Errors
///
/// Returns an error if the settings are invalid or the file cannot be
/// written.
pub fn save_settings(system: &dyn System, path: &str, settings: &Settings) -> Result<()> {
    settings.validate()?;

    let content = serde_yaml::to_string(settings).context("Failed to serialize settings")?;
    let path_obj = Path::new(path);
    create_parent_directories(system, path_obj)?;
    system.write(path_obj, content.as_bytes()).map_err(|e| {
        GitFrontError::file_io(format!("Failed to write configuration file {path}: {e}"))
    })?;

    info!("Saved configuration to {path}");
    Ok(())
}
