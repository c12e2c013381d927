//! JSON Schema validation for gitfront settings

use crate::error::GitFrontError;
use anyhow::{Result, anyhow};
use jsonschema::Validator;
use serde_json::Value;

/// Get the embedded JSON schema for gitfront settings
///
/// # Errors
///
/// Returns an error if the embedded schema does not parse or compile.
pub fn get_schema() -> Result<Validator> {
    let schema_str = include_str!("../../schema/gitfront.schema.json");
    let schema: Value = serde_json::from_str(schema_str)
        .map_err(|e| anyhow!("Failed to parse embedded JSON schema: {e}"))?;

    jsonschema::draft7::new(&schema).map_err(|e| anyhow!("Failed to compile JSON schema: {e}"))
}

/// Validate a settings value against the schema
///
/// # Errors
///
/// Returns `GitFrontError::Configuration` listing every violation.
pub fn validate_against_schema(settings: &Value) -> Result<()> {
    let validator = get_schema()?;

    let error_messages: Vec<String> = validator
        .iter_errors(settings)
        .map(|e| format!("  - {e}"))
        .collect();

    if !error_messages.is_empty() {
        return Err(GitFrontError::configuration(format!(
            "Settings do not match the schema:\n{}",
            error_messages.join("\n")
        ))
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_compiles() {
        get_schema().unwrap();
    }

    #[test]
    fn test_schema_rejects_unknown_and_missing_fields() {
        validate_against_schema(&json!({ "repo_path": "/srv/repo" })).unwrap();

        assert!(validate_against_schema(&json!({ "remote_name": "origin" })).is_err());
        assert!(
            validate_against_schema(&json!({ "repo_path": "/srv/repo", "pulls": [] })).is_err()
        );
        assert!(
            validate_against_schema(&json!({ "repo_path": "/srv/repo", "command_timeout_secs": 0 }))
                .is_err()
        );
    }
}
