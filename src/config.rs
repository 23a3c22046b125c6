use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Analysis settings read from an optional JSON file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct AnalysisConfig {
    /// Only report members visible outside the assembly.
    #[serde(default)]
    pub(crate) public_only: bool,
    /// Rule ids that are not run.
    #[serde(default)]
    pub(crate) disabled_rules: Vec<String>,
}

impl AnalysisConfig {
    pub(crate) fn is_disabled(&self, rule_id: &str) -> bool {
        self.disabled_rules.iter().any(|id| id == rule_id)
    }
}

/// Reads a configuration file; errors name the offending JSON path.
pub(crate) fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut deserializer = serde_json::Deserializer::from_str(&content);
    serde_path_to_error::deserialize(&mut deserializer)
        .with_context(|| format!("invalid configuration in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let path = temp_dir.path().join("contractor.json");
        fs::write(&path, content).expect("write config");
        (temp_dir, path)
    }

    #[test]
    fn missing_fields_use_defaults() {
        let (_dir, path) = write_config("{}");
        assert_eq!(load_config(&path).expect("load"), AnalysisConfig::default());
    }

    #[test]
    fn reads_all_fields() {
        let (_dir, path) = write_config(r#"{ "public_only": true, "disabled_rules": ["CC002"] }"#);
        let config = load_config(&path).expect("load");
        assert!(config.public_only);
        assert!(config.is_disabled("CC002"));
        assert!(!config.is_disabled("CC001"));
    }

    #[test]
    fn errors_name_the_json_path() {
        let (_dir, path) = write_config(r#"{ "disabled_rules": ["CC001", 2] }"#);
        let error = load_config(&path).expect_err("invalid config");
        let message = format!("{error:#}");
        assert!(message.contains("disabled_rules[1]"), "{message}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let (_dir, path) = write_config(r#"{ "publicOnly": true }"#);
        assert!(load_config(&path).is_err());
    }
}
