//! Configuration handling for schema_diff

use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{Error, Result};

/// Load configuration from a TOML file
pub fn load_from_file(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    let config: Config = toml::from_str(&config_str)?;

    Ok(config)
}

/// Represents the complete schema_diff configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub comparison: ComparisonOptions,
    pub source: Option<DatabaseConfig>,
    pub target: Option<DatabaseConfig>,
    pub logging: Option<LoggingConfig>,
}

/// Options controlling which objects are compared and how attribute
/// differences are normalized. Immutable for the duration of a run.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ComparisonOptions {
    pub compare_tables: bool,
    pub compare_columns: bool,
    pub compare_indexes: bool,
    pub compare_constraints: bool,
    pub compare_views: bool,
    pub compare_triggers: bool,
    pub compare_routines: bool,
    pub compare_partitions: bool,
    /// Accepted for parity with the comparison surface; snapshots carry no
    /// event payload, so this toggle has no effect.
    pub compare_events: bool,

    pub included_schemas: Option<Vec<String>>,
    pub excluded_schemas: Option<Vec<String>>,
    pub included_tables: Option<Vec<String>>,
    pub excluded_tables: Option<Vec<String>>,

    pub ignore_auto_increment: bool,
    pub ignore_comments: bool,
    pub ignore_charset: bool,
    pub ignore_collation: bool,

    pub case_sensitive: bool,

    pub rename_detection: bool,
    /// Minimum structural-similarity score for classifying a drop+add pair
    /// as a rename. Tunable; see the comparator tests for the heuristic.
    pub rename_similarity_threshold: f64,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            compare_tables: true,
            compare_columns: true,
            compare_indexes: true,
            compare_constraints: true,
            compare_views: true,
            compare_triggers: true,
            compare_routines: true,
            compare_partitions: true,
            compare_events: false,
            included_schemas: None,
            excluded_schemas: None,
            included_tables: None,
            excluded_tables: None,
            ignore_auto_increment: true,
            ignore_comments: false,
            ignore_charset: false,
            ignore_collation: false,
            case_sensitive: true,
            rename_detection: true,
            rename_similarity_threshold: 0.8,
        }
    }
}

impl ComparisonOptions {
    /// Check if a schema passes the include/exclude filters
    pub fn should_compare_schema(&self, schema_name: &str) -> bool {
        if let Some(included) = &self.included_schemas {
            if !included.iter().any(|s| s == schema_name) {
                return false;
            }
        }
        if let Some(excluded) = &self.excluded_schemas {
            if excluded.iter().any(|s| s == schema_name) {
                return false;
            }
        }
        true
    }

    /// Check if a schema/table pair passes the include/exclude filters
    pub fn should_compare_object(&self, schema_name: &str, table_name: &str) -> bool {
        if !self.should_compare_schema(schema_name) {
            return false;
        }
        if let Some(included) = &self.included_tables {
            if !included.iter().any(|t| t == table_name) {
                return false;
            }
        }
        if let Some(excluded) = &self.excluded_tables {
            if excluded.iter().any(|t| t == table_name) {
                return false;
            }
        }
        true
    }

    /// Normalize an identifier for pairing according to case sensitivity
    pub fn pairing_key(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }
}

/// Database connection configuration for the executor side
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub driver: String,
    pub url: String,
    pub pool_size: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    pub stdout: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[comparison]\ncompare_views = false\nrename_similarity_threshold = 0.9"
        )
        .unwrap();

        let config = load_from_file(file.path().to_str().unwrap()).unwrap();
        assert!(!config.comparison.compare_views);
        assert!(config.comparison.compare_tables);
        assert_eq!(config.comparison.rename_similarity_threshold, 0.9);
        assert!(config.source.is_none());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let result = load_from_file("/nonexistent/schema-diff.toml");
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[comparison]\ncompare_views = \"not a bool\"").unwrap();
        let result = load_from_file(file.path().to_str().unwrap());
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn filters_apply_to_schema_and_table() {
        let options = ComparisonOptions {
            excluded_schemas: Some(vec!["sys".to_string()]),
            included_tables: Some(vec!["users".to_string()]),
            ..Default::default()
        };
        assert!(options.should_compare_object("app", "users"));
        assert!(!options.should_compare_object("sys", "users"));
        assert!(!options.should_compare_object("app", "orders"));
    }

    #[test]
    fn pairing_key_respects_case_sensitivity() {
        let sensitive = ComparisonOptions::default();
        assert_eq!(sensitive.pairing_key("Users"), "Users");
        let insensitive = ComparisonOptions {
            case_sensitive: false,
            ..Default::default()
        };
        assert_eq!(insensitive.pairing_key("Users"), "users");
    }
}
