//! Node configuration.
//!
//! A flat options struct read once at startup. Files ending in `.json`
//! are parsed as JSON, anything else as TOML. Missing fields take their
//! defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shikago_core::{Error, Limits, Result};

/// Configuration for a broker node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Partition count given to every lazily created topic.
    pub default_partition_count: u32,
    /// Directory holding the partition files.
    pub data_directory: PathBuf,
    /// Port the write endpoint listens on.
    pub node_port: u16,
    /// Capacity of each channel returned by `Node::subscribe`.
    pub subscriber_buffer: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            default_partition_count: 4,
            data_directory: PathBuf::from("data"),
            node_port: 8080,
            subscriber_buffer: 64,
        }
    }
}

impl NodeConfig {
    /// Loads a configuration file.
    ///
    /// # Errors
    /// Returns a configuration error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("failed to read {}: {e}", path.display()))
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&contents)
        } else {
            Self::from_toml(&contents)
        }
    }

    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    /// Returns a configuration error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::configuration(format!("invalid JSON config: {e}")))
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    /// Returns a configuration error if the TOML cannot be parsed.
    pub fn from_toml(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(|e| Error::configuration(format!("invalid TOML config: {e}")))
    }

    /// Sets the default partition count.
    #[must_use]
    pub const fn with_default_partition_count(mut self, count: u32) -> Self {
        self.default_partition_count = count;
        self
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_directory = dir.into();
        self
    }

    /// Sets the endpoint port.
    #[must_use]
    pub const fn with_node_port(mut self, port: u16) -> Self {
        self.node_port = port;
        self
    }

    /// Sets the subscriber channel capacity.
    #[must_use]
    pub const fn with_subscriber_buffer(mut self, capacity: usize) -> Self {
        self.subscriber_buffer = capacity;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns a configuration error if the partition count is zero or
    /// above the limit, or the subscriber buffer is zero.
    pub fn validate(&self) -> Result<()> {
        let max = Limits::new().partitions_per_topic_max;
        if self.default_partition_count == 0 {
            return Err(Error::configuration(
                "default_partition_count must be positive",
            ));
        }
        if self.default_partition_count > max {
            return Err(Error::configuration(format!(
                "default_partition_count {} exceeds limit {max}",
                self.default_partition_count
            )));
        }
        if self.subscriber_buffer == 0 {
            return Err(Error::configuration("subscriber_buffer must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(NodeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_json_config() {
        let config = NodeConfig::from_json(
            r#"{"default_partition_count": 2, "data_directory": "/tmp/shikago", "node_port": 9000}"#,
        )
        .unwrap();

        assert_eq!(config.default_partition_count, 2);
        assert_eq!(config.data_directory, PathBuf::from("/tmp/shikago"));
        assert_eq!(config.node_port, 9000);
        // Unset fields keep their defaults.
        assert_eq!(config.subscriber_buffer, 64);
    }

    #[test]
    fn test_parse_toml_config() {
        let config = NodeConfig::from_toml(
            r#"
            default_partition_count = 8
            data_directory = "var/data"
            "#,
        )
        .unwrap();

        assert_eq!(config.default_partition_count, 8);
        assert_eq!(config.data_directory, PathBuf::from("var/data"));
        assert_eq!(config.node_port, 8080);
    }

    #[test]
    fn test_from_file_dispatches_on_extension() {
        let temp_dir = tempfile::tempdir().unwrap();
        let json_path = temp_dir.path().join("node.json");
        std::fs::write(&json_path, r#"{"node_port": 7000}"#).unwrap();
        let toml_path = temp_dir.path().join("node.toml");
        std::fs::write(&toml_path, "node_port = 7001\n").unwrap();

        assert_eq!(NodeConfig::from_file(&json_path).unwrap().node_port, 7000);
        assert_eq!(NodeConfig::from_file(&toml_path).unwrap().node_port, 7001);
    }

    #[test]
    fn test_setters_override_file_values() {
        let config = NodeConfig::from_toml("node_port = 9000\ndata_directory = \"a\"\n")
            .unwrap()
            .with_node_port(9100)
            .with_data_directory("b");

        assert_eq!(config.node_port, 9100);
        assert_eq!(config.data_directory, PathBuf::from("b"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = NodeConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero = NodeConfig::default().with_default_partition_count(0);
        assert!(zero.validate().is_err());

        let huge = NodeConfig::default().with_default_partition_count(10_000);
        assert!(huge.validate().is_err());

        let no_buffer = NodeConfig::default().with_subscriber_buffer(0);
        assert!(no_buffer.validate().is_err());
    }
}
