//! Configuration shared by the terminal and web front ends.

use serde::{Deserialize, Serialize};

/// Front-end settings. The binary owns loading and persisting the file;
/// this is just the serde shape with its defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite database file.
    #[serde(default)]
    pub db_path: String,

    /// Serve the read-only web UI alongside the terminal UI.
    #[serde(default)]
    pub web_enabled: bool,

    /// Port for the web UI.
    #[serde(default = "default_web_port")]
    pub web_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: String::new(),
            web_enabled: false,
            web_port: default_web_port(),
        }
    }
}

fn default_web_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_fills_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.db_path, "");
        assert!(!config.web_enabled);
        assert_eq!(config.web_port, 8080);
    }

    #[test]
    fn partial_json_keeps_given_values() {
        let config: Config =
            serde_json::from_str(r#"{"db_path":"tasks.db","web_port":9090}"#).unwrap();
        assert_eq!(config.db_path, "tasks.db");
        assert!(!config.web_enabled);
        assert_eq!(config.web_port, 9090);
    }
}
