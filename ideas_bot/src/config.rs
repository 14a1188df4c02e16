use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use url::Url;

use crate::error::StartupError;

/// Environment variable that overrides where the config file is read from.
pub const CONFIG_PATH_VAR: &str = "IDEAS_BOT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Bot configuration, read once at startup from a JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Telegram user IDs allowed to review, delete and reply to ideas.
    pub admin_ids: Vec<u64>,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Default and maximum amount of ideas shown by one listing.
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
    /// File with the bot token. Defaults to `key`, or `key_debug` in debug builds.
    #[serde(default)]
    pub key_path: Option<PathBuf>,
    #[serde(default)]
    pub sink: Option<SinkConfig>,
    /// Receive updates through a webhook instead of long polling.
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

/// Where ideas get mirrored to, besides the database.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkConfig {
    Sheets {
        spreadsheet_id: String,
        /// Numeric ID of the sheet (tab) within the spreadsheet, needed for row deletion.
        sheet_id: i64,
        #[serde(default = "default_sheets_range")]
        range: String,
        /// File containing an OAuth access token for the Sheets API.
        token_path: PathBuf,
        /// Rows on top of the sheet that aren't ideas, like column titles.
        #[serde(default = "default_header_rows")]
        header_rows: u64,
    },
    JsonFile {
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// Public URL Telegram will send updates to.
    pub url: Url,
    /// Local address to listen on.
    pub listen_addr: SocketAddr,
}

fn default_database_path() -> String {
    "sqlite:ideas.sqlite".to_string()
}

fn default_list_limit() -> usize {
    50
}

fn default_sheets_range() -> String {
    "A:D".to_string()
}

fn default_header_rows() -> u64 {
    1
}

impl Config {
    /// Parse the config from JSON text.
    pub fn from_json(text: &str) -> Result<Config, StartupError> {
        let mut config: Config = serde_json::from_str(text)?;
        // A zero limit would make listings useless.
        config.list_limit = config.list_limit.max(1);
        Ok(config)
    }

    /// Read the config from the path in [`CONFIG_PATH_VAR`], or `config.json`.
    pub fn load() -> Result<Config, StartupError> {
        let path = std::env::var_os(CONFIG_PATH_VAR)
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Config, StartupError> {
        let text = fs::read_to_string(path).map_err(|source| StartupError::ConfigIo {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Path of the file holding the bot token.
    #[must_use]
    pub fn key_path(&self) -> PathBuf {
        self.key_path.clone().unwrap_or_else(|| {
            PathBuf::from(match cfg!(debug_assertions) {
                true => "key_debug",
                false => "key",
            })
        })
    }

    /// Read the bot token.
    pub fn read_key(&self) -> Result<String, StartupError> {
        let path = self.key_path();
        let key = fs::read_to_string(&path).map_err(|source| StartupError::KeyIo {
            path: path.clone(),
            source,
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(StartupError::EmptyKey(path));
        }
        Ok(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = Config::from_json(r#"{"admin_ids": [1407696674, 955785809]}"#).unwrap();
        assert_eq!(config.admin_ids, vec![1407696674, 955785809]);
        assert_eq!(config.database_path, "sqlite:ideas.sqlite");
        assert_eq!(config.list_limit, 50);
        assert!(config.sink.is_none());
        assert!(config.webhook.is_none());
    }

    #[test]
    fn sheets_sink() {
        let config = Config::from_json(
            r#"{
                "admin_ids": [],
                "sink": {
                    "kind": "sheets",
                    "spreadsheet_id": "abc",
                    "sheet_id": 0,
                    "token_path": "sheets_token"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(
            config.sink,
            Some(SinkConfig::Sheets {
                spreadsheet_id: "abc".to_string(),
                sheet_id: 0,
                range: "A:D".to_string(),
                token_path: PathBuf::from("sheets_token"),
                header_rows: 1,
            })
        );
    }

    #[test]
    fn json_sink_and_webhook() {
        let config = Config::from_json(
            r#"{
                "admin_ids": [5],
                "list_limit": 0,
                "sink": {"kind": "json_file", "path": "ideas.json"},
                "webhook": {"url": "https://example.com/ideas", "listen_addr": "127.0.0.1:8443"}
            }"#,
        )
        .unwrap();
        assert_eq!(
            config.sink,
            Some(SinkConfig::JsonFile {
                path: PathBuf::from("ideas.json")
            })
        );
        let webhook = config.webhook.unwrap();
        assert_eq!(webhook.url.as_str(), "https://example.com/ideas");
        assert_eq!(webhook.listen_addr.port(), 8443);
        assert_eq!(config.list_limit, 1);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Config::from_json("{").is_err());
        assert!(Config::from_json(r#"{"admin_ids": "everyone"}"#).is_err());
        assert!(Config::from_json(r#"{"admin_ids": [], "sink": {"kind": "carrier_pigeon"}}"#).is_err());
        // Admins are required.
        assert!(Config::from_json("{}").is_err());
    }

    #[test]
    fn reads_and_trims_key() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("key");
        fs::write(&key_path, "123:abc\n").unwrap();

        let config = Config::from_json(&format!(
            r#"{{"admin_ids": [], "key_path": {}}}"#,
            serde_json::to_string(&key_path).unwrap()
        ))
        .unwrap();
        assert_eq!(config.read_key().unwrap(), "123:abc");

        fs::write(&key_path, "  \n").unwrap();
        assert!(matches!(config.read_key(), Err(StartupError::EmptyKey(_))));
    }

    #[test]
    fn missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(StartupError::ConfigIo { .. })));
    }
}
