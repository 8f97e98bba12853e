//! Configuration loader and validator for the Trello→Elasticsearch sync.
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::kibana::SavedObjectRef;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub trello: Trello,
    #[serde(default)]
    pub elastic: Elastic,
    #[serde(default)]
    pub kibana: Kibana,
    pub actions: Actions,
}

/// Trello API credentials and the board to read.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Trello {
    #[serde(default)]
    pub api_key: String,
    /// Only needed for OAuth flows; the REST reads use key + token.
    #[serde(default)]
    pub api_secret: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub board: String,
}

/// Elasticsearch destination settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Elastic {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub open_cards_index: String,
    #[serde(default)]
    pub closed_cards_index: String,
    #[serde(default = "default_chunk_size")]
    pub bulk_chunk_size: usize,
}

/// Kibana saved-object transfer settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Kibana {
    #[serde(default)]
    pub base_api_url: String,
    #[serde(default = "default_bundle_path")]
    pub bundle_path: String,
    #[serde(default = "SavedObjectRef::defaults")]
    pub objects: Vec<SavedObjectRef>,
}

/// Independent run phases.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actions {
    #[serde(default)]
    pub send_data_to_elastic: bool,
    #[serde(default)]
    pub export_kibana_objects: bool,
    #[serde(default)]
    pub import_kibana_objects: bool,
}

impl Default for Elastic {
    fn default() -> Self {
        Self {
            host: String::new(),
            api_key: String::new(),
            open_cards_index: String::new(),
            closed_cards_index: String::new(),
            bulk_chunk_size: default_chunk_size(),
        }
    }
}

impl Default for Kibana {
    fn default() -> Self {
        Self {
            base_api_url: String::new(),
            bundle_path: default_bundle_path(),
            objects: SavedObjectRef::defaults(),
        }
    }
}

fn default_chunk_size() -> usize {
    500
}

fn default_bundle_path() -> String {
    "kibana/KibanaExport.ndjson".to_string()
}

impl Config {
    /// Fill empty credential fields from the environment.
    pub fn apply_env_fallbacks(&mut self) {
        self.apply_fallbacks_from(|key| env::var(key).ok());
    }

    fn apply_fallbacks_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fill = |field: &mut String, key: &str| {
            if field.trim().is_empty() {
                if let Some(value) = lookup(key) {
                    *field = value;
                }
            }
        };
        fill(&mut self.trello.api_key, "TRELLO_API_KEY");
        fill(&mut self.trello.api_secret, "TRELLO_API_SECRET");
        fill(&mut self.trello.token, "TRELLO_TOKEN");
        fill(&mut self.trello.board, "TRELLO_BOARD");
        fill(&mut self.elastic.api_key, "ELASTIC_API_KEY");
    }

    pub fn any_action(&self) -> bool {
        self.actions.send_data_to_elastic
            || self.actions.export_kibana_objects
            || self.actions.import_kibana_objects
    }
}

/// Load configuration from a YAML file, apply `.env` and environment
/// fallbacks, then validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let mut cfg: Config = serde_yaml::from_str(&content)?;
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();
    cfg.apply_env_fallbacks();
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance. Only the settings used by enabled
/// actions are required.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.actions.send_data_to_elastic {
        if cfg.trello.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("trello.api_key must be non-empty"));
        }
        if cfg.trello.token.trim().is_empty() {
            return Err(ConfigError::Invalid("trello.token must be non-empty"));
        }
        if cfg.trello.board.trim().is_empty() {
            return Err(ConfigError::Invalid("trello.board must be non-empty"));
        }
        if cfg.elastic.host.trim().is_empty() {
            return Err(ConfigError::Invalid("elastic.host must be non-empty"));
        }
        if cfg.elastic.open_cards_index.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "elastic.open_cards_index must be non-empty",
            ));
        }
        if cfg.elastic.closed_cards_index.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "elastic.closed_cards_index must be non-empty",
            ));
        }
        if cfg.elastic.open_cards_index == cfg.elastic.closed_cards_index {
            return Err(ConfigError::Invalid(
                "elastic.open_cards_index and elastic.closed_cards_index must differ",
            ));
        }
        if cfg.elastic.bulk_chunk_size == 0 {
            return Err(ConfigError::Invalid("elastic.bulk_chunk_size must be > 0"));
        }
    }

    if cfg.actions.export_kibana_objects || cfg.actions.import_kibana_objects {
        if cfg.kibana.base_api_url.trim().is_empty() {
            return Err(ConfigError::Invalid("kibana.base_api_url must be non-empty"));
        }
        if cfg.kibana.bundle_path.trim().is_empty() {
            return Err(ConfigError::Invalid("kibana.bundle_path must be non-empty"));
        }
    }
    if cfg.actions.export_kibana_objects && cfg.kibana.objects.is_empty() {
        return Err(ConfigError::Invalid("kibana.objects must list at least one object"));
    }

    Ok(())
}

/// Returns a complete example YAML configuration.
pub fn example() -> &'static str {
    r#"trello:
  api_key: "YOUR_TRELLO_API_KEY"
  api_secret: ""
  token: "YOUR_TRELLO_TOKEN"
  board: "YOUR_TRELLO_BOARD_ID"

elastic:
  host: "http://localhost:9200"
  api_key: "YOUR_ELASTIC_API_KEY"
  open_cards_index: "trello-open-cards"
  closed_cards_index: "trello-closed-cards"
  bulk_chunk_size: 500

kibana:
  base_api_url: "http://localhost:5601/api"
  bundle_path: "kibana/KibanaExport.ndjson"
  objects:
    - type: "dashboard"
      id: "ead49010-3ec2-11ed-8d8c-37728a319e21"
    - type: "index-pattern"
      id: "14ed31a0-3ec2-11ed-8d8c-37728a319e21"

actions:
  send_data_to_elastic: true
  export_kibana_objects: false
  import_kibana_objects: false
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.kibana.objects, SavedObjectRef::defaults());
    }

    #[test]
    fn kibana_section_defaults_when_missing() {
        let yaml = r#"
trello: { api_key: "k", token: "t", board: "b" }
elastic: { host: "http://es:9200", open_cards_index: "open", closed_cards_index: "closed" }
actions: { send_data_to_elastic: true }
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.kibana.bundle_path, "kibana/KibanaExport.ndjson");
        assert_eq!(cfg.kibana.objects.len(), 2);
        assert_eq!(cfg.elastic.bulk_chunk_size, 500);
        assert!(!cfg.actions.export_kibana_objects);
    }

    #[test]
    fn kibana_only_config_needs_no_board_or_index_settings() {
        let yaml = r#"
elastic: { api_key: "kb-key" }
kibana: { base_api_url: "http://kibana:5601/api" }
actions: { export_kibana_objects: true, import_kibana_objects: true }
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.elastic.api_key, "kb-key");
        assert_eq!(cfg.elastic.bulk_chunk_size, 500);
        assert_eq!(cfg.trello, Trello::default());

        let yaml = r#"
actions: { send_data_to_elastic: true }
trello: { api_key: "k", token: "t", board: "b" }
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("elastic.host")),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn invalid_trello_credentials() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.trello.token = "".into();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("trello.token")),
            _ => panic!("wrong error"),
        }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.trello.board = " ".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn index_names_must_be_set_and_distinct() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.elastic.open_cards_index = "".into();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("open_cards_index")),
            _ => panic!("wrong error"),
        }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.elastic.closed_cards_index = cfg.elastic.open_cards_index.clone();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn disabled_phases_are_not_validated() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.actions.send_data_to_elastic = false;
        cfg.trello = Trello::default();
        validate(&cfg).unwrap();

        cfg.actions.import_kibana_objects = true;
        cfg.kibana.base_api_url = "".into();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("kibana.base_api_url")),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn env_fallbacks_fill_only_empty_fields() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.trello.token = "".into();
        cfg.elastic.api_key = "".into();

        let vars: HashMap<&str, &str> = [
            ("TRELLO_API_KEY", "env-key"),
            ("TRELLO_TOKEN", "env-token"),
            ("ELASTIC_API_KEY", "env-elastic"),
        ]
        .into_iter()
        .collect();
        cfg.apply_fallbacks_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(cfg.trello.api_key, "YOUR_TRELLO_API_KEY");
        assert_eq!(cfg.trello.token, "env-token");
        assert_eq!(cfg.elastic.api_key, "env-elastic");
        assert_eq!(cfg.trello.api_secret, "");
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.elastic.closed_cards_index, "trello-closed-cards");
        assert!(cfg.any_action());
    }
}
