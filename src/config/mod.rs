use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::mapping::FieldMapping;

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    #[serde(alias = "url")]
    pub base_url: Option<String>,
    pub deployment: Option<String>,
    pub timeout: Option<u64>,
    pub api_key: Option<String>,
    pub header: Option<String>,
    pub proxy: Option<String>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
    pub chart: Option<bool>,
    pub deployments: Option<BTreeMap<String, FieldMapping>>,
}

impl ConfigFile {
    pub fn custom_deployments(&self) -> Vec<FieldMapping> {
        self.deployments
            .as_ref()
            .map(|all| {
                all.iter()
                    .map(|(name, mapping)| {
                        let mut mapping = mapping.clone();
                        mapping.name = name.clone();
                        mapping
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found '{}'", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to write config '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config path '{}'", path.display())]
    InvalidPath { path: PathBuf },
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".ecopack").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).to_string_lossy().to_string()
}

pub fn parse_config(contents: &str, path: &Path) -> Result<ConfigFile, ConfigError> {
    serde_yaml::from_str::<ConfigFile>(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents, path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub fn default_config_yaml() -> String {
    r#"# EcoPack config
#
# Location (default):
#   ~/.ecopack/config.yml

# Backend
base_url: http://127.0.0.1:5000
# Built-in deployments: recommend, catalog, predict, product
deployment: recommend
timeout: 10

# HTTP (optional)
# api_key: secret
# header: "Key: Value"
# proxy: http://127.0.0.1:8080

# Output (optional)
# output: ./recommendations.html
# output_format: html
no_color: false
chart: true

# Custom field-mapping tables (optional)
# deployments:
#   legacy:
#     endpoint: /api/v0/recommend
#     request:
#       - { name: weight, key: weight_g, input: weight, kind: number }
#       - { name: fragility, key: fragility_level, input: fragility, kind: text }
#     response:
#       list_key: results
#       material: [material]
#       cost: [cost_inr]
#       co2: [co2_kg]
#       score: [score]
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &Path) -> Result<bool, ConfigError> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path.parent().ok_or_else(|| ConfigError::InvalidPath {
        path: path.to_path_buf(),
    })?;
    std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
        path: parent.to_path_buf(),
        source,
    })?;
    std::fs::write(path, default_config_yaml()).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}
