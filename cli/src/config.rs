use std::path::{Path, PathBuf};

use citemark::{Citation, CitationTable, RenderConfig};
use serde::Deserialize;
use studio::StudioConfig;
use thiserror::Error;

/// Looked up in the working directory when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "citemark.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML in '{path}': {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Contents of `citemark.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
    pub studio: StudioConfig,
}

impl Config {
    /// Load `path`, or `citemark.toml` from the working directory when it
    /// exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Config::default());
                }
                default
            }
        };
        let config: Config = read_toml(&path)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

/// `[[citation]]` entries of a TOML citation file.
#[derive(Debug, Deserialize)]
struct CitationFile {
    #[serde(default, rename = "citation")]
    citations: Vec<Citation>,
}

/// Load a citation table: a JSON array of citations, or a TOML file of
/// `[[citation]]` tables.
pub fn load_citations(path: &Path) -> Result<CitationTable, ConfigError> {
    let citations = if is_json(path) {
        read_json::<Vec<Citation>>(path)?
    } else {
        read_toml::<CitationFile>(path)?.citations
    };
    Ok(citations.into_iter().collect())
}

/// Load any serde type from a `.json` or TOML file.
pub fn load_data<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if is_json(path) {
        read_json(path)
    } else {
        read_toml(path)
    }
}

pub fn read_source(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = read_source(path)?;
    toml::from_str(&text).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = read_source(path)?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}
