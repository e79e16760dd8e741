use crate::query::engine::{QueryLimits, DEFAULT_MAX_DEPTH, DEFAULT_MAX_RESULTS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Result ceiling applied to every query
    pub max_results: usize,
    /// Deepest traversal a query may request
    pub max_depth: usize,
    /// JSON-lines file of entity updates replayed at startup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay: Option<PathBuf>,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            max_depth: DEFAULT_MAX_DEPTH,
            replay: None,
            server: ServerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
        }
    }
}

impl GraphConfig {
    pub fn limits(&self) -> QueryLimits {
        QueryLimits::new(self.max_results, self.max_depth)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_results == 0 {
            anyhow::bail!("max_results must be greater than zero");
        }
        if self.max_depth == 0 {
            anyhow::bail!("max_depth must be greater than zero");
        }
        if self.server.host.trim().is_empty() {
            anyhow::bail!("server.host must not be empty");
        }
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("factgraph.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<GraphConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: GraphConfig = toml::from_str(&contents)?;
    config.validate()?;
    Ok(Some(config))
}

/// Load the config file if present, otherwise defaults
pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<GraphConfig> {
    Ok(load_config(path)?.unwrap_or_default())
}

pub fn write_config(path: &Path, config: &GraphConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
