use serde::Deserialize;
use std::path::Path;

/// Node bootstrap configuration. Grounded on the teacher's
/// `testnet_config.rs` TOML-loading pattern.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default)]
    pub gossip_peers: Vec<String>,
    /// RNG seed for reproducible test networks. Omit for entropy-seeded
    /// (production) randomness.
    #[serde(default)]
    pub rng_seed: Option<u64>,
    #[serde(default = "default_block_production_interval_secs")]
    pub block_production_interval_secs: u64,
}

fn default_listen_addr() -> String {
    "127.0.0.1:7878".to_string()
}

fn default_block_production_interval_secs() -> u64 {
    5
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            listen_addr: default_listen_addr(),
            gossip_peers: Vec::new(),
            rng_seed: None,
            block_production_interval_secs: default_block_production_interval_secs(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

pub fn load_config(path: &Path) -> Result<NodeConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_partial_config_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.toml");
        std::fs::write(&path, "listen_addr = \"0.0.0.0:9000\"\n").unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.listen_addr, "0.0.0.0:9000");
        assert!(cfg.gossip_peers.is_empty());
        assert_eq!(cfg.block_production_interval_secs, 5);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_config(Path::new("/nonexistent/node.toml"));
        assert!(matches!(err, Err(ConfigError::Read { .. })));
    }
}
