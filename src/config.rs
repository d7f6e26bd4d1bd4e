use std::env;
use std::time::Duration;

use log::warn;
use uuid::Uuid;

use crate::blockchain::DEFAULT_DIFFICULTY;

/// Node settings, read from the environment (and `.env` via `dotenvy`).
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    pub difficulty: u32,
    /// Identity credited with mining rewards.
    pub node_id: String,
    pub peer_timeout: Duration,
    pub mine_timeout: Duration,
    /// Registered at startup.
    pub bootstrap_peers: Vec<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            difficulty: DEFAULT_DIFFICULTY,
            node_id: new_node_id(),
            peer_timeout: Duration::from_secs(5),
            mine_timeout: Duration::from_secs(120),
            bootstrap_peers: Vec::new(),
        }
    }
}

impl NodeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "PORT", defaults.port),
            difficulty: parse_or(&get, "DIFFICULTY", defaults.difficulty),
            node_id: get("NODE_ID")
                .filter(|id| !id.trim().is_empty())
                .unwrap_or(defaults.node_id),
            peer_timeout: Duration::from_secs(parse_or(
                &get,
                "PEER_TIMEOUT_SECS",
                defaults.peer_timeout.as_secs(),
            )),
            mine_timeout: Duration::from_secs(parse_or(
                &get,
                "MINE_TIMEOUT_SECS",
                defaults.mine_timeout.as_secs(),
            )),
            bootstrap_peers: get("PEERS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

fn parse_or<T: std::str::FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match get(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring unparseable {key}={raw:?}");
            default
        }),
        None => default,
    }
}

/// Random identifier: a v4 UUID without dashes.
fn new_node_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> NodeConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NodeConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.difficulty, DEFAULT_DIFFICULTY);
        assert_eq!(cfg.node_id.len(), 32);
        assert_eq!(cfg.peer_timeout, Duration::from_secs(5));
        assert!(cfg.bootstrap_peers.is_empty());
    }

    #[test]
    fn reads_overrides_and_skips_garbage() {
        let cfg = config_from(&[
            ("PORT", "5001"),
            ("DIFFICULTY", "lots"),
            ("NODE_ID", "node-a"),
            ("PEER_TIMEOUT_SECS", "2"),
            ("PEERS", "localhost:5002, http://10.0.0.3:5000/ ,"),
        ]);
        assert_eq!(cfg.port, 5001);
        assert_eq!(cfg.difficulty, DEFAULT_DIFFICULTY);
        assert_eq!(cfg.node_id, "node-a");
        assert_eq!(cfg.peer_timeout, Duration::from_secs(2));
        assert_eq!(
            cfg.bootstrap_peers,
            vec!["localhost:5002", "http://10.0.0.3:5000/"]
        );
    }
}
