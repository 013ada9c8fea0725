//! Bridge configuration.

/// Environment variable holding the default tracing filter.
pub const LOG_ENV: &str = "WLC_BRIDGE_LOG";

/// Environment variable switching engine log forwarding (`0`/`false` to disable).
pub const FORWARD_LOG_ENV: &str = "WLC_BRIDGE_FORWARD_LOG";

/// Configuration for the bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Process arguments forwarded unmodified to the engine at initialize
    pub args: Vec<String>,
    /// Route the engine's own log lines into `tracing`
    pub forward_engine_log: bool,
    /// Filter used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            args: std::env::args().collect(),
            forward_engine_log: true,
            log_filter: "info,wlc_bridge=debug".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Defaults overridden from `WLC_BRIDGE_LOG` and `WLC_BRIDGE_FORWARD_LOG`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(filter) = lookup(LOG_ENV).filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter;
        }
        if let Some(flag) = lookup(FORWARD_LOG_ENV) {
            config.forward_engine_log = parse_flag(&flag).unwrap_or(config.forward_engine_log);
        }
        config
    }

    /// No process arguments and no engine log forwarding.
    pub fn for_tests() -> Self {
        Self {
            args: vec!["wlc-bridge".to_string()],
            forward_engine_log: false,
            log_filter: "debug".to_string(),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert!(config.forward_engine_log);
        assert_eq!(config.log_filter, "info,wlc_bridge=debug");
        assert!(!config.args.is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let config = BridgeConfig::from_lookup(lookup(&[
            (LOG_ENV, "trace"),
            (FORWARD_LOG_ENV, "off"),
        ]));
        assert_eq!(config.log_filter, "trace");
        assert!(!config.forward_engine_log);
    }

    #[test]
    fn test_invalid_flag_keeps_default() {
        let config = BridgeConfig::from_lookup(lookup(&[(FORWARD_LOG_ENV, "maybe"), (LOG_ENV, " ")]));
        assert!(config.forward_engine_log);
        assert_eq!(config.log_filter, "info,wlc_bridge=debug");
    }
}
