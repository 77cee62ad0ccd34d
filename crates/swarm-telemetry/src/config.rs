//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to log lines
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive
    pub log_level: String,

    /// Whether to write log lines to stdout at all
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to include thread names in log lines
    pub thread_names: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "swarm-node".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            thread_names: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SW_SERVICE_NAME`: Service name (default: swarm-node)
    /// - `SW_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `SW_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `SW_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `SW_THREAD_NAMES`: Include thread names (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`TelemetryConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();
        let defaults = Self::default();

        Self {
            service_name: lookup("SW_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: lookup("SW_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: lookup("SW_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.console_output),

            json_logs: lookup("SW_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            thread_names: lookup("SW_THREAD_NAMES")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.thread_names),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "swarm-node");
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_overrides() {
        let config = TelemetryConfig::from_lookup(lookup_from(&[
            ("SW_LOG_LEVEL", "debug"),
            ("SW_JSON_LOGS", "1"),
            ("SW_CONSOLE_OUTPUT", "false"),
        ]));
        assert_eq!(config.log_level, "debug");
        assert!(config.json_logs);
        assert!(!config.console_output);
    }

    #[test]
    fn test_rust_log_fallback() {
        let config = TelemetryConfig::from_lookup(lookup_from(&[("RUST_LOG", "warn")]));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_containers_default_to_json() {
        let config =
            TelemetryConfig::from_lookup(lookup_from(&[("KUBERNETES_SERVICE_HOST", "10.0.0.1")]));
        assert!(config.json_logs);
    }
}
