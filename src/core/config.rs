//! Configuration management for traceloom.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Environment variable overrides
//! - Validation and defaults
//!
//! Adapter construction fails fast when the configured backend is missing
//! a required credential or endpoint.

use crate::core::error::{LoomError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete configuration for traceloom
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which backend the dispatcher selects
    pub backend: BackendKind,
    /// Datadog credentials, required when `backend = datadog`
    pub datadog: Option<DatadogConfig>,
    /// Grafana stack endpoints, required when `backend = grafana`
    pub grafana: Option<GrafanaConfig>,
    /// Query behavior
    pub query: QueryConfig,
    /// Default facet lists offered to callers
    pub facets: FacetConfig,
}

/// Supported backend variants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Datadog-style tracing platform
    #[default]
    Datadog,
    /// Grafana stack: Loki for logs, Tempo for traces
    Grafana,
}

impl BackendKind {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "datadog" => Ok(Self::Datadog),
            "grafana" | "loki" => Ok(Self::Grafana),
            other => Err(LoomError::config(format!("unknown backend '{}'", other))),
        }
    }
}

/// Datadog API credentials and site
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatadogConfig {
    /// Datadog site, e.g. "datadoghq.com" or "datadoghq.eu"
    pub site: String,
    /// API key (`DD-API-KEY` header)
    pub api_key: String,
    /// Application key (`DD-APPLICATION-KEY` header)
    pub app_key: String,
}

impl Default for DatadogConfig {
    fn default() -> Self {
        Self {
            site: "datadoghq.com".to_string(),
            api_key: String::new(),
            app_key: String::new(),
        }
    }
}

/// Grafana stack endpoints and basic-auth credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GrafanaConfig {
    /// Loki base URL, e.g. "https://logs.example.grafana.net"
    pub loki_url: String,
    /// Tempo base URL, e.g. "https://tempo.example.grafana.net"
    pub tempo_url: String,
    /// Basic-auth username
    pub username: Option<String>,
    /// Basic-auth password or API token
    pub password: Option<String>,
}

/// Query behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Default page size when the caller does not specify one
    pub default_limit: usize,
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Maximum pages the adapter follows internally when hydrating the
    /// complete span set of matched traces
    pub trace_page_cap: usize,
    /// Maximum distinct trace ids hydrated per trace-search call
    pub max_trace_ids: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 100,
            request_timeout: Duration::from_secs(30),
            trace_page_cap: 10,
            max_trace_ids: 25,
        }
    }
}

/// Default facet lists, explicit configuration rather than module statics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetConfig {
    /// Facets enumerated for log queries
    pub log_facets: Vec<String>,
    /// Facets enumerated for span queries
    pub span_facets: Vec<String>,
}

impl Default for FacetConfig {
    fn default() -> Self {
        Self {
            log_facets: vec!["service".to_string(), "status".to_string()],
            span_facets: vec![
                "service".to_string(),
                "resource_name".to_string(),
                "operation_name".to_string(),
            ],
        }
    }
}

impl Config {
    /// Validates the configuration, failing fast on a missing credential
    /// or endpoint for the selected backend.
    pub fn validate(&self) -> Result<()> {
        if self.query.default_limit == 0 {
            return Err(LoomError::config("query.default_limit must be positive"));
        }
        match self.backend {
            BackendKind::Datadog => {
                let dd = self
                    .datadog
                    .as_ref()
                    .ok_or_else(|| LoomError::config("backend is datadog but [datadog] is not configured"))?;
                if dd.site.is_empty() {
                    return Err(LoomError::config("datadog.site is required"));
                }
                if dd.api_key.is_empty() {
                    return Err(LoomError::config("datadog.api_key is required"));
                }
                if dd.app_key.is_empty() {
                    return Err(LoomError::config("datadog.app_key is required"));
                }
            }
            BackendKind::Grafana => {
                let gf = self
                    .grafana
                    .as_ref()
                    .ok_or_else(|| LoomError::config("backend is grafana but [grafana] is not configured"))?;
                if gf.loki_url.is_empty() {
                    return Err(LoomError::config("grafana.loki_url is required"));
                }
                if gf.tempo_url.is_empty() {
                    return Err(LoomError::config("grafana.tempo_url is required"));
                }
                if gf.username.is_some() != gf.password.is_some() {
                    return Err(LoomError::config(
                        "grafana basic auth requires both username and password",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Builder applying configuration sources in precedence order:
/// file, then environment variables.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from YAML content
    pub fn from_yaml(mut self, content: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(content)
            .map_err(|e| LoomError::config(format!("invalid YAML configuration: {}", e)))?;
        Ok(self)
    }

    /// Apply `TRACELOOM_*` environment variable overrides
    pub fn from_env(mut self) -> Result<Self> {
        if let Ok(backend) = std::env::var("TRACELOOM_BACKEND") {
            self.config.backend = BackendKind::parse(&backend)?;
        }

        let dd_vars = [
            std::env::var("TRACELOOM_DD_SITE").ok(),
            std::env::var("TRACELOOM_DD_API_KEY").ok(),
            std::env::var("TRACELOOM_DD_APP_KEY").ok(),
        ];
        if dd_vars.iter().any(Option::is_some) {
            let dd = self.config.datadog.get_or_insert_with(Default::default);
            let [site, api_key, app_key] = dd_vars;
            if let Some(site) = site {
                dd.site = site;
            }
            if let Some(api_key) = api_key {
                dd.api_key = api_key;
            }
            if let Some(app_key) = app_key {
                dd.app_key = app_key;
            }
        }

        let gf_vars = [
            std::env::var("TRACELOOM_LOKI_URL").ok(),
            std::env::var("TRACELOOM_TEMPO_URL").ok(),
            std::env::var("TRACELOOM_GRAFANA_USERNAME").ok(),
            std::env::var("TRACELOOM_GRAFANA_PASSWORD").ok(),
        ];
        if gf_vars.iter().any(Option::is_some) {
            let gf = self.config.grafana.get_or_insert_with(Default::default);
            let [loki_url, tempo_url, username, password] = gf_vars;
            if let Some(loki_url) = loki_url {
                gf.loki_url = loki_url;
            }
            if let Some(tempo_url) = tempo_url {
                gf.tempo_url = tempo_url;
            }
            if username.is_some() {
                gf.username = username;
            }
            if password.is_some() {
                gf.password = password;
            }
        }

        Ok(self)
    }

    /// Validate and return the final configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datadog_config() -> Config {
        Config {
            backend: BackendKind::Datadog,
            datadog: Some(DatadogConfig {
                site: "datadoghq.com".to_string(),
                api_key: "api".to_string(),
                app_key: "app".to_string(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_datadog_ok() {
        assert!(datadog_config().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_credential() {
        let mut config = datadog_config();
        config.datadog.as_mut().unwrap().app_key.clear();
        let err = config.validate().unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_validate_missing_section() {
        let config = Config {
            backend: BackendKind::Grafana,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_lopsided_basic_auth() {
        let config = Config {
            backend: BackendKind::Grafana,
            grafana: Some(GrafanaConfig {
                loki_url: "http://loki".to_string(),
                tempo_url: "http://tempo".to_string(),
                username: Some("user".to_string()),
                password: None,
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
backend: grafana
grafana:
  loki_url: "http://localhost:3100"
  tempo_url: "http://localhost:3200"
query:
  default_limit: 50
  request_timeout: 10s
facets:
  log_facets: ["service", "level"]
"#;
        let config = ConfigBuilder::new().from_yaml(yaml).unwrap().build().unwrap();
        assert_eq!(config.backend, BackendKind::Grafana);
        assert_eq!(config.query.default_limit, 50);
        assert_eq!(config.query.request_timeout, Duration::from_secs(10));
        assert_eq!(config.facets.log_facets, vec!["service", "level"]);
        // Unset sections fall back to defaults
        assert_eq!(config.query.trace_page_cap, 10);
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(ConfigBuilder::new().from_yaml(": not yaml :").is_err());
    }
}
