use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_PORT: u16 = 8003;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1000,
            temperature: 0.1,
            timeout_secs: 60,
            api_key: None,
        }
    }
}

impl AnalyzerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub analyzer: AnalyzerConfig,
}

impl AppConfig {
    /// Reads the optional YAML file named by `FIXME_CONFIG`, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let vars = unicode_vars(std::env::vars_os());
        let mut config = match vars.get("FIXME_CONFIG") {
            Some(path) => {
                let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                Self::from_yaml(&config_str)?
            }
            None => Self::default(),
        };
        config.apply_env(&vars)?;
        Ok(config)
    }

    pub fn from_yaml(config_str: &str) -> Result<Self, ConfigError> {
        if config_str.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(config_str)?)
    }

    pub fn apply_env(&mut self, vars: &HashMap<String, String>) -> Result<(), ConfigError> {
        let non_empty = |name: &str| {
            vars.get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        self.analyzer.api_key = non_empty("OPENAI_API_KEY");
        if let Some(base_url) = non_empty("OPENAI_BASE_URL") {
            self.analyzer.base_url = base_url;
        }
        if let Some(model) = non_empty("OPENAI_MODEL") {
            self.analyzer.model = model;
        }
        if let Some(timeout) = non_empty("ANALYSIS_TIMEOUT_SECS") {
            self.analyzer.timeout_secs = parse_var("ANALYSIS_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(host) = non_empty("HOST") {
            self.server.host = host;
        }
        if let Some(port) = non_empty("PORT") {
            self.server.port = parse_var("PORT", &port)?;
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Keeps the variables whose name and value are both valid UTF-8; the rest are not ours to read.
fn unicode_vars(vars: impl IntoIterator<Item = (OsString, OsString)>) -> HashMap<String, String> {
    vars.into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_variables_are_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let vars = unicode_vars(vec![
            (OsString::from("OPENAI_API_KEY"), OsString::from("sk-test")),
            (OsString::from("BROKEN"), OsString::from_vec(vec![0x66, 0xff, 0x6f])),
        ]);
        assert_eq!(vars.len(), 1);
        assert_eq!(vars.get("OPENAI_API_KEY").map(String::as_str), Some("sk-test"));
    }

    #[test]
    fn defaults_without_environment() {
        let mut config = AppConfig::default();
        config.apply_env(&HashMap::new()).unwrap();
        assert_eq!(config.analyzer.model, "gpt-4o");
        assert_eq!(config.analyzer.max_tokens, 1000);
        assert_eq!(config.analyzer.timeout_secs, 60);
        assert!(!config.analyzer.is_configured());
        assert_eq!(config.bind_address(), "0.0.0.0:8003");
    }

    #[test]
    fn empty_api_key_is_not_configured() {
        let mut config = AppConfig::default();
        config.apply_env(&vars(&[("OPENAI_API_KEY", "  ")])).unwrap();
        assert!(!config.analyzer.is_configured());

        config.apply_env(&vars(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.analyzer.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn yaml_then_environment_overrides() {
        let mut config = AppConfig::from_yaml(
            "analyzer:\n  model: gpt-4o-mini\n  temperature: 0.3\nserver:\n  port: 9000\n",
        )
        .unwrap();
        assert_eq!(config.analyzer.model, "gpt-4o-mini");
        assert_eq!(config.analyzer.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.server.port, 9000);

        config
            .apply_env(&vars(&[("PORT", "8080"), ("ANALYSIS_TIMEOUT_SECS", "15")]))
            .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.analyzer.timeout(), Duration::from_secs(15));
        assert_eq!(config.analyzer.model, "gpt-4o-mini");
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let mut config = AppConfig::default();
        let err = config.apply_env(&vars(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "PORT", .. }));
    }
}
