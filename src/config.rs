use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub vonage: VonageConfig,
    #[serde(default)]
    pub call: CallConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

#[derive(Debug, Deserialize, Clone)]
pub struct VonageConfig {
    /// Voice API host, e.g. `api-us.vonage.com`. Requests go to `https://<api_region>`.
    #[serde(default)]
    pub api_region: String,
    #[serde(default)]
    pub application_id: String,
    #[serde(default = "default_private_key_path")]
    pub private_key_path: String,
}

impl Default for VonageConfig {
    fn default() -> Self {
        Self {
            api_region: String::new(),
            application_id: String::new(),
            private_key_path: default_private_key_path(),
        }
    }
}

fn default_private_key_path() -> String {
    "./.private.key".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CallConfig {
    /// Caller id used for every outbound call and connect action.
    #[serde(default)]
    pub service_phone_number: String,
    /// Passed to the Voice API as `length_timer`, in seconds.
    #[serde(default)]
    pub max_call_duration: Option<u32>,
    /// Host of the external audio processor. The relay's own host is used when unset.
    #[serde(default)]
    pub processor_server: Option<String>,
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_style")]
    pub style: u32,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            service_phone_number: String::new(),
            max_call_duration: None,
            processor_server: None,
            greeting: default_greeting(),
            language: default_language(),
            style: default_style(),
        }
    }
}

fn default_greeting() -> String {
    "Hello. This is a call from your preferred provider, please wait.".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_style() -> u32 {
    11
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WebhookConfig {
    /// Signature secret for signed webhooks. Unset means webhooks are accepted unauthenticated.
    #[serde(default)]
    pub signature_secret: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        // .env next to config.toml first, then the working directory
        let env_path = config_dir().join(".env");
        match dotenvy::from_path(&env_path) {
            Ok(()) => tracing::info!("Loaded .env from {}", env_path.display()),
            Err(dotenvy::Error::Io(_)) => {
                tracing::debug!("No .env file at {}", env_path.display());
            }
            Err(e) => tracing::warn!("Failed to parse .env: {e}"),
        }
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Failed to parse .env: {e}");
            }
        }

        let path = config_path();
        let mut config = if path.exists() {
            tracing::info!("Loading config from {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::info!(
                "No config at {}, using environment only",
                path.display()
            );
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Apply environment overrides. `lookup` is `std::env::var` outside of tests.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup("API_REGION") {
            self.vonage.api_region = v;
        }
        if let Some(v) = lookup("APP_ID") {
            self.vonage.application_id = v;
        }
        if let Some(v) = lookup("PRIVATE_KEY_PATH") {
            self.vonage.private_key_path = v;
        }
        if let Some(v) = lookup("SERVICE_PHONE_NUMBER") {
            self.call.service_phone_number = v;
        }
        if let Some(v) = lookup("PROCESSOR_SERVER") {
            self.call.processor_server = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("MAX_CALL_DURATION") {
            let secs = v.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "MAX_CALL_DURATION",
                value: v.clone(),
            })?;
            self.call.max_call_duration = Some(secs);
        }
        if let Some(v) = lookup("WEBHOOK_SIGNATURE_SECRET") {
            self.webhook.signature_secret = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        // Hosting platform port wins over a plain PORT
        if let Some(v) = lookup("VCR_PORT").or_else(|| lookup("PORT")) {
            self.server.port = v.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: v.clone(),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vonage.api_region.is_empty() {
            return Err(ConfigError::Missing("vonage.api_region (API_REGION)"));
        }
        if self.vonage.application_id.is_empty() {
            return Err(ConfigError::Missing("vonage.application_id (APP_ID)"));
        }
        if self.call.service_phone_number.is_empty() {
            return Err(ConfigError::Missing(
                "call.service_phone_number (SERVICE_PHONE_NUMBER)",
            ));
        }
        Ok(())
    }
}

fn config_dir() -> PathBuf {
    if let Ok(p) = std::env::var("CALL_RELAY_CONFIG") {
        let path = PathBuf::from(p);
        return path.parent().map(|p| p.to_path_buf()).unwrap_or(path);
    }

    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".call-relay")
}

fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("CALL_RELAY_CONFIG") {
        return PathBuf::from(p);
    }

    config_dir().join("config.toml")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn parses_full_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 3000

            [vonage]
            api_region = "api-eu.vonage.com"
            application_id = "app-1"

            [call]
            service_phone_number = "12995550101"
            max_call_duration = 300
            processor_server = "processor.example.com"

            [webhook]
            signature_secret = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.vonage.private_key_path, "./.private.key");
        assert_eq!(config.call.max_call_duration, Some(300));
        assert_eq!(
            config.call.processor_server.as_deref(),
            Some("processor.example.com")
        );
        assert_eq!(config.call.style, 11);
        assert_eq!(config.webhook.signature_secret.as_deref(), Some("s3cret"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.call.language, "en-US");
        assert!(config.call.greeting.starts_with("Hello."));
        assert!(config.call.processor_server.is_none());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("API_REGION", "api-us.vonage.com"),
                ("APP_ID", "abc"),
                ("SERVICE_PHONE_NUMBER", "12995550101"),
                ("PROCESSOR_SERVER", "proc.example.com"),
                ("MAX_CALL_DURATION", "600"),
                ("PORT", "9000"),
            ]))
            .unwrap();

        assert_eq!(config.vonage.api_region, "api-us.vonage.com");
        assert_eq!(config.vonage.application_id, "abc");
        assert_eq!(config.call.service_phone_number, "12995550101");
        assert_eq!(
            config.call.processor_server.as_deref(),
            Some("proc.example.com")
        );
        assert_eq!(config.call.max_call_duration, Some(600));
        assert_eq!(config.server.port, 9000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn vcr_port_takes_precedence() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("VCR_PORT", "8080"), ("PORT", "9000")]))
            .unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn empty_processor_server_is_unset() {
        let mut config = Config::default();
        config.apply_env(env(&[("PROCESSOR_SERVER", "")])).unwrap();
        assert!(config.call.processor_server.is_none());
    }

    #[test]
    fn rejects_non_numeric_duration() {
        let mut config = Config::default();
        let err = config
            .apply_env(env(&[("MAX_CALL_DURATION", "forever")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "MAX_CALL_DURATION",
                ..
            }
        ));
    }

    #[test]
    fn missing_service_number_fails_validation() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("API_REGION", "api.nexmo.com"), ("APP_ID", "abc")]))
            .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SERVICE_PHONE_NUMBER"));
    }
}
