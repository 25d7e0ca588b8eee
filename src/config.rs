use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub azure: AzureConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct AzureConfig {
    #[serde(default)]
    pub organization_url: String,
    #[serde(default)]
    pub personal_access_token: String,
    #[serde(default)]
    pub project_id: String,
    pub request_timeout_secs: Option<u64>,
}

impl AzureConfig {
    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ServerConfig {
    pub bind: Option<String>,
}

impl ServerConfig {
    pub fn bind(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }
}

fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("STORY_BRIDGE_CONFIG") {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".story-bridge")
        .join("config.toml")
}

pub fn load_config() -> Result<AppConfig> {
    let mut config = load_config_from(&config_path())?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;
    Ok(config)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig =
        toml::from_str(&contents).with_context(|| "Failed to parse config.toml")?;
    Ok(config)
}

/// Environment variables win over the file so credentials can stay out of it.
pub fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("AZURE_DEVOPS_ORG_URL") {
        config.azure.organization_url = v;
    }
    if let Some(v) = lookup("AZURE_DEVOPS_PAT") {
        config.azure.personal_access_token = v;
    }
    if let Some(v) = lookup("AZURE_DEVOPS_PROJECT") {
        config.azure.project_id = v;
    }
    if let Some(v) = lookup("STORY_BRIDGE_BIND") {
        config.server.bind = Some(v);
    }
}

pub fn validate(config: &AppConfig) -> Result<()> {
    let azure = &config.azure;
    if azure.organization_url.trim().is_empty() {
        bail!("Missing azure.organization_url (or AZURE_DEVOPS_ORG_URL)");
    }
    if azure.personal_access_token.trim().is_empty() {
        bail!("Missing azure.personal_access_token (or AZURE_DEVOPS_PAT)");
    }
    if azure.project_id.trim().is_empty() {
        bail!("Missing azure.project_id (or AZURE_DEVOPS_PROJECT)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), contents).unwrap();
        file
    }

    #[test]
    fn parses_full_config() {
        let file = write_config(
            r#"
[azure]
organization_url = "https://dev.azure.com/acme"
personal_access_token = "secret"
project_id = "Platform"
request_timeout_secs = 10

[server]
bind = "127.0.0.1:9000"
"#,
        );
        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.azure.organization_url, "https://dev.azure.com/acme");
        assert_eq!(config.azure.project_id, "Platform");
        assert_eq!(config.azure.request_timeout_secs(), 10);
        assert_eq!(config.server.bind(), "127.0.0.1:9000");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.bind(), "0.0.0.0:8000");
        assert_eq!(config.azure.request_timeout_secs(), 30);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let file = write_config("[azure\norganization_url = ");
        let err = load_config_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn env_overrides_file_values() {
        let file = write_config(
            r#"
[azure]
organization_url = "https://dev.azure.com/acme"
personal_access_token = "from-file"
project_id = "Platform"
"#,
        );
        let mut config = load_config_from(file.path()).unwrap();
        let env: HashMap<&str, &str> = [
            ("AZURE_DEVOPS_PAT", "from-env"),
            ("STORY_BRIDGE_BIND", "127.0.0.1:1234"),
        ]
        .into_iter()
        .collect();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.azure.personal_access_token, "from-env");
        assert_eq!(config.azure.project_id, "Platform");
        assert_eq!(config.server.bind(), "127.0.0.1:1234");
    }

    #[test]
    fn validation_names_the_missing_setting() {
        let mut config = AppConfig::default();
        config.azure.organization_url = "https://dev.azure.com/acme".into();
        config.azure.personal_access_token = "pat".into();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("project_id"));
    }
}
