//! Configuration loader and validator for the TopScore exporter.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::Resource;

pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub topscore: TopScore,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
    pub output_dir: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// TopScore API access: the credential plus an optional explicit API base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopScore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(flatten)]
    pub credential: Credential,
}

/// The five secrets needed to authorize queries. Never logged.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub auth_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("auth_url", &self.auth_url)
            .field("client_id", &"[REDACTED]")
            .field("client_secret", &"[REDACTED]")
            .field("username", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Everything the export pipeline needs, passed in explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub page_size: NonZeroU32,
}

impl ExportSettings {
    /// Default table location for a resource, e.g. `{output_dir}/players.csv`.
    pub fn output_path(&self, resource: Resource) -> PathBuf {
        self.output_dir.join(resource.output_file_name())
    }
}

impl App {
    /// `data_dir` with a leading `~/` expanded to `$HOME`.
    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_home(&self.data_dir)
    }

    pub fn resolved_output_dir(&self) -> PathBuf {
        expand_home(&self.output_dir)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return Path::new(&home).join(rest);
        }
    }
    PathBuf::from(path)
}

impl Config {
    /// Ensure required directories exist (creates data and output dirs if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        fs::create_dir_all(self.app.resolved_data_dir())?;
        fs::create_dir_all(self.app.resolved_output_dir())
    }

    pub fn export_settings(&self) -> Result<ExportSettings, ConfigError> {
        let page_size = NonZeroU32::new(self.app.page_size)
            .ok_or(ConfigError::Invalid("app.page_size must be > 0"))?;
        Ok(ExportSettings {
            data_dir: self.app.resolved_data_dir(),
            output_dir: self.app.resolved_output_dir(),
            page_size,
        })
    }

    /// Swap in a credential loaded from elsewhere (e.g. the legacy credentials file).
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.topscore.credential = credential;
        self
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Load the legacy plain-text credentials file: auth URL, client id, client
/// secret, username and password, one per line.
pub fn load_credentials_file(path: &Path) -> Result<Credential, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_credentials(&content)
}

pub fn parse_credentials(content: &str) -> Result<Credential, ConfigError> {
    let mut lines = content.lines().map(str::trim_end);
    let mut next = |what: &'static str| -> Result<String, ConfigError> {
        match lines.next() {
            Some(line) if !line.is_empty() => Ok(line.to_string()),
            _ => Err(ConfigError::Invalid(what)),
        }
    };
    let credential = Credential {
        auth_url: next("credentials file: line 1 (auth URL) missing")?,
        client_id: next("credentials file: line 2 (client id) missing")?,
        client_secret: next("credentials file: line 3 (client secret) missing")?,
        username: next("credentials file: line 4 (username) missing")?,
        password: next("credentials file: line 5 (password) missing")?,
    };
    Ok(credential)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if cfg.app.output_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.output_dir must be non-empty"));
    }
    if cfg.app.page_size == 0 {
        return Err(ConfigError::Invalid("app.page_size must be > 0"));
    }

    let c = &cfg.topscore.credential;
    if c.auth_url.trim().is_empty() {
        return Err(ConfigError::Invalid("topscore.auth_url must be non-empty"));
    }
    if c.client_id.trim().is_empty() {
        return Err(ConfigError::Invalid("topscore.client_id must be non-empty"));
    }
    if c.client_secret.trim().is_empty() {
        return Err(ConfigError::Invalid("topscore.client_secret must be non-empty"));
    }
    if c.username.trim().is_empty() {
        return Err(ConfigError::Invalid("topscore.username must be non-empty"));
    }
    if c.password.trim().is_empty() {
        return Err(ConfigError::Invalid("topscore.password must be non-empty"));
    }
    if let Some(base) = &cfg.topscore.api_base {
        if base.trim().is_empty() {
            return Err(ConfigError::Invalid("topscore.api_base must be non-empty when set"));
        }
    }

    Ok(())
}

/// Returns the example YAML content.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"
  output_dir: "./output"
  page_size: 100

topscore:
  auth_url: "https://example.usetopscore.com/api/oauth/server"
  client_id: "YOUR_CLIENT_ID"
  client_secret: "YOUR_CLIENT_SECRET"
  username: "YOUR_USERNAME"
  password: "YOUR_PASSWORD"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.app.page_size, 100);
        assert!(cfg.topscore.api_base.is_none());
    }

    #[test]
    fn page_size_defaults_to_100() {
        let yaml = example().replace("  page_size: 100\n", "");
        let cfg: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(cfg.app.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn invalid_page_size() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.page_size = 0;
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("page_size")), _ => panic!("wrong error") }
        assert!(matches!(cfg.export_settings(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn invalid_credentials() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.topscore.credential.client_secret = "  ".into();
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("client_secret")), _ => panic!("wrong error") }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.topscore.credential.password = "".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.topscore.api_base = Some("".into());
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn invalid_dirs() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.data_dir = "".into();
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("data_dir")), _ => panic!("wrong error") }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.output_dir = "".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn credential_debug_is_redacted() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        let shown = format!("{:?}", cfg.topscore.credential);
        assert!(shown.contains("[REDACTED]"));
        assert!(!shown.contains("YOUR_PASSWORD"));
        assert!(!shown.contains("YOUR_CLIENT_SECRET"));
    }

    #[test]
    fn parse_credentials_strips_trailing_whitespace() {
        let c = parse_credentials("https://a/oauth \nid\r\nsecret\nuser\npass  \n").unwrap();
        assert_eq!(c.auth_url, "https://a/oauth");
        assert_eq!(c.client_id, "id");
        assert_eq!(c.client_secret, "secret");
        assert_eq!(c.username, "user");
        assert_eq!(c.password, "pass");
    }

    #[test]
    fn parse_credentials_rejects_short_file() {
        let err = parse_credentials("https://a/oauth\nid\nsecret\n").unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("line 4")), _ => panic!("wrong error") }
    }

    #[test]
    fn ensure_dirs_creates_data_and_output_dirs() {
        let td = tempdir().unwrap();
        let data_path = td.path().join("data");
        let out_path = td.path().join("out");
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.data_dir = data_path.to_string_lossy().to_string();
        cfg.app.output_dir = out_path.to_string_lossy().to_string();
        cfg.ensure_dirs().unwrap();
        assert!(data_path.exists());
        assert!(out_path.exists());

        let settings = cfg.export_settings().unwrap();
        assert_eq!(settings.data_dir, data_path);
        assert_eq!(settings.page_size.get(), 100);
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.topscore.credential.username, "YOUR_USERNAME");

        let creds = td.path().join("credentials.txt");
        fs::write(&creds, "https://b/oauth\nid2\nsecret2\nuser2\npass2\n").unwrap();
        let cfg = cfg.with_credential(load_credentials_file(&creds).unwrap());
        assert_eq!(cfg.topscore.credential.auth_url, "https://b/oauth");
    }
}
