//! Configuration loader and validator for the workout log server.
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

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
    pub auth: AuthConfig,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
    pub listen_addr: String,
}

/// Token and password hashing settings handed to the auth service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_signup_ttl")]
    pub signup_token_ttl_minutes: u64,
    #[serde(default = "default_login_ttl")]
    pub login_token_ttl_minutes: u64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_signup_ttl() -> u64 {
    60
}

fn default_login_ttl() -> u64 {
    7 * 24 * 60
}

fn default_bcrypt_cost() -> u32 {
    10
}

impl App {
    /// Data directory with a leading `~/` expanded against `$HOME`.
    pub fn resolved_data_dir(&self) -> String {
        match self.data_dir.strip_prefix("~/") {
            Some(rest) => match std::env::var("HOME") {
                Ok(home) => format!("{}/{}", home.trim_end_matches('/'), rest),
                Err(_) => self.data_dir.clone(),
            },
            None => self.data_dir.clone(),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("app.listen_addr must be a socket address"))
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(self.app.resolved_data_dir())
    }

    /// Default SQLite location inside the data directory.
    pub fn default_database_url(&self) -> String {
        format!("sqlite://{}/fitlog.db", self.app.resolved_data_dir())
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

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    cfg.app.socket_addr()?;

    if cfg.auth.jwt_secret.trim().is_empty() {
        return Err(ConfigError::Invalid("auth.jwt_secret must be non-empty"));
    }
    if cfg.auth.signup_token_ttl_minutes == 0 {
        return Err(ConfigError::Invalid("auth.signup_token_ttl_minutes must be > 0"));
    }
    if cfg.auth.login_token_ttl_minutes == 0 {
        return Err(ConfigError::Invalid("auth.login_token_ttl_minutes must be > 0"));
    }
    // bcrypt only accepts costs within 4..=31.
    if !(4..=31).contains(&cfg.auth.bcrypt_cost) {
        return Err(ConfigError::Invalid("auth.bcrypt_cost must be within 4..=31"));
    }

    Ok(())
}

/// Returns the example YAML shipped with the server.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"
  listen_addr: "127.0.0.1:8080"

auth:
  jwt_secret: "CHANGE_ME_TO_A_LONG_RANDOM_SECRET"
  signup_token_ttl_minutes: 60
  login_token_ttl_minutes: 10080
  bcrypt_cost: 10
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn example_config() -> Config {
        serde_yaml::from_str(example()).unwrap()
    }

    #[test]
    fn parse_example_ok() {
        let cfg = example_config();
        validate(&cfg).unwrap();
        assert_eq!(cfg.auth.login_token_ttl_minutes, 10080);
    }

    #[test]
    fn auth_defaults_apply_when_omitted() {
        let yaml = r#"app:
  data_dir: "./data"
  listen_addr: "0.0.0.0:3000"
auth:
  jwt_secret: "s3cret"
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.auth.signup_token_ttl_minutes, 60);
        assert_eq!(cfg.auth.login_token_ttl_minutes, 7 * 24 * 60);
        assert_eq!(cfg.auth.bcrypt_cost, 10);
    }

    #[test]
    fn invalid_jwt_secret() {
        let mut cfg = example_config();
        cfg.auth.jwt_secret = "  ".into();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("auth.jwt_secret")),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn invalid_listen_addr() {
        let mut cfg = example_config();
        cfg.app.listen_addr = "localhost".into();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("listen_addr")),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn invalid_token_ttls_and_cost() {
        let mut cfg = example_config();
        cfg.auth.signup_token_ttl_minutes = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg = example_config();
        cfg.auth.login_token_ttl_minutes = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg = example_config();
        cfg.auth.bcrypt_cost = 3;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg = example_config();
        cfg.auth.bcrypt_cost = 32;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn ensure_dirs_creates_data_dir() {
        let td = tempdir().unwrap();
        let data_path = td.path().join("data");
        let mut cfg = example_config();
        cfg.app.data_dir = data_path.to_string_lossy().to_string();
        cfg.ensure_dirs().unwrap();
        assert!(data_path.exists());
        assert!(cfg.default_database_url().ends_with("/data/fitlog.db"));
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.app.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let td = tempdir().unwrap();
        let err = load(Some(&td.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
