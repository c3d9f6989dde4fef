// Deployment settings
// Loaded from ~/.config/stuffcheck/config.toml, then overridden from the environment

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use stuffcheck_recon::ReconConfig;

pub const DEFAULT_SHEET: &str = "IN";
pub const DEFAULT_TOKEN_ENV: &str = "STUFFCHECK_SOURCE_TOKEN";
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_CONNECTIONS: usize = 32;

pub const ENV_SOURCE_PATH: &str = "STUFFCHECK_SOURCE_PATH";
pub const ENV_SOURCE_URL: &str = "STUFFCHECK_SOURCE_URL";
pub const ENV_SHEET: &str = "STUFFCHECK_SHEET";
pub const ENV_BIND: &str = "STUFFCHECK_BIND";

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => {
                write!(f, "cannot read {}: {}", path.display(), message)
            }
            Self::Parse { path, message } => {
                write!(f, "invalid config {}: {}", path.display(), message)
            }
            Self::Validation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Where the reference table ("sheet IN") lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceSettings {
    /// Local workbook or CSV file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// HTTP endpoint serving the sheet as CSV.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub sheet: String,
    /// Env var holding the bearer token for `url`. The token itself is
    /// never stored in the file.
    pub token_env: String,
    /// Fail when the token env var is unset (URL sources only).
    pub require_token: bool,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            path: None,
            url: None,
            sheet: DEFAULT_SHEET.to_string(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            require_token: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    pub bind: String,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
    /// Live connections allowed at once; extra ones get 503.
    pub max_connections: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub source: SourceSettings,
    pub server: ServerSettings,
    pub recon: ReconConfig,
}

impl Settings {
    /// Default settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stuffcheck")
            .join("config.toml")
    }

    /// Load settings and apply environment overrides.
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// when present and built-in defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match explicit {
            Some(path) => Self::load_from(path)?,
            None => {
                let path = Self::config_path();
                if path.exists() {
                    Self::load_from(&path)?
                } else {
                    log::debug!("no settings file at {}, using defaults", path.display());
                    Self::default()
                }
            }
        };
        settings.apply_env(|name| std::env::var(name).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Read { path: path.to_path_buf(), message: e.to_string() })?;
        let settings = Self::from_toml(&contents)
            .map_err(|message| ConfigError::Parse { path: path.to_path_buf(), message })?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml(input: &str) -> Result<Self, String> {
        toml::from_str(input).map_err(|e| e.to_string())
    }

    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| e.to_string())
    }

    /// Apply `STUFFCHECK_*` overrides read through `var`.
    ///
    /// Setting a source path clears a configured URL and vice versa, so an
    /// override always selects exactly one source kind. Empty values are
    /// ignored.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        if let Some(path) = var(ENV_SOURCE_PATH) {
            self.source.path = Some(PathBuf::from(path));
            self.source.url = None;
        }
        if let Some(url) = var(ENV_SOURCE_URL) {
            self.source.url = Some(url);
            self.source.path = None;
        }
        if let Some(sheet) = var(ENV_SHEET) {
            self.source.sheet = sheet;
        }
        if let Some(bind) = var(ENV_BIND) {
            self.server.bind = bind;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.path.is_some() && self.source.url.is_some() {
            return Err(ConfigError::Validation(
                "set either source.path or source.url, not both".into(),
            ));
        }
        if self.source.sheet.trim().is_empty() {
            return Err(ConfigError::Validation("source.sheet must not be empty".into()));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Validation("server.max_body_bytes must be at least 1".into()));
        }
        if self.server.max_connections == 0 {
            return Err(ConfigError::Validation("server.max_connections must be at least 1".into()));
        }
        self.recon
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.source.sheet, "IN");
        assert_eq!(s.source.token_env, "STUFFCHECK_SOURCE_TOKEN");
        assert_eq!(s.server.bind, "127.0.0.1:8787");
        assert_eq!(s.server.max_body_bytes, 10 * 1024 * 1024);
        assert_eq!(s.server.max_connections, 32);
        assert_eq!(s.recon.row_limit, 10_000);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_parse_sections() {
        let s = Settings::from_toml(
            r#"
[source]
url = "https://sheets.example.com/export"
sheet = "Stock"

[server]
bind = "0.0.0.0:9000"

[recon]
row_limit = 2000

[recon.layout]
invoice_cell = "D3"
"#,
        )
        .unwrap();
        assert_eq!(s.source.url.as_deref(), Some("https://sheets.example.com/export"));
        assert_eq!(s.source.sheet, "Stock");
        assert_eq!(s.server.bind, "0.0.0.0:9000");
        assert_eq!(s.server.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert_eq!(s.recon.row_limit, 2000);
        assert_eq!(s.recon.layout.invoice_cell.to_string(), "D3");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Settings::from_toml("[source]\ntoken = \"inline\"\n").unwrap_err();
        assert!(err.contains("token"), "{err}");
    }

    #[test]
    fn test_env_overrides() {
        let mut s = Settings::from_toml("[source]\nurl = \"https://x.example/export\"\n").unwrap();
        s.apply_env(env(&[
            (ENV_SOURCE_PATH, "/data/stock.xlsx"),
            (ENV_SHEET, "IN2"),
            (ENV_BIND, "127.0.0.1:0"),
        ]));
        assert_eq!(s.source.path, Some(PathBuf::from("/data/stock.xlsx")));
        assert_eq!(s.source.url, None);
        assert_eq!(s.source.sheet, "IN2");
        assert_eq!(s.server.bind, "127.0.0.1:0");
    }

    #[test]
    fn test_blank_env_ignored() {
        let mut s = Settings::default();
        s.apply_env(env(&[(ENV_SHEET, "  ")]));
        assert_eq!(s.source.sheet, "IN");
    }

    #[test]
    fn test_both_sources_rejected() {
        let s =
            Settings::from_toml("[source]\npath = \"a.xlsx\"\nurl = \"https://x.example\"\n")
                .unwrap();
        assert!(matches!(s.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_zero_connection_cap_rejected() {
        let s = Settings::from_toml("[server]\nmax_connections = 0\n").unwrap();
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("max_connections"), "{err}");
    }

    #[test]
    fn test_recon_validation_surfaces() {
        let s = Settings::from_toml("[recon]\nrow_limit = 0\n").unwrap();
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("row_limit"), "{err}");
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let err = Settings::load(Some(Path::new("/nonexistent/stuffcheck.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_from_file_and_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[source]\npath = \"stock.csv\"\n").unwrap();
        let s = Settings::load_from(&path).unwrap();
        assert_eq!(s.source.path, Some(PathBuf::from("stock.csv")));

        let again = Settings::from_toml(&s.to_toml().unwrap()).unwrap();
        assert_eq!(again, s);
    }
}
