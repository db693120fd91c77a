//! TOML configuration parsing and validation.
//!
//! ```toml
//! [sources.listings]
//! kind = "http"
//! url = "https://api.example.com/etsy/shops/{owner}/listings"
//!
//! [sources.optimizations]
//! kind = "firestore"
//! project_id = "goopss-prod"
//! collection = "optimizedListings"
//!
//! [sources.tasks]
//! kind = "file"
//! path = "data/tasks.json"
//!
//! [http]
//! timeout_secs = 30
//! max_retries = 3
//! token_env = "GOOPSS_API_TOKEN"
//!
//! [server]
//! bind = "127.0.0.1:7340"
//! ```
//!
//! Only the listing source is owner-scoped, so `{owner}` is accepted in its
//! path or URL and rejected everywhere else.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// Placeholder substituted with the selected owner in listing locations.
pub const OWNER_PLACEHOLDER: &str = "{owner}";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub sources: SourcesConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    pub listings: SourceConfig,
    pub optimizations: SourceConfig,
    pub tasks: SourceConfig,
}

/// Where one collection comes from.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    File(FileSourceConfig),
    Http(HttpSourceConfig),
    Firestore(FirestoreSourceConfig),
}

impl SourceConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Http(_) => "http",
            Self::Firestore(_) => "firestore",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FileSourceConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpSourceConfig {
    pub url: String,
    /// Overrides `[http].token_env` for this source.
    #[serde(default)]
    pub token_env: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FirestoreSourceConfig {
    pub project_id: String,
    pub collection: String,
    #[serde(default = "default_database")]
    pub database: String,
    /// Base URL override, e.g. `http://localhost:8080` for the emulator.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub token_env: Option<String>,
}

fn default_database() -> String {
    "(default)".to_string()
}
fn default_page_size() -> u32 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First backoff delay; doubles on every further attempt.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
    /// Environment variable holding a bearer token for HTTP and Firestore sources.
    #[serde(default)]
    pub token_env: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
            token_env: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_base_ms() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Check cross-field rules that serde cannot express.
pub fn validate(config: &Config) -> Result<()> {
    if config.http.timeout_secs == 0 {
        bail!("http.timeout_secs must be > 0");
    }

    if let SourceConfig::Firestore(_) = config.sources.listings {
        bail!("sources.listings cannot be 'firestore': listings come from the marketplace backend");
    }

    validate_source("listings", &config.sources.listings, true)?;
    validate_source("optimizations", &config.sources.optimizations, false)?;
    validate_source("tasks", &config.sources.tasks, false)?;

    Ok(())
}

fn validate_source(role: &str, source: &SourceConfig, owner_scoped: bool) -> Result<()> {
    let location = match source {
        SourceConfig::File(f) => {
            if f.path.as_os_str().is_empty() {
                bail!("sources.{}.path must not be empty", role);
            }
            f.path.to_string_lossy().into_owned()
        }
        SourceConfig::Http(h) => {
            if !(h.url.starts_with("http://") || h.url.starts_with("https://")) {
                bail!("sources.{}.url must start with http:// or https://", role);
            }
            check_owner_placement(role, &h.url)?;
            h.url.clone()
        }
        SourceConfig::Firestore(fs) => {
            if fs.project_id.trim().is_empty() {
                bail!("sources.{}.project_id must not be empty", role);
            }
            if fs.collection.trim().is_empty() {
                bail!("sources.{}.collection must not be empty", role);
            }
            if fs.page_size == 0 {
                bail!("sources.{}.page_size must be > 0", role);
            }
            fs.collection.clone()
        }
    };

    if !owner_scoped && location.contains(OWNER_PLACEHOLDER) {
        bail!(
            "sources.{} is not owner-scoped; remove the {} placeholder",
            role,
            OWNER_PLACEHOLDER
        );
    }

    Ok(())
}

/// `{owner}` is substituted into the path and query only.
fn check_owner_placement(role: &str, url: &str) -> Result<()> {
    const MARKER: &str = "goopss-owner-marker";

    if !url.contains(OWNER_PLACEHOLDER) {
        return Ok(());
    }
    let parsed = Url::parse(&url.replace(OWNER_PLACEHOLDER, MARKER))
        .with_context(|| format!("sources.{}.url is not a valid URL: {}", role, url))?;

    let misplaced = parsed.host_str().is_some_and(|h| h.contains(MARKER))
        || parsed.username().contains(MARKER)
        || parsed.password().is_some_and(|p| p.contains(MARKER))
        || parsed.fragment().is_some_and(|f| f.contains(MARKER));
    if misplaced {
        bail!(
            "sources.{}.url: {} is only allowed in the path or query",
            role,
            OWNER_PLACEHOLDER
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_str)?;
        validate(&config)?;
        Ok(config)
    }

    const BASE: &str = r#"
[sources.listings]
kind = "http"
url = "https://api.example.com/shops/{owner}/listings"

[sources.optimizations]
kind = "firestore"
project_id = "goopss-prod"
collection = "optimizedListings"

[sources.tasks]
kind = "file"
path = "data/tasks.json"
"#;

    #[test]
    fn test_defaults() {
        let config = parse(BASE).unwrap();
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.max_retries, 3);
        assert_eq!(config.server.bind, "127.0.0.1:7340");
        assert_eq!(config.sources.listings.kind(), "http");
        match &config.sources.optimizations {
            SourceConfig::Firestore(fs) => {
                assert_eq!(fs.database, "(default)");
                assert_eq!(fs.page_size, 300);
            }
            other => panic!("unexpected source: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_firestore_listings() {
        let toml_str = BASE.replace(
            "kind = \"http\"\nurl = \"https://api.example.com/shops/{owner}/listings\"",
            "kind = \"firestore\"\nproject_id = \"p\"\ncollection = \"listings\"",
        );
        let err = parse(&toml_str).unwrap_err();
        assert!(err.to_string().contains("listings"), "got: {}", err);
    }

    #[test]
    fn test_rejects_owner_placeholder_on_unscoped_source() {
        let toml_str = BASE.replace("data/tasks.json", "data/{owner}/tasks.json");
        let err = parse(&toml_str).unwrap_err();
        assert!(err.to_string().contains("not owner-scoped"), "got: {}", err);
    }

    #[test]
    fn test_rejects_non_http_url() {
        let toml_str = BASE.replace("https://api.example.com", "ftp://api.example.com");
        assert!(parse(&toml_str).is_err());
    }

    #[test]
    fn test_rejects_owner_placeholder_outside_path_and_query() {
        for url in [
            "https://{owner}.example.com/listings",
            "https://api.example.com/listings#{owner}",
            "https://{owner}@api.example.com/listings",
        ] {
            let toml_str = BASE.replace("https://api.example.com/shops/{owner}/listings", url);
            let err = parse(&toml_str).unwrap_err();
            assert!(
                format!("{:#}", err).contains("path or query"),
                "{} got: {:#}",
                url,
                err
            );
        }

        let toml_str = BASE.replace(
            "https://api.example.com/shops/{owner}/listings",
            "https://api.example.com/listings?shop={owner}",
        );
        assert!(parse(&toml_str).is_ok());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let toml_str = format!("{}\n[http]\ntimeout_secs = 0\n", BASE);
        assert!(parse(&toml_str).is_err());
    }

    #[test]
    fn test_example_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/goopss.example.toml");
        let config = load_config(&path).unwrap();
        assert_eq!(config.sources.tasks.kind(), "file");
    }

    #[test]
    fn test_unknown_kind_fails_to_parse() {
        let toml_str = BASE.replace("kind = \"file\"", "kind = \"sqlite\"");
        assert!(toml::from_str::<Config>(&toml_str).is_err());
    }
}
