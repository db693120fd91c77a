//! Source construction and status listing.
//!
//! [`build_sources`] turns the `[sources.*]` config sections into trait
//! objects; [`get_sources`] reports what is configured and whether it looks
//! usable. Used by the `goopss sources` command and `GET /sources`.
//!
//! # Health Checks
//!
//! | Kind | Healthy When |
//! |------|--------------|
//! | `file` | The file exists (per-owner templates: the directory exists) |
//! | `http` | Always `true` if configured (reachability checked at fetch time) |
//! | `firestore` | Always `true` if configured; notes whether a token variable is set |

use std::sync::Arc;

use anyhow::{bail, Result};
use serde::Serialize;

use goopss_core::source::{ListingSource, OptimizationSource, TaskSource};

use crate::config::{Config, SourceConfig, OWNER_PLACEHOLDER};
use crate::connector_file::FileSource;
use crate::connector_firestore::FirestoreSource;
use crate::connector_http::HttpSource;

/// The three collaborators the pipelines need.
#[derive(Clone)]
pub struct DataSources {
    pub listings: Arc<dyn ListingSource>,
    pub optimizations: Arc<dyn OptimizationSource>,
    pub tasks: Arc<dyn TaskSource>,
}

/// Build every configured source.
pub fn build_sources(config: &Config) -> Result<DataSources> {
    let http = &config.http;

    let listings: Arc<dyn ListingSource> = match &config.sources.listings {
        SourceConfig::File(f) => Arc::new(FileSource::new("listings", f.path.clone())),
        SourceConfig::Http(h) => Arc::new(HttpSource::new("listings", h, http)?),
        SourceConfig::Firestore(_) => bail!("sources.listings cannot be 'firestore'"),
    };

    let optimizations: Arc<dyn OptimizationSource> = match &config.sources.optimizations {
        SourceConfig::File(f) => Arc::new(FileSource::new("optimizations", f.path.clone())),
        SourceConfig::Http(h) => Arc::new(HttpSource::new("optimizations", h, http)?),
        SourceConfig::Firestore(fs) => Arc::new(FirestoreSource::new("optimizations", fs, http)?),
    };

    let tasks: Arc<dyn TaskSource> = match &config.sources.tasks {
        SourceConfig::File(f) => Arc::new(FileSource::new("tasks", f.path.clone())),
        SourceConfig::Http(h) => Arc::new(HttpSource::new("tasks", h, http)?),
        SourceConfig::Firestore(fs) => Arc::new(FirestoreSource::new("tasks", fs, http)?),
    };

    Ok(DataSources {
        listings,
        optimizations,
        tasks,
    })
}

/// Configuration and health of one source.
#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    /// `"listings"`, `"optimizations"`, or `"tasks"`.
    pub role: String,
    pub kind: String,
    pub location: String,
    pub healthy: bool,
    pub notes: Option<String>,
}

/// Status of the three configured sources, in role order.
pub fn get_sources(config: &Config) -> Vec<SourceStatus> {
    [
        ("listings", &config.sources.listings),
        ("optimizations", &config.sources.optimizations),
        ("tasks", &config.sources.tasks),
    ]
    .into_iter()
    .map(|(role, source)| source_status(role, source, config))
    .collect()
}

fn source_status(role: &str, source: &SourceConfig, config: &Config) -> SourceStatus {
    let (location, healthy, notes) = match source {
        SourceConfig::File(f) => {
            let display = f.path.display().to_string();
            if display.contains(OWNER_PLACEHOLDER) {
                let dir_ok = f.path.parent().map(|p| p.as_os_str().is_empty() || p.exists()).unwrap_or(true);
                let note = if dir_ok {
                    "per-owner files"
                } else {
                    "directory does not exist"
                };
                (display, dir_ok, Some(note.to_string()))
            } else if f.path.exists() {
                (display, true, None)
            } else {
                (display, false, Some("file does not exist".to_string()))
            }
        }
        SourceConfig::Http(h) => (h.url.clone(), true, token_note(h.token_env.as_deref(), config)),
        SourceConfig::Firestore(fs) => (
            format!("{}/{}", fs.project_id, fs.collection),
            true,
            token_note(fs.token_env.as_deref(), config),
        ),
    };

    SourceStatus {
        role: role.to_string(),
        kind: source.kind().to_string(),
        location,
        healthy,
        notes,
    }
}

fn token_note(own: Option<&str>, config: &Config) -> Option<String> {
    let var = own.or(config.http.token_env.as_deref())?;
    if std::env::var(var).is_ok() {
        Some(format!("token: ${}", var))
    } else {
        Some(format!("token variable {} is not set", var))
    }
}

/// CLI entry point for `goopss sources`.
pub fn list_sources(config: &Config) -> Result<()> {
    let sources = get_sources(config);

    println!("{:<14} {:<10} {:<8} LOCATION", "ROLE", "KIND", "HEALTHY");
    for s in &sources {
        println!("{:<14} {:<10} {:<8} {}", s.role, s.kind, s.healthy, s.location);
        if let Some(ref notes) = s.notes {
            println!("{:<14} {}", "", notes);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use goopss_core::source::Source;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(tmp: &TempDir) -> Config {
        let root = tmp.path().display();
        toml::from_str(&format!(
            r#"
[sources.listings]
kind = "file"
path = "{root}/listings/{{owner}}.json"

[sources.optimizations]
kind = "firestore"
project_id = "goopss-test"
collection = "optimizedListings"

[sources.tasks]
kind = "file"
path = "{root}/tasks.json"
"#
        ))
        .unwrap()
    }

    #[test]
    fn test_status_reports_missing_files() {
        let tmp = TempDir::new().unwrap();
        let config = config_for(&tmp);

        let statuses = get_sources(&config);
        assert_eq!(statuses.len(), 3);
        assert_eq!(statuses[0].role, "listings");
        assert!(!statuses[0].healthy);
        assert_eq!(statuses[1].kind, "firestore");
        assert_eq!(statuses[1].location, "goopss-test/optimizedListings");
        assert!(statuses[1].healthy);
        assert!(!statuses[2].healthy);

        fs::create_dir_all(tmp.path().join("listings")).unwrap();
        fs::write(tmp.path().join("tasks.json"), "[]").unwrap();
        let statuses = get_sources(&config);
        assert!(statuses[0].healthy);
        assert!(statuses[2].healthy);
    }

    #[test]
    fn test_build_sources_labels() {
        let tmp = TempDir::new().unwrap();
        let sources = build_sources(&config_for(&tmp)).unwrap();
        assert_eq!(sources.listings.label(), "file:listings");
        assert_eq!(sources.optimizations.label(), "firestore:optimizations");
        assert_eq!(sources.tasks.label(), "file:tasks");
    }
}
