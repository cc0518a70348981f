use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use portal_core::LinksLayout;
use portal_engine::{ClientSettings, EngineConfig, ManifestSources, TextSource, WatchPolicy};
use portal_logging::portal_info;
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG: &str = "portal.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub endpoint_url: Option<String>,
    pub manifest_source: TextSource,
    pub links_source: Option<TextSource>,
    pub roster_source: TextSource,
    pub requester_email: String,
    pub poll_interval_secs: u64,
    /// `None` keeps polling through any number of transport failures.
    pub max_poll_failures: Option<u32>,
    pub submit_timeout_secs: Option<u64>,
    pub probe_timeout_secs: u64,
    pub source_timeout_secs: u64,
    pub activity_log_path: PathBuf,
    pub output_dir: PathBuf,
    pub links_layout: LinksLayout,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            manifest_source: TextSource::File(PathBuf::from("cv_list.txt")),
            links_source: None,
            roster_source: TextSource::File(PathBuf::from("students.csv")),
            requester_email: String::new(),
            poll_interval_secs: 10,
            max_poll_failures: None,
            submit_timeout_secs: None,
            probe_timeout_secs: 30,
            source_timeout_secs: 30,
            activity_log_path: PathBuf::from("./activity_log.jsonl"),
            output_dir: PathBuf::from("./output"),
            links_layout: LinksLayout::default(),
        }
    }
}

impl PortalConfig {
    /// Reads `explicit` if given, else `./portal.ron` if it exists, else
    /// returns the defaults. An explicit path that cannot be read is an error.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::parse(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        portal_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// A non-blank override replaces the configured email.
    pub fn with_email(mut self, email: Option<String>) -> Self {
        if let Some(email) = email.filter(|e| !e.trim().is_empty()) {
            self.requester_email = email.trim().to_string();
        }
        self
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            endpoint_url: self
                .endpoint_url
                .clone()
                .filter(|url| !url.trim().is_empty()),
            sources: ManifestSources {
                manifest: self.manifest_source.clone(),
                links: self.links_source.clone(),
                layout: self.links_layout,
            },
            client: ClientSettings {
                submit_timeout: self.submit_timeout_secs.map(Duration::from_secs),
                probe_timeout: Some(Duration::from_secs(self.probe_timeout_secs)),
                ..ClientSettings::default()
            },
            watch: WatchPolicy {
                interval: Duration::from_secs(self.poll_interval_secs.max(1)),
                max_consecutive_failures: self.max_poll_failures,
            },
            source_timeout: Duration::from_secs(self.source_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = PortalConfig::parse(
            r#"(
                endpoint_url: Some("https://script.example/exec"),
                links_source: Some(Http("https://portal.example/links.csv")),
                poll_interval_secs: 5,
                max_poll_failures: Some(30),
            )"#,
        )
        .unwrap();

        assert_eq!(config.endpoint_url.as_deref(), Some("https://script.example/exec"));
        assert_eq!(
            config.links_source,
            Some(TextSource::Http("https://portal.example/links.csv".to_string()))
        );
        assert_eq!(config.probe_timeout_secs, 30);
        assert_eq!(config.manifest_source, TextSource::File(PathBuf::from("cv_list.txt")));

        let engine = config.engine_config();
        assert_eq!(engine.watch.interval, Duration::from_secs(5));
        assert_eq!(engine.watch.max_consecutive_failures, Some(30));
        assert_eq!(engine.client.submit_timeout, None);
    }

    #[test]
    fn defaults_poll_every_ten_seconds_forever() {
        let engine = PortalConfig::default().engine_config();
        assert_eq!(engine.watch, WatchPolicy::default());
        assert_eq!(engine.endpoint_url, None);
    }

    #[test]
    fn email_override_ignores_blank() {
        let config = PortalConfig {
            requester_email: "file@x.edu".to_string(),
            ..PortalConfig::default()
        };
        let config = config.with_email(Some("   ".to_string()));
        assert_eq!(config.requester_email, "file@x.edu");
        let config = config.with_email(Some(" cli@x.edu ".to_string()));
        assert_eq!(config.requester_email, "cli@x.edu");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(PortalConfig::load(Some(&temp.path().join("nope.ron"))).is_err());

        let path = temp.path().join("portal.ron");
        fs::write(&path, "(requester_email: \"a@x.edu\")").unwrap();
        let config = PortalConfig::load(Some(&path)).unwrap();
        assert_eq!(config.requester_email, "a@x.edu");
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(PortalConfig::parse("(poll_interval_secs: \"soon\")").is_err());
    }
}
