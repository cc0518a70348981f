//! Loading of the static text sources: manifest, links file and roster.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use portal_core::{build_index, parse_roster, LinksLayout, ManifestLoad, Roster};
use portal_logging::{portal_info, portal_warn};
use reqwest::header::CACHE_CONTROL;
use serde::{Deserialize, Serialize};

use crate::types::LoadError;

/// Where a text resource lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextSource {
    Http(String),
    File(PathBuf),
}

impl fmt::Display for TextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextSource::Http(url) => write!(f, "{url}"),
            TextSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSources {
    pub manifest: TextSource,
    pub links: Option<TextSource>,
    pub layout: LinksLayout,
}

pub struct SourceFetcher {
    http: reqwest::Client,
}

impl SourceFetcher {
    pub fn new(timeout: Duration) -> Result<Self, LoadError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| LoadError::Unreachable {
                source_label: "http client".to_string(),
                message: err.to_string(),
            })?;
        Ok(Self { http })
    }

    /// Reads one source to a string. HTTP sources bypass caches.
    pub async fn fetch_text(&self, source: &TextSource) -> Result<String, LoadError> {
        let source_label = source.to_string();
        match source {
            TextSource::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|err| LoadError::Unreachable {
                        source_label,
                        message: err.to_string(),
                    })
            }
            TextSource::Http(url) => {
                let response = self
                    .http
                    .get(url)
                    .header(CACHE_CONTROL, "no-store")
                    .send()
                    .await
                    .map_err(|err| LoadError::Unreachable {
                        source_label: source_label.clone(),
                        message: err.to_string(),
                    })?;
                let status = response.status();
                if !status.is_success() {
                    return Err(LoadError::HttpStatus {
                        source_label,
                        status: status.as_u16(),
                    });
                }
                response.text().await.map_err(|err| LoadError::Unreachable {
                    source_label,
                    message: err.to_string(),
                })
            }
        }
    }

    /// Fetches manifest and links together and builds the index. Either
    /// source failing fails the whole load.
    pub async fn load_manifest(&self, sources: &ManifestSources) -> Result<ManifestLoad, LoadError> {
        let links_future = async {
            match &sources.links {
                Some(links) => self.fetch_text(links).await.map(Some),
                None => Ok(None),
            }
        };
        let (manifest_text, links_text) =
            tokio::try_join!(self.fetch_text(&sources.manifest), links_future)?;

        let load = build_index(&manifest_text, links_text.as_deref(), sources.layout)?;
        for ignored in &load.ignored {
            portal_warn!(
                "Ignoring duplicate file '{}' for key {}",
                ignored.file_name,
                ignored.key
            );
        }
        portal_info!(
            "Manifest loaded entries={} ignored={} unmatched={}",
            load.index.len(),
            load.ignored.len(),
            load.unmatched_lines
        );
        Ok(load)
    }

    pub async fn load_roster(&self, source: &TextSource) -> Result<Roster, LoadError> {
        let text = self.fetch_text(source).await?;
        let roster = parse_roster(&text)?;
        portal_info!("Roster loaded students={}", roster.len());
        Ok(roster)
    }
}
