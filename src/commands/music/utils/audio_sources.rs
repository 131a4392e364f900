//! Turning a raw `!play` argument into something the player can start.

use std::fmt;
use std::time::Duration;

use serenity::async_trait;
use songbird::input::{AuxMetadata, Compose, YoutubeDl};
use tracing::{debug, info};
use url::Url;

use super::music_manager::MusicError;

/// How many search hits to ask yt-dlp for when the request is not a URL.
const SEARCH_RESULTS: usize = 5;

/// A raw source string submitted by `!play`: a URL or a search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    source: String,
}

impl LoadRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Performs a basic check if the source can be parsed as a URL.
    /// Anything else is treated as a search query.
    pub fn is_url(&self) -> bool {
        Url::parse(&self.source).is_ok()
    }
}

impl fmt::Display for LoadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A resolved, playable audio item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    /// Direct page URL handed to yt-dlp at play time.
    pub url: String,
    pub duration: Option<Duration>,
}

impl Track {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Build a track from yt-dlp metadata. Without any URL there is nothing to play.
    pub fn from_metadata(metadata: AuxMetadata, fallback_url: Option<&str>) -> Option<Self> {
        let url = metadata
            .source_url
            .or_else(|| fallback_url.map(str::to_string))?;
        let title = metadata.title.unwrap_or_else(|| url.clone());

        Some(Self {
            title,
            url,
            duration: metadata.duration,
        })
    }
}

/// Result of resolving a [`LoadRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Track(Track),
    /// Ranked search hits; only the best one is played.
    SearchResults(Vec<Track>),
    NoMatches,
}

impl LoadOutcome {
    /// The single track this outcome contributes to the queue, if any.
    pub fn into_playable(self) -> Option<Track> {
        match self {
            LoadOutcome::Track(track) => Some(track),
            LoadOutcome::SearchResults(tracks) => tracks.into_iter().next(),
            LoadOutcome::NoMatches => None,
        }
    }
}

/// Resolves load requests into playable tracks. Implementations may be slow;
/// the scheduler always calls them off its own task.
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve(&self, request: &LoadRequest) -> Result<LoadOutcome, MusicError>;
}

/// Resolver backed by songbird's yt-dlp input.
pub struct YoutubeDlResolver {
    http: reqwest::Client,
}

impl YoutubeDlResolver {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn from_url(&self, url: &str) -> Result<LoadOutcome, MusicError> {
        let mut source = YoutubeDl::new(self.http.clone(), url.to_string());
        let metadata = source
            .aux_metadata()
            .await
            .map_err(|e| MusicError::AudioSourceError(format!("Failed to probe {url}: {e}")))?;

        Ok(Track::from_metadata(metadata, Some(url)).map_or(LoadOutcome::NoMatches, LoadOutcome::Track))
    }

    async fn from_search(&self, query: &str) -> Result<LoadOutcome, MusicError> {
        let mut source = YoutubeDl::new_search(self.http.clone(), query.to_string());
        let results: Vec<Track> = source
            .search(Some(SEARCH_RESULTS))
            .await
            .map_err(|e| MusicError::AudioSourceError(format!("Search for '{query}' failed: {e}")))?
            .into_iter()
            .filter_map(|metadata| Track::from_metadata(metadata, None))
            .collect();

        debug!("Search for '{}' returned {} results", query, results.len());

        if results.is_empty() {
            Ok(LoadOutcome::NoMatches)
        } else {
            Ok(LoadOutcome::SearchResults(results))
        }
    }
}

#[async_trait]
impl TrackResolver for YoutubeDlResolver {
    async fn resolve(&self, request: &LoadRequest) -> Result<LoadOutcome, MusicError> {
        info!("Resolving load request: {}", request);
        if request.is_url() {
            self.from_url(request.source()).await
        } else {
            self.from_search(request.source()).await
        }
    }
}
