//! Spotify Web API connector implementation
//!
//! Implements the `PlaylistProvider` trait for the Spotify Web API v1.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::provider::{
    PlaylistProvider, PlaylistSummary, TimeRange, TrackId, TrackSummary,
};
use core_auth::TokenProvider;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use urlencoding::encode;

use crate::error::SpotifyError;
use crate::types::{
    track_uri, AddTracksRequest, CreatePlaylistRequest, ErrorResponse, Paging, PlayHistoryItem,
    PlaylistObject, PlaylistTrackItem, RemoveTracksRequest, TrackObject, TrackUri, UserObject,
};

/// Spotify Web API base URL
const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

/// Page size for user-scoped list endpoints (API maximum)
const USER_PAGE_SIZE: u32 = 50;

/// Page size for playlist item listing (API maximum)
const PLAYLIST_PAGE_SIZE: u32 = 100;

/// Maximum track URIs per add/remove request
const MAX_TRACKS_PER_REQUEST: usize = 100;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Spotify Web API connector
///
/// # Features
///
/// - Follows `next` links until every page is read
/// - Batches add/remove calls in groups of 100 tracks
/// - Retries 429 and 5xx responses with exponential backoff
/// - Fetches a fresh bearer token per request through [`TokenProvider`]
///
/// # Example
///
/// ```ignore
/// use provider_spotify::SpotifyConnector;
/// use bridge_traits::provider::PlaylistProvider;
///
/// let connector = SpotifyConnector::new(http_client, auth_manager);
/// let tracks = connector.get_playlist_track_ids("37i9dQZF1DXcBWIGoYBM5M").await?;
/// ```
pub struct SpotifyConnector {
    http_client: Arc<dyn HttpClient>,
    token_provider: Arc<dyn TokenProvider>,
    base_url: String,
    retry: RetryPolicy,
    timeout: Duration,
}

impl SpotifyConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, token_provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            http_client,
            token_provider,
            base_url: SPOTIFY_API_BASE.to_string(),
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Point the connector at a different API root (no trailing slash).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn bearer(&self) -> Result<String> {
        self.token_provider
            .access_token()
            .await
            .map_err(|e| SpotifyError::from(e).into())
    }

    /// Map a non-success response to a typed error.
    fn status_error(url: &str, response: &HttpResponse) -> SpotifyError {
        let message = response
            .json::<ErrorResponse>()
            .map(|e| e.error.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(&response.body).to_string());

        match response.status {
            401 => SpotifyError::AuthenticationFailed(message),
            404 => SpotifyError::NotFound(url.to_string()),
            429 => SpotifyError::RateLimitExceeded {
                retry_after_seconds: response.retry_after_secs(),
            },
            status => SpotifyError::ApiError {
                status_code: status,
                message,
            },
        }
    }

    /// Execute API request with retry logic
    ///
    /// Rate limiting (429), server errors and retryable transport failures
    /// are retried with exponential backoff. Other failures return at once.
    #[instrument(skip(self, body))]
    async fn execute_with_retry(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<HttpResponse> {
        let mut attempt = 0;

        loop {
            let token = self.bearer().await?;
            let mut request = HttpRequest::new(method, url)
                .bearer_token(token)
                .header("Accept", "application/json")
                .timeout(self.timeout);
            if let Some(body) = body {
                request = request.json(body)?;
            }

            attempt += 1;
            let retry_reason = match self.http_client.execute(request).await {
                Ok(response) if response.is_success() => {
                    debug!(status = response.status, "API request succeeded");
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status;
                    if status != 429 && !response.is_server_error() {
                        warn!(status, "API request failed");
                        return Err(Self::status_error(url, &response).into());
                    }
                    if attempt >= self.retry.max_attempts {
                        warn!(status, attempts = attempt, "API request failed after retries");
                        return Err(Self::status_error(url, &response).into());
                    }
                    format!("status={}", status)
                }
                Err(e) => {
                    if !e.is_retryable() || attempt >= self.retry.max_attempts {
                        warn!(error = %e, attempts = attempt, "API request failed");
                        return Err(e);
                    }
                    e.to_string()
                }
            };

            let delay = self.retry.delay_for(attempt);
            warn!(
                "API request failed (attempt {}/{}): {}, retrying in {}ms",
                attempt,
                self.retry.max_attempts,
                retry_reason,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.execute_with_retry(HttpMethod::Get, url, None).await?;
        response
            .json()
            .map_err(|e| SpotifyError::ParseError(e.to_string()).into())
    }

    /// Read every page starting at `first_url`.
    async fn paginate<T: DeserializeOwned + Send>(&self, first_url: String) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(first_url);
        let mut pages = 0usize;

        while let Some(url) = next {
            let page: Paging<T> = self.get_json(&url).await?;
            pages += 1;
            items.extend(page.items);
            next = page.next;
        }

        debug!(pages, items = items.len(), "Pagination complete");
        Ok(items)
    }

    fn to_summaries(tracks: impl IntoIterator<Item = TrackObject>) -> Vec<TrackSummary> {
        tracks
            .into_iter()
            .filter_map(|track| {
                track.id.map(|id| TrackSummary {
                    id,
                    name: track.name,
                })
            })
            .collect()
    }

    fn to_summary(playlist: PlaylistObject) -> PlaylistSummary {
        PlaylistSummary {
            id: playlist.id,
            name: playlist.name,
            owner_id: playlist.owner.id,
        }
    }

    async fn send_batches(
        &self,
        method: HttpMethod,
        playlist_id: &str,
        track_ids: &[TrackId],
    ) -> Result<()> {
        let url = self.url(&format!("/playlists/{}/tracks", encode(playlist_id)));

        for chunk in track_ids.chunks(MAX_TRACKS_PER_REQUEST) {
            let body = match method {
                HttpMethod::Delete => serde_json::to_value(RemoveTracksRequest {
                    tracks: chunk
                        .iter()
                        .map(|id| TrackUri { uri: track_uri(id) })
                        .collect(),
                })?,
                _ => serde_json::to_value(AddTracksRequest {
                    uris: chunk.iter().map(|id| track_uri(id)).collect(),
                })?,
            };
            self.execute_with_retry(method, &url, Some(&body)).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PlaylistProvider for SpotifyConnector {
    #[instrument(skip(self))]
    async fn get_current_user_id(&self) -> Result<String> {
        let user: UserObject = self.get_json(&self.url("/me")).await?;
        debug!(user_id = %user.id, "Resolved current user");
        Ok(user.id)
    }

    #[instrument(skip(self))]
    async fn get_user_playlists(&self) -> Result<Vec<PlaylistSummary>> {
        let url = self.url(&format!("/me/playlists?limit={}", USER_PAGE_SIZE));
        let playlists: Vec<PlaylistObject> = self.paginate(url).await?;
        Ok(playlists.into_iter().map(Self::to_summary).collect())
    }

    #[instrument(skip(self))]
    async fn get_playlist(&self, playlist_id: &str) -> Result<PlaylistSummary> {
        let url = self.url(&format!(
            "/playlists/{}?fields={}",
            encode(playlist_id),
            encode("id,name,owner(id)")
        ));
        let playlist: PlaylistObject = self.get_json(&url).await?;
        Ok(Self::to_summary(playlist))
    }

    #[instrument(skip(self))]
    async fn get_playlist_track_ids(&self, playlist_id: &str) -> Result<Vec<TrackId>> {
        let url = self.url(&format!(
            "/playlists/{}/tracks?fields={}&limit={}",
            encode(playlist_id),
            encode("items(track(id,name)),next"),
            PLAYLIST_PAGE_SIZE
        ));
        let items: Vec<PlaylistTrackItem> = self.paginate(url).await?;
        let ids: Vec<TrackId> = items
            .into_iter()
            .filter_map(|item| item.track.and_then(|track| track.id))
            .collect();

        debug!(tracks = ids.len(), "Fetched playlist tracks");
        Ok(ids)
    }

    #[instrument(skip(self))]
    async fn get_top_tracks(&self, range: TimeRange) -> Result<Vec<TrackSummary>> {
        let url = self.url(&format!(
            "/me/top/tracks?time_range={}&limit={}",
            range.as_str(),
            USER_PAGE_SIZE
        ));
        let tracks: Vec<TrackObject> = self.paginate(url).await?;
        Ok(Self::to_summaries(tracks))
    }

    #[instrument(skip(self))]
    async fn get_recently_played(&self) -> Result<Vec<TrackSummary>> {
        let url = self.url(&format!(
            "/me/player/recently-played?limit={}",
            USER_PAGE_SIZE
        ));
        let history: Vec<PlayHistoryItem> = self.paginate(url).await?;
        Ok(Self::to_summaries(history.into_iter().map(|h| h.track)))
    }

    #[instrument(skip(self, description))]
    async fn create_playlist(&self, owner_id: &str, name: &str, description: &str) -> Result<String> {
        let url = self.url(&format!("/users/{}/playlists", encode(owner_id)));
        let body = serde_json::to_value(CreatePlaylistRequest {
            name,
            description,
            public: true,
        })?;

        let response = self
            .execute_with_retry(HttpMethod::Post, &url, Some(&body))
            .await?;
        let playlist: PlaylistObject = response
            .json()
            .map_err(|e| SpotifyError::ParseError(e.to_string()))?;

        info!(playlist_id = %playlist.id, "Created playlist");
        Ok(playlist.id)
    }

    #[instrument(skip(self, track_ids), fields(count = track_ids.len()))]
    async fn add_tracks(&self, playlist_id: &str, track_ids: &[TrackId]) -> Result<()> {
        self.send_batches(HttpMethod::Post, playlist_id, track_ids)
            .await
    }

    #[instrument(skip(self, track_ids), fields(count = track_ids.len()))]
    async fn remove_all_occurrences(&self, playlist_id: &str, track_ids: &[TrackId]) -> Result<()> {
        self.send_batches(HttpMethod::Delete, playlist_id, track_ids)
            .await
    }
}
