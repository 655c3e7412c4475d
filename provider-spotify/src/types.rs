//! Spotify Web API request and response types
//!
//! Only the fields the cache reconciler reads are modelled.

use serde::{Deserialize, Serialize};

/// Paging object wrapping every list endpoint.
///
/// See: https://developer.spotify.com/documentation/web-api/concepts/api-calls
#[derive(Debug, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,

    /// Absolute URL of the next page
    #[serde(default)]
    pub next: Option<String>,
}

/// Current user profile (`GET /me`)
#[derive(Debug, Deserialize)]
pub struct UserObject {
    pub id: String,

    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwnerObject {
    pub id: String,
}

/// Playlist as returned by the playlist and user playlist endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistObject {
    pub id: String,

    #[serde(default)]
    pub name: String,

    pub owner: OwnerObject,
}

/// Track object. Local files have no id.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: String,
}

/// Entry of a playlist's item list. `track` is null for removed content.
#[derive(Debug, Deserialize)]
pub struct PlaylistTrackItem {
    #[serde(default)]
    pub track: Option<TrackObject>,
}

/// Entry of the recently played list
#[derive(Debug, Deserialize)]
pub struct PlayHistoryItem {
    pub track: TrackObject,
}

#[derive(Debug, Serialize)]
pub struct CreatePlaylistRequest<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub public: bool,
}

#[derive(Debug, Serialize)]
pub struct AddTracksRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TrackUri {
    pub uri: String,
}

#[derive(Debug, Serialize)]
pub struct RemoveTracksRequest {
    pub tracks: Vec<TrackUri>,
}

/// Error envelope: `{"error": {"status": 404, "message": "..."}}`
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub status: Option<u16>,

    #[serde(default)]
    pub message: String,
}

/// Spotify URI for a track id.
pub fn track_uri(id: &str) -> String {
    format!("spotify:track:{}", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_item_with_null_track() {
        let json = r#"{"items":[{"track":null},{"track":{"id":"t1","name":"One"}},{"track":{"id":null,"name":"local.mp3"}}],"next":null}"#;
        let page: Paging<PlaylistTrackItem> = serde_json::from_str(json).unwrap();

        assert_eq!(page.items.len(), 3);
        assert!(page.items[0].track.is_none());
        assert_eq!(page.items[1].track.as_ref().unwrap().id.as_deref(), Some("t1"));
        assert!(page.items[2].track.as_ref().unwrap().id.is_none());
        assert!(page.next.is_none());
    }

    #[test]
    fn test_error_response() {
        let json = r#"{"error":{"status":404,"message":"Resource not found"}}"#;
        let parsed: ErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.error.status, Some(404));
        assert_eq!(parsed.error.message, "Resource not found");
    }

    #[test]
    fn test_remove_request_shape() {
        let body = RemoveTracksRequest {
            tracks: vec![TrackUri {
                uri: track_uri("abc"),
            }],
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"tracks":[{"uri":"spotify:track:abc"}]}"#
        );
    }
}
