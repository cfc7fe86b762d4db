//! Spotify Web API client serving the recently played window.
//!
//! Each fetch exchanges the configured refresh token for a short-lived access token and then
//! requests the most recent plays of the authorized user. The endpoint keeps no cursor for us,
//! so every call simply returns the trailing window.

use playlog::error::{ErrorKind, PlaylogError, PlaylogResult};
use playlog::source::EventSource;
use playlog::types::RawEvent;
use playlog::{bail, playlog_error};
use playlog_config::shared::SpotifyConfig;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

/// Path of the token endpoint on the accounts service.
const TOKEN_PATH: &str = "/api/token";

/// Path of the recently played endpoint on the Web API.
const RECENTLY_PLAYED_PATH: &str = "/v1/me/player/recently-played";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct RecentlyPlayedResponse {
    #[serde(default)]
    items: Vec<RawEvent>,
}

/// [`EventSource`] backed by the Spotify Web API.
#[derive(Debug, Clone)]
pub struct SpotifyEventSource {
    client_id: String,
    client_secret: SecretString,
    refresh_token: SecretString,
    accounts_url: String,
    api_url: String,
}

impl SpotifyEventSource {
    pub fn new(config: &SpotifyConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            refresh_token: config.refresh_token.clone(),
            accounts_url: config.accounts_url.trim_end_matches('/').to_string(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Exchanges the refresh token for an access token.
    fn access_token(&self, client: &Client) -> PlaylogResult<SecretString> {
        let endpoint = format!("{}{TOKEN_PATH}", self.accounts_url);

        let response = client
            .post(&endpoint)
            .basic_auth(&self.client_id, Some(self.client_secret.expose_secret()))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.refresh_token.expose_secret().as_str()),
            ])
            .send()
            .map_err(|err| send_failed(&endpoint, err))?;

        let body = read_body(&endpoint, response)?;
        let token = parse_token_response(&body)?;
        debug!("obtained spotify access token");

        Ok(token)
    }
}

impl EventSource for SpotifyEventSource {
    fn fetch_recent(&self, limit: usize) -> PlaylogResult<Vec<RawEvent>> {
        let client = Client::builder().build().map_err(|err| {
            playlog_error!(
                ErrorKind::SourceConnectionFailed,
                "HTTP client could not be built",
                err.to_string(),
                source: err
            )
        })?;

        let access_token = self.access_token(&client)?;
        let endpoint = format!("{}{RECENTLY_PLAYED_PATH}", self.api_url);

        let response = client
            .get(&endpoint)
            .bearer_auth(access_token.expose_secret())
            .query(&[("limit", limit)])
            .send()
            .map_err(|err| send_failed(&endpoint, err))?;

        let body = read_body(&endpoint, response)?;
        let events = parse_recently_played(&body)?;
        debug!(limit, returned = events.len(), "fetched recently played window");

        Ok(events)
    }
}

/// Returns the body of a successful response, or the matching fetch error.
fn read_body(endpoint: &str, response: Response) -> PlaylogResult<String> {
    let status = response.status();
    let body = response.text().map_err(|err| {
        playlog_error!(
            ErrorKind::SourceResponseInvalid,
            "Spotify response body could not be read",
            format!("{endpoint}: {err}"),
            source: err
        )
    })?;

    if !status.is_success() {
        return Err(status_error(endpoint, status, &body));
    }

    Ok(body)
}

fn status_error(endpoint: &str, status: StatusCode, body: &str) -> PlaylogError {
    let detail = format!("{endpoint} responded with {status}: {body}");
    let rejected = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => true,
        // The token endpoint answers a revoked or unknown refresh token with 400.
        StatusCode::BAD_REQUEST => endpoint.ends_with(TOKEN_PATH),
        _ => false,
    };

    if rejected {
        playlog_error!(
            ErrorKind::SourceAuthenticationFailed,
            "Spotify rejected the credentials",
            detail = detail
        )
    } else {
        playlog_error!(
            ErrorKind::SourceRequestFailed,
            "Spotify request failed",
            detail = detail
        )
    }
}

fn send_failed(endpoint: &str, err: reqwest::Error) -> PlaylogError {
    let kind = if err.is_connect() || err.is_timeout() {
        ErrorKind::SourceConnectionFailed
    } else {
        ErrorKind::SourceRequestFailed
    };

    playlog_error!(
        kind,
        "Spotify request could not be sent",
        format!("{endpoint}: {err}"),
        source: err
    )
}

fn parse_token_response(body: &str) -> PlaylogResult<SecretString> {
    let response: TokenResponse = serde_json::from_str(body).map_err(|err| {
        playlog_error!(
            ErrorKind::SourceResponseInvalid,
            "Spotify token response could not be decoded",
            err.to_string(),
            source: err
        )
    })?;

    if response.access_token.is_empty() {
        bail!(
            ErrorKind::SourceResponseInvalid,
            "Spotify token response has an empty access token"
        );
    }

    Ok(SecretString::new(response.access_token))
}

fn parse_recently_played(body: &str) -> PlaylogResult<Vec<RawEvent>> {
    let response: RecentlyPlayedResponse = serde_json::from_str(body).map_err(|err| {
        playlog_error!(
            ErrorKind::SourceResponseInvalid,
            "Spotify recently played response could not be decoded",
            err.to_string(),
            source: err
        )
    })?;

    Ok(response.items)
}

#[cfg(test)]
mod tests {
    use playlog::error::ErrorClass;
    use playlog::normalize::normalize;

    use super::*;

    const RECENTLY_PLAYED: &str = r#"{
        "items": [
            {
                "track": {
                    "album": {
                        "album_type": "album",
                        "artists": [
                            {
                                "external_urls": {"spotify": "https://open.spotify.com/artist/a1"},
                                "href": "https://api.spotify.com/v1/artists/a1",
                                "id": "a1",
                                "name": "Nils Frahm",
                                "type": "artist",
                                "uri": "spotify:artist:a1"
                            }
                        ],
                        "available_markets": ["DE", "US"],
                        "external_urls": {"spotify": "https://open.spotify.com/album/al1"},
                        "href": "https://api.spotify.com/v1/albums/al1",
                        "id": "al1",
                        "images": [
                            {"height": 300, "url": "https://i.scdn.co/image/medium", "width": 300},
                            {"height": 640, "url": "https://i.scdn.co/image/large", "width": 640},
                            {"height": 64, "url": "https://i.scdn.co/image/small", "width": 64}
                        ],
                        "name": "All Melody",
                        "release_date": "2018-01-26",
                        "release_date_precision": "day",
                        "total_tracks": 12,
                        "type": "album",
                        "uri": "spotify:album:al1"
                    },
                    "artists": [
                        {
                            "external_urls": {"spotify": "https://open.spotify.com/artist/a1"},
                            "href": "https://api.spotify.com/v1/artists/a1",
                            "id": "a1",
                            "name": "Nils Frahm",
                            "type": "artist",
                            "uri": "spotify:artist:a1"
                        }
                    ],
                    "available_markets": ["DE", "US"],
                    "disc_number": 1,
                    "duration_ms": 470000,
                    "explicit": false,
                    "external_ids": {"isrc": "GBCEL1700001"},
                    "external_urls": {"spotify": "https://open.spotify.com/track/t1"},
                    "href": "https://api.spotify.com/v1/tracks/t1",
                    "id": "t1",
                    "is_local": false,
                    "name": "Sunson",
                    "popularity": 55,
                    "preview_url": null,
                    "track_number": 3,
                    "type": "track",
                    "uri": "spotify:track:t1"
                },
                "played_at": "2024-03-01T08:15:42.123Z",
                "context": null
            }
        ],
        "next": "https://api.spotify.com/v1/me/player/recently-played?before=1709280942123&limit=1",
        "cursors": {"after": "1709280942123", "before": "1709280942123"},
        "limit": 1,
        "href": "https://api.spotify.com/v1/me/player/recently-played?limit=1"
    }"#;

    #[test]
    fn recently_played_items_normalize() {
        let events = parse_recently_played(RECENTLY_PLAYED).unwrap();
        assert_eq!(events.len(), 1);

        let normalized = normalize(&events).unwrap();
        let event = &normalized[0];

        assert_eq!(event.id, "t1");
        assert_eq!(event.played_at.as_str(), "2024-03-01T08:15:42.123Z");
        let album = event.album.as_ref().unwrap();
        assert_eq!(album.image.as_deref(), Some("https://i.scdn.co/image/large"));
    }

    #[test]
    fn response_without_items_is_an_empty_window() {
        let events = parse_recently_played(r#"{"limit": 50, "cursors": null}"#).unwrap();

        assert!(events.is_empty());
    }

    #[test]
    fn garbled_response_is_a_fetch_error() {
        let err = parse_recently_played("<html>bad gateway</html>").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SourceResponseInvalid);
        assert_eq!(err.class(), ErrorClass::Fetch);
    }

    #[test]
    fn token_response_yields_access_token() {
        let token = parse_token_response(
            r#"{"access_token": "BQD", "token_type": "Bearer", "expires_in": 3600}"#,
        )
        .unwrap();

        assert_eq!(token.expose_secret(), "BQD");
    }

    #[test]
    fn empty_access_token_is_rejected() {
        let err = parse_token_response(r#"{"access_token": ""}"#).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SourceResponseInvalid);
    }

    #[test]
    fn rejected_credentials_are_authentication_failures() {
        let token = status_error(
            "https://accounts.spotify.com/api/token",
            StatusCode::BAD_REQUEST,
            r#"{"error": "invalid_grant"}"#,
        );
        let expired = status_error(
            "https://api.spotify.com/v1/me/player/recently-played",
            StatusCode::UNAUTHORIZED,
            "",
        );
        let throttled = status_error(
            "https://api.spotify.com/v1/me/player/recently-played",
            StatusCode::TOO_MANY_REQUESTS,
            "",
        );
        let bad_query = status_error(
            "https://api.spotify.com/v1/me/player/recently-played",
            StatusCode::BAD_REQUEST,
            "",
        );

        assert_eq!(token.kind(), ErrorKind::SourceAuthenticationFailed);
        assert_eq!(expired.kind(), ErrorKind::SourceAuthenticationFailed);
        assert_eq!(throttled.kind(), ErrorKind::SourceRequestFailed);
        assert_eq!(bad_query.kind(), ErrorKind::SourceRequestFailed);
        assert!(throttled.detail().unwrap().contains("429"));
    }
}
