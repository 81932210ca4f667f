//!
//! src/fetch.rs
//!
//! Blocking Spotify client. One authenticated handle is built per
//! invocation and reused for every call; the export pipeline only
//! sees it through the Catalog trait.
//!

use reqwest::{StatusCode, blocking::{Client, Response}, header, redirect};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::{HttpConfig, SpotifyConfig};
use crate::errors::ExportError;
use crate::types::{AlbumDetail, Page, PlaylistItem, PlaylistResponse, PlaylistSummary};

/// The catalog capability the pipeline is written against: one
/// collection fetch, one cursor follow, one entity lookup.
pub trait Catalog {
    fn playlist(&self, id: &str) -> Result<Page<PlaylistItem>, ExportError>;
    fn next_page(&self, cursor: &str) -> Result<Page<PlaylistItem>, ExportError>;
    fn album(&self, id: &str) -> Result<AlbumDetail, ExportError>;
}

fn build_http(cfg: &HttpConfig) -> Result<Client, ExportError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
    Client::builder()
        .timeout(cfg.timeout)
        .connect_timeout(cfg.connect_timeout)
        .pool_max_idle_per_host(cfg.pool_max_idle_per_host)
        .pool_idle_timeout(Some(cfg.pool_idle_timeout))
        .redirect(redirect::Policy::limited(cfg.max_redirects as usize))
        .default_headers(headers)
        .build()
        .map_err(|e| ExportError::Http(format!("build client: {e}")))
}

pub struct SpotifyClient {
    http: Client,
    api_base: Url,
    bearer: String,
}

impl SpotifyClient {
    /// Client-credentials token exchange; the returned handle is
    /// the single session reused for the whole run.
    pub fn connect(http_cfg: &HttpConfig, cfg: &SpotifyConfig) ->
        Result<Self, ExportError> {

        let http = build_http(http_cfg)?;
        let response = http
            .post(cfg.token_url.clone())
            .basic_auth(&cfg.client_id, Some(&cfg.client_secret))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()?;
        if !response.status().is_success() {
            return Err(ExportError::Http(format!(
                "token exchange failed: {}", response.status()
            )));
        }
        let token: serde_json::Value = response.json()?;
        let bearer = token["access_token"]
            .as_str()
            .ok_or_else(|| ExportError::Parse(
                "token response missing access_token".to_string()
            ))?
            .to_string();

        Ok(Self { http, api_base: cfg.api_base.clone(), bearer })
    }

    /// Session bound to a user-scoped bearer (playlist creation
    /// needs playlist-modify scope, which client credentials lack).
    pub fn with_user_token(http_cfg: &HttpConfig, cfg: &SpotifyConfig) ->
        Result<Self, ExportError> {

        let bearer = cfg.user_token.clone().ok_or_else(|| {
            ExportError::Config("SPOTIFY_USER_TOKEN was not set".to_string())
        })?;
        Ok(Self {
            http: build_http(http_cfg)?,
            api_base: cfg.api_base.clone(),
            bearer,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ExportError> {
        self.api_base
            .join(path)
            .map_err(|e| ExportError::Config(format!("bad endpoint {path}: {e}")))
    }

    fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ExportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json()?);
        }
        let body = response.text().unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => ExportError::NotFound(body),
            StatusCode::TOO_MANY_REQUESTS => ExportError::RateLimited(body),
            _ => ExportError::Http(format!("status {status}: {body}")),
        })
    }

    fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ExportError> {
        let response = self.http.get(url).bearer_auth(&self.bearer).send()?;
        Self::decode(response)
    }

    /// Follow an opaque cursor (a full URL for this catalog).
    pub fn page<T: DeserializeOwned>(&self, cursor: &str) ->
        Result<Page<T>, ExportError> {
        let url = Url::parse(cursor)
            .map_err(|e| ExportError::Parse(format!("bad cursor {cursor}: {e}")))?;
        self.get(url)
    }

    /// GET /users/{user}/playlists
    pub fn user_playlists(&self, user: &str) ->
        Result<Page<PlaylistSummary>, ExportError> {
        self.get(self.endpoint(&format!("users/{user}/playlists"))?)
    }

    /// GET /me, the id of the user the bearer belongs to
    pub fn me(&self) -> Result<String, ExportError> {
        let me: serde_json::Value = self.get(self.endpoint("me")?)?;
        me["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ExportError::Parse("me response missing id".to_string()))
    }

    /// POST /users/{user}/playlists
    pub fn create_playlist(&self, user: &str, name: &str, description: &str) ->
        Result<String, ExportError> {

        let response = self.http
            .post(self.endpoint(&format!("users/{user}/playlists"))?)
            .bearer_auth(&self.bearer)
            .json(&serde_json::json!({ "name": name, "description": description }))
            .send()?;
        let created: serde_json::Value = Self::decode(response)?;
        created["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ExportError::Parse(
                "create playlist response missing id".to_string()
            ))
    }

    /// POST /playlists/{id}/tracks, at most 100 uris per call
    pub fn add_items(&self, playlist_id: &str, track_ids: &[String]) ->
        Result<(), ExportError> {

        let uris: Vec<String> = track_ids
            .iter()
            .map(|id| format!("spotify:track:{id}"))
            .collect();
        let response = self.http
            .post(self.endpoint(&format!("playlists/{playlist_id}/tracks"))?)
            .bearer_auth(&self.bearer)
            .json(&serde_json::json!({ "uris": uris }))
            .send()?;
        Self::decode::<serde_json::Value>(response)?;
        Ok(())
    }
}

impl Catalog for SpotifyClient {
    /// GET /playlists/{id}, keeping only the track collection
    fn playlist(&self, id: &str) -> Result<Page<PlaylistItem>, ExportError> {
        let response: PlaylistResponse = self.get(self.endpoint(&format!("playlists/{id}"))?)?;
        Ok(response.tracks)
    }

    fn next_page(&self, cursor: &str) -> Result<Page<PlaylistItem>, ExportError> {
        self.page(cursor)
    }

    /// GET /albums/{id}
    fn album(&self, id: &str) -> Result<AlbumDetail, ExportError> {
        self.get(self.endpoint(&format!("albums/{id}"))?)
    }
}
