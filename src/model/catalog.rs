//! Catalog search client

use std::sync::Arc;

use serde::Deserialize;

use crate::auth::Credential;
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use super::types::{ResultPage, Track};

/// Tracks shown per page, whatever the backend returns
pub const PAGE_SIZE: usize = 10;

#[derive(Deserialize)]
struct SearchResponse {
    tracks: TrackListing,
}

#[derive(Deserialize)]
struct TrackListing {
    #[serde(default)]
    items: Vec<Track>,
}

pub struct CatalogClient {
    http: reqwest::Client,
    search_url: String,
}

impl CatalogClient {
    pub fn new(http: reqwest::Client, config: &SessionConfig) -> Self {
        Self {
            http,
            search_url: config.search_url(),
        }
    }

    /// Search tracks matching `query`, starting at `offset`.
    ///
    /// Fails with [`SessionError::NoCredential`] before touching the network
    /// when no credential is given.
    pub async fn search(&self, credential: Option<&Credential>, query: &str, offset: u32) -> Result<ResultPage> {
        let credential = credential.ok_or(SessionError::NoCredential)?;
        crate::log_api_request!("search", query = %query, offset);
        let result = self.fetch_page(credential, query, offset).await;
        crate::log_api_result!("search", result);
        result
    }

    async fn fetch_page(&self, credential: &Credential, query: &str, offset: u32) -> Result<ResultPage> {
        let resp = self
            .http
            .get(&self.search_url)
            .bearer_auth(&credential.token)
            .query(&[
                ("q", query.to_string()),
                ("type", "track".to_string()),
                ("offset", offset.to_string()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SessionError::Search {
                status_text: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
            });
        }

        let body: SearchResponse = resp.json().await?;
        let items = body
            .tracks
            .items
            .into_iter()
            .take(PAGE_SIZE)
            .map(Arc::new)
            .collect();

        Ok(ResultPage {
            query: query.to_string(),
            offset,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::{json, Value};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn items(count: usize) -> Value {
        let tracks: Vec<Value> = (0..count)
            .map(|i| {
                json!({
                    "id": format!("t{i}"),
                    "uri": format!("spotify:track:t{i}"),
                    "name": format!("Track {i}"),
                    "popularity": 50,
                    "artists": [{ "name": "Artist", "id": "ar1" }],
                    "album": { "name": "Album", "images": [{ "url": "http://img/1", "height": 640 }] }
                })
            })
            .collect();
        json!({ "tracks": { "items": tracks, "total": count } })
    }

    fn credential() -> Credential {
        Credential {
            token: "tok".to_string(),
            obtained_at: Utc::now(),
            expires_in: None,
        }
    }

    fn client_for(server: &MockServer) -> CatalogClient {
        let config = SessionConfig::new("id", "secret").with_endpoints(server.uri(), format!("{}/v1", server.uri()));
        CatalogClient::new(reqwest::Client::new(), &config)
    }

    #[tokio::test]
    async fn long_responses_are_truncated_to_a_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("q", "daft punk"))
            .and(query_param("type", "track"))
            .and(query_param("offset", "20"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(items(15)))
            .expect(1)
            .mount(&server)
            .await;

        let page = client_for(&server)
            .search(Some(&credential()), "daft punk", 20)
            .await
            .unwrap();

        assert_eq!(page.items.len(), PAGE_SIZE);
        assert_eq!(page.items[0].id, "t0");
        assert_eq!(page.items[9].id, "t9");
        assert_eq!(page.offset, 20);
        assert_eq!(page.items[0].cover_url(), Some("http://img/1"));
    }

    #[tokio::test]
    async fn short_responses_pass_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(items(3)))
            .mount(&server)
            .await;

        let page = client_for(&server).search(Some(&credential()), "x", 0).await.unwrap();
        let ids: Vec<_> = page.items.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["t0", "t1", "t2"]);
    }

    #[tokio::test]
    async fn missing_credential_never_hits_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(items(1)))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server).search(None, "x", 0).await.unwrap_err();
        assert!(matches!(err, SessionError::NoCredential));
    }

    #[tokio::test]
    async fn error_status_becomes_search_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).search(Some(&credential()), "x", 0).await.unwrap_err();
        match err {
            SessionError::Search { status_text } => assert_eq!(status_text, "Service Unavailable"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
