//! HTTP client for the third-party board game catalog.
//!
//! The upstream answers `202 Accepted` while it is still assembling a details document; the
//! client polls with a fixed delay until the configured attempt ceiling is reached.

use std::sync::Arc;

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tokio::time::sleep;
use tracing::debug;

use crate::config::CatalogConfig;

/// Convenient result alias returning [`CatalogError`] failures.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Failures that can occur while talking to the catalog upstream.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build catalog client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The configured base URL cannot carry path segments.
    #[error("invalid catalog base url `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    /// The request could not be sent.
    #[error("failed to send catalog request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The upstream answered with an unexpected status.
    #[error("unexpected catalog response status {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode catalog response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The catalog does not know the requested game.
    #[error("catalog game `{id}` not found")]
    NotFound { id: String },
    /// The upstream was still processing after every allowed attempt.
    #[error("catalog game `{id}` still processing after {attempts} attempt(s)")]
    StillProcessing { id: String, attempts: u32 },
}

/// Search candidate returned by the upstream.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CatalogSearchHit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Normalised details document returned by the upstream.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CatalogGameDetails {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub min_players: Option<u32>,
    #[serde(default)]
    pub max_players: Option<u32>,
    #[serde(default)]
    pub playing_time: Option<u32>,
    #[serde(default)]
    pub year_published: Option<i32>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub mechanics: Vec<String>,
}

/// Thin catalog client; cheap to clone.
#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: Url,
    config: Arc<CatalogConfig>,
}

impl CatalogClient {
    pub fn new(config: CatalogConfig) -> CatalogResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CatalogError::ClientBuilder { source })?;
        let base_url = Url::parse(&config.base_url).map_err(|err| CatalogError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: err.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: "not a hierarchical url".into(),
            });
        }
        Ok(Self {
            client,
            base_url,
            config: Arc::new(config),
        })
    }

    /// Append percent-encoded `segments` to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn search_limit(&self) -> usize {
        self.config.search_limit
    }

    /// Search games by name. The result is truncated to the configured limit.
    pub async fn search(&self, query: &str) -> CatalogResult<Vec<CatalogSearchHit>> {
        const SEARCH: &str = "search";
        let url = self.endpoint(&[SEARCH]);
        let response = self
            .client
            .get(url)
            .query(&[("query", query)])
            .send()
            .await
            .map_err(|source| CatalogError::RequestSend {
                path: SEARCH.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CatalogError::RequestStatus {
                path: SEARCH.to_string(),
                status: response.status(),
            });
        }

        let mut hits = response
            .json::<Vec<CatalogSearchHit>>()
            .await
            .map_err(|source| CatalogError::DecodeResponse {
                path: SEARCH.to_string(),
                source,
            })?;
        hits.truncate(self.config.search_limit);
        Ok(hits)
    }

    /// Fetch details for one catalog entry, polling while the upstream is still processing.
    pub async fn details(&self, id: &str) -> CatalogResult<CatalogGameDetails> {
        let path = format!("games/{id}");
        let url = self.endpoint(&["games", id]);
        let max_attempts = self.config.max_attempts;

        for attempt in 1..=max_attempts {
            let response =
                self.client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|source| CatalogError::RequestSend {
                        path: path.clone(),
                        source,
                    })?;

            match response.status() {
                StatusCode::ACCEPTED => {
                    debug!(id, attempt, "catalog still processing details");
                    if attempt < max_attempts {
                        sleep(self.config.retry_delay).await;
                    }
                }
                StatusCode::NOT_FOUND => return Err(CatalogError::NotFound { id: id.to_owned() }),
                status if status.is_success() => {
                    return response
                        .json::<CatalogGameDetails>()
                        .await
                        .map_err(|source| CatalogError::DecodeResponse { path, source });
                }
                other => {
                    return Err(CatalogError::RequestStatus {
                        path,
                        status: other,
                    });
                }
            }
        }

        Err(CatalogError::StillProcessing {
            id: id.to_owned(),
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    use axum::{
        Json, Router,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
        routing::get,
    };
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn spawn_upstream(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: String, max_attempts: u32) -> CatalogClient {
        CatalogClient::new(CatalogConfig {
            base_url,
            search_limit: 2,
            max_attempts,
            retry_delay: Duration::from_millis(5),
        })
        .unwrap()
    }

    async fn processing_twice(State(calls): State<Arc<AtomicU32>>) -> impl IntoResponse {
        let call = calls.fetch_add(1, Ordering::SeqCst);
        if call < 2 {
            return StatusCode::ACCEPTED.into_response();
        }
        Json(json!({
            "id": "13",
            "name": "Catan",
            "min_players": 3,
            "max_players": 4,
            "playing_time": 90,
            "categories": ["Negotiation"]
        }))
        .into_response()
    }

    #[tokio::test]
    async fn details_polls_until_ready() {
        let calls = Arc::new(AtomicU32::new(0));
        let router = Router::new()
            .route("/games/{id}", get(processing_twice))
            .with_state(calls.clone());
        let base_url = spawn_upstream(router).await;

        let details = client(base_url, 4).details("13").await.unwrap();

        assert_eq!(details.name, "Catan");
        assert_eq!(details.playing_time, Some(90));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn details_gives_up_at_the_attempt_ceiling() {
        let calls = Arc::new(AtomicU32::new(0));
        let router = Router::new()
            .route("/games/{id}", get(processing_twice))
            .with_state(calls.clone());
        let base_url = spawn_upstream(router).await;

        let err = client(base_url, 2).details("13").await.unwrap_err();

        assert!(matches!(err, CatalogError::StillProcessing { attempts: 2, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unknown_game_maps_to_not_found() {
        let router = Router::new().route("/games/{id}", get(|| async { StatusCode::NOT_FOUND }));
        let base_url = spawn_upstream(router).await;

        let err = client(base_url, 3).details("999").await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { ref id } if id == "999"));
    }

    #[tokio::test]
    async fn details_id_stays_one_path_segment() {
        let router = Router::new().route(
            "/games/{id}",
            get(|Path(id): Path<String>| async move { Json(json!({ "id": id, "name": "Echo" })) }),
        );
        let base_url = spawn_upstream(router).await;

        let details = client(base_url, 1).details("13/../admin?x=1").await.unwrap();
        assert_eq!(details.id, "13/../admin?x=1");
    }

    #[test]
    fn base_url_must_be_hierarchical() {
        let err = CatalogClient::new(CatalogConfig {
            base_url: "mailto:catalog@example.com".into(),
            search_limit: 1,
            max_attempts: 1,
            retry_delay: Duration::from_millis(1),
        })
        .err()
        .unwrap();
        assert!(matches!(err, CatalogError::InvalidBaseUrl { .. }));
    }

    #[tokio::test]
    async fn search_truncates_to_limit() {
        let router = Router::new().route(
            "/search",
            get(|| async {
                Json(json!([
                    {"id": "1", "name": "Azul"},
                    {"id": "2", "name": "Azul: Summer Pavilion", "year": 2019},
                    {"id": "3", "name": "Azul: Stained Glass"}
                ]))
            }),
        );
        let base_url = spawn_upstream(router).await;

        let hits = client(base_url, 1).search("azul").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].year, Some(2019));
    }
}
