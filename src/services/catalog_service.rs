use tracing::debug;

use crate::{
    dto::{
        catalog::{CatalogSearchResponse, CatalogSearchResult},
        game::GameInput,
    },
    error::ServiceError,
    state::{SharedState, session::SessionContext},
};

/// Search the catalog, discarding the answer when a newer search from the caller overtook it.
pub async fn search(
    state: &SharedState,
    ctx: &SessionContext,
    query: &str,
) -> Result<CatalogSearchResponse, ServiceError> {
    let ticket = state.searches().issue(&ctx.user_id);
    let query = query.trim();
    if query.is_empty() {
        return Ok(CatalogSearchResponse {
            superseded: false,
            results: Vec::new(),
        });
    }

    let hits = state.catalog().search(query).await?;
    if !state.searches().is_current(&ticket) {
        debug!(user_id = %ctx.user_id, query, "dropping superseded catalog search");
        return Ok(CatalogSearchResponse {
            superseded: true,
            results: Vec::new(),
        });
    }

    Ok(CatalogSearchResponse {
        superseded: false,
        results: hits.into_iter().map(CatalogSearchResult::from).collect(),
    })
}

/// Catalog details shaped as a game payload ready to submit.
pub async fn details(state: &SharedState, external_id: &str) -> Result<GameInput, ServiceError> {
    let external_id = external_id.trim();
    if external_id.is_empty() {
        return Err(ServiceError::InvalidInput("catalog id must not be blank".into()));
    }
    let details = state.catalog().details(external_id).await?;
    Ok(details.into())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{Json, Router, extract::Query, routing::get};
    use serde::Deserialize;
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use super::*;
    use crate::{config::AppConfig, state::AppState};

    #[derive(Deserialize)]
    struct Search {
        query: String,
    }

    async fn slow_for_short_queries(Query(search): Query<Search>) -> Json<Value> {
        if search.query.len() < 4 {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        Json(json!([{ "id": "1", "name": format!("{} result", search.query) }]))
    }

    async fn state_with_upstream() -> SharedState {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = Router::new().route("/search", get(slow_for_short_queries));
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let mut config = AppConfig::default();
        config.catalog.base_url = format!("http://{addr}");
        AppState::new(config).unwrap()
    }

    #[tokio::test]
    async fn blank_query_skips_the_upstream() {
        let mut config = AppConfig::default();
        config.catalog.base_url = "http://127.0.0.1:9".into();
        let state = AppState::new(config).unwrap();
        let ctx = state.sessions().issue("alice");

        let response = search(&state, &ctx, "   ").await.unwrap();
        assert!(!response.superseded);
        assert!(response.results.is_empty());
    }

    #[tokio::test]
    async fn overtaken_search_is_reported_as_superseded() {
        let state = state_with_upstream().await;
        let ctx = state.sessions().issue("alice");

        let slow = {
            let state = state.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move { search(&state, &ctx, "cat").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let fresh = search(&state, &ctx, "catan").await.unwrap();
        let stale = slow.await.unwrap().unwrap();

        assert!(!fresh.superseded);
        assert_eq!(fresh.results[0].name, "catan result");
        assert!(stale.superseded);
        assert!(stale.results.is_empty());
    }
}
