use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::{IntoParams, ToSchema};

use crate::dao::catalog::CatalogSearchHit;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogSearchQuery {
    /// Name fragment; blank queries return nothing.
    pub query: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogSearchResult {
    pub external_id: String,
    pub name: String,
    pub year: Option<i32>,
    pub thumbnail_url: Option<String>,
}

impl From<CatalogSearchHit> for CatalogSearchResult {
    fn from(hit: CatalogSearchHit) -> Self {
        Self {
            external_id: hit.id,
            name: hit.name,
            year: hit.year,
            thumbnail_url: hit.thumbnail,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogSearchResponse {
    /// Set when a newer search from the same caller overtook this one; `results` is then empty.
    pub superseded: bool,
    pub results: Vec<CatalogSearchResult>,
}
