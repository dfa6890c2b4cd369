use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Response;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::services::algolia::{OpportunityRecord, SearchIndex, SearchRequest};
use crate::services::opportunities::{parse_paging, OpportunityQuery, Pagination};
use crate::services::query_parser::{parse_search_query, ParsedQuery};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;
use crate::utils::validation::query_params;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default, alias = "query")]
    pub q: String,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub parsed: ParsedQuery,
    pub hits: Vec<OpportunityRecord>,
    pub pagination: Pagination,
    /// Which backend answered: `algolia` or `contentstack`.
    pub source: &'static str,
}

pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let params = query_params(params)?;
    let (page, limit) = parse_paging(params.page.as_deref(), params.limit.as_deref());
    let parsed = parse_search_query(&params.q);

    tracing::debug!(
        keywords = %parsed.keywords,
        city = ?parsed.city,
        is_virtual = parsed.is_virtual,
        "Parsed search query"
    );

    let results = match &state.search {
        Some(index) => {
            let request = SearchRequest {
                query: parsed.keywords.clone(),
                filters: parsed.to_search_filters(),
                page: page - 1,
                hits_per_page: limit,
            };
            let response = index.search(&request).await?;
            let current = response.page + 1;
            SearchResults {
                pagination: Pagination {
                    page: current,
                    limit,
                    total: response.nb_hits as usize,
                    total_pages: response.nb_pages,
                    has_more: current < response.nb_pages,
                },
                hits: response.hits,
                parsed,
                source: "algolia",
            }
        }
        None => {
            let query = OpportunityQuery {
                page,
                limit,
                city: parsed.city.clone(),
                is_virtual: parsed.is_virtual.then_some(true),
                search: Some(parsed.keywords.clone()).filter(|k| !k.is_empty()),
                ..OpportunityQuery::default()
            };
            let found = state
                .opportunities
                .list(&query, Utc::now().date_naive())
                .await?;
            SearchResults {
                hits: found.items.iter().map(OpportunityRecord::from).collect(),
                pagination: found.pagination,
                parsed,
                source: "contentstack",
            }
        }
    };

    Ok(success(results, "Search completed"))
}
