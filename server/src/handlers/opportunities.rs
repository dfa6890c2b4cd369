use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use chrono::Utc;

use crate::services::opportunities::{OpportunityParams, OpportunityQuery};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;
use crate::utils::validation::query_params;

pub async fn list_opportunities(
    State(state): State<AppState>,
    params: Result<Query<OpportunityParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let query = OpportunityQuery::from_params(query_params(params)?)?;
    let page = state
        .opportunities
        .list(&query, Utc::now().date_naive())
        .await?;

    tracing::debug!(
        total = page.pagination.total,
        page = query.page,
        "Listed opportunities"
    );
    Ok(success(page, "Opportunities retrieved"))
}

pub async fn get_opportunity(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let opportunity = state.opportunities.by_slug(&slug).await?;
    Ok(success(opportunity, "Opportunity retrieved"))
}

pub async fn list_causes(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(success(state.opportunities.causes().await?, "Causes retrieved"))
}

pub async fn list_locations(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(success(
        state.opportunities.locations().await?,
        "Locations retrieved",
    ))
}

pub async fn list_organizers(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(success(
        state.opportunities.organizers().await?,
        "Organizers retrieved",
    ))
}
