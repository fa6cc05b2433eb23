use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use service::experts::domain::{ExpertProfile, SearchCriteria};
use service::experts::errors::ExpertError;
use service::pagination::{Page, Pagination};

use super::ServerState;
use crate::errors::ApiError;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Free-form name query; whitespace-split into search terms.
    pub name: Option<String>,
    /// Comma-separated region ids.
    pub regions: Option<String>,
    /// Comma-separated direction ids.
    pub directions: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub directions: Option<String>,
}

fn pagination(page: Option<u32>, per_page: Option<u32>) -> Pagination {
    let d = Pagination::default();
    Pagination { page: page.unwrap_or(d.page), per_page: per_page.unwrap_or(d.per_page) }
}

fn parse_id_list(raw: Option<&str>) -> Result<Vec<Uuid>, ApiError> {
    let Some(raw) = raw else { return Ok(Vec::new()) };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s)
                .map_err(|_| ApiError(ExpertError::Validation(format!("invalid id: {s}"))))
        })
        .collect()
}

pub async fn search(
    State(state): State<ServerState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Page<ExpertProfile>>, ApiError> {
    let criteria = SearchCriteria {
        name_terms: params
            .name
            .as_deref()
            .map(|n| n.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default(),
        regions: parse_id_list(params.regions.as_deref())?,
        directions: parse_id_list(params.directions.as_deref())?,
    };
    let page = state
        .experts
        .find_all_experts(&criteria, pagination(params.page, params.per_page))
        .await?;
    Ok(Json(page))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExpertProfile>, ApiError> {
    let profile = state.experts.find_expert_by_id(id).await?;
    Ok(Json(profile))
}

pub async fn random_preview(
    State(state): State<ServerState>,
    Query(params): Query<PreviewParams>,
) -> Result<Json<Page<ExpertProfile>>, ApiError> {
    let directions = parse_id_list(params.directions.as_deref())?;
    let page = state
        .experts
        .find_random_expert_preview(&directions, pagination(params.page, params.per_page))
        .await?;
    Ok(Json(page))
}
