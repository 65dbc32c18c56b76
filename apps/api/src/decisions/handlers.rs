//! Axum route handlers for the Decisions API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::dashboard::filter::FilterQuery;
use crate::decisions::form::{DecisionForm, FormConfig, FormMode};
use crate::errors::AppError;
use crate::models::decision::DecisionRecord;
use crate::state::AppState;
use crate::store::DateOrder;

/// Informational message for a name search that matched nothing.
pub const NO_RESULTS_MESSAGE: &str = "Nenhuma decisão encontrada com este nome";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub order: DateOrder,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub nome: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub records: Vec<DecisionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RemovalRequest {
    #[serde(default)]
    pub confirm: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/decisions
/// Without filter parameters returns every record. Any filter parameter switches
/// to the filtered query; missing `start`/`end` then fall back to the dashboard
/// window (first day of last month through the end of this month). Blank values
/// are no filter. `order=asc|desc` sorts by decision date, newest first by default.
pub async fn handle_list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(listing): Query<ListQuery>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<DecisionRecord>>, AppError> {
    if query.is_empty() {
        return Ok(Json(state.store.list_all(listing.order).await?));
    }
    let criteria = query
        .into_criteria(chrono::Local::now().date_naive())
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let mut records = state.store.filtered_query(&criteria).await?;
    if listing.order == DateOrder::Ascending {
        records.reverse();
    }
    Ok(Json(records))
}

/// GET /api/v1/decisions/search?nome=
pub async fn handle_search(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let term = query.nome.as_deref().map(str::trim).unwrap_or_default();
    if term.is_empty() {
        return Err(AppError::Validation("search term is required".to_string()));
    }

    let records = state.store.search_by_name(term).await?;
    let message = records.is_empty().then(|| NO_RESULTS_MESSAGE.to_string());
    Ok(Json(SearchResponse { records, message }))
}

/// GET /api/v1/decisions/:id
pub async fn handle_get(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<DecisionRecord>, AppError> {
    let record = state
        .store
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Decision {id} not found")))?;
    Ok(Json(record))
}

/// POST /api/v1/decisions
pub async fn handle_create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(form): Json<DecisionForm>,
) -> Result<(StatusCode, Json<DecisionRecord>), AppError> {
    let new = form.into_new_decision(&user.identity)?;
    let record = state.store.insert(new).await?;
    tracing::info!("Decision {} registered by {}", record.id, user.identity.id);
    Ok((StatusCode::CREATED, Json(record)))
}

/// PATCH /api/v1/decisions/:id
pub async fn handle_edit(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
    Json(form): Json<DecisionForm>,
) -> Result<StatusCode, AppError> {
    let patch = form.into_patch(FormMode::Edit)?;
    state.store.update_fields(id, &patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/decisions/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
    Json(form): Json<DecisionForm>,
) -> Result<StatusCode, AppError> {
    let patch = form.into_patch(FormMode::StatusUpdate)?;
    state.store.update_fields(id, &patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/decisions/:id
/// Permanent. Refused unless the body carries `"confirm": true`.
pub async fn handle_remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    body: Option<Json<RemovalRequest>>,
) -> Result<StatusCode, AppError> {
    let confirmed = body.map(|Json(req)| req.confirm).unwrap_or(false);
    if !confirmed {
        return Err(AppError::ConfirmationRequired);
    }
    state.store.delete_by_id(id).await?;
    tracing::info!("Decision {id} removed by {}", user.identity.id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/forms/:mode
pub async fn handle_form_config(_user: CurrentUser, Path(mode): Path<FormMode>) -> Json<FormConfig> {
    Json(mode.config())
}
