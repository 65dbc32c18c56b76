use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use chrono::{Local, NaiveDate};

use crate::auth::CurrentUser;
use crate::dashboard::aggregate::{build_dashboard, DashboardView};
use crate::dashboard::export::{export_csv, export_filename};
use crate::dashboard::filter::{apply_filters, FilterCriteria, FilterQuery};
use crate::errors::AppError;
use crate::state::AppState;
use crate::store::DateOrder;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn criteria_from(query: FilterQuery) -> Result<FilterCriteria, AppError> {
    query
        .into_criteria(today())
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// GET /api/v1/dashboard
/// Loads the full record set once and derives every chart and card from it.
pub async fn handle_dashboard(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<FilterQuery>,
) -> Result<Json<DashboardView>, AppError> {
    let criteria = criteria_from(query)?;
    let all = state.store.list_all(DateOrder::Descending).await?;
    Ok(Json(build_dashboard(&all, &criteria)))
}

/// GET /api/v1/dashboard/export
pub async fn handle_export(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<FilterQuery>,
) -> Result<impl IntoResponse, AppError> {
    let criteria = criteria_from(query)?;
    let all = state.store.list_all(DateOrder::Descending).await?;
    let filtered = apply_filters(&all, &criteria);
    let body = export_csv(&filtered)?;
    tracing::debug!("Exported {} decisions", filtered.len());

    let disposition = format!("attachment; filename=\"{}\"", export_filename(today()));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Bytes::from(body),
    ))
}
