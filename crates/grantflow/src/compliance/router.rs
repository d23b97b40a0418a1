use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use super::actions::ComplianceAction;
use super::domain::UserId;
use super::repository::ComplianceStore;
use super::service::{ComplianceService, ComplianceServiceError};

/// Router builder exposing the compliance dashboard and action endpoints.
pub fn compliance_router<S>(service: Arc<ComplianceService<S>>) -> Router
where
    S: ComplianceStore + 'static,
{
    Router::new()
        .route(
            "/api/compliance",
            get(overview_handler::<S>).post(action_handler::<S>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverviewQuery {
    #[serde(rename = "userId", default)]
    pub(crate) user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ComplianceRequest {
    #[serde(rename = "userId", default)]
    pub(crate) user_id: Option<String>,
    #[serde(default)]
    pub(crate) action: Option<String>,
    #[serde(default)]
    pub(crate) data: Option<Value>,
}

#[derive(Debug, Serialize)]
struct Envelope<T> {
    success: bool,
    data: T,
}

fn success<T: Serialize>(data: T) -> Response {
    (
        StatusCode::OK,
        Json(Envelope {
            success: true,
            data,
        }),
    )
        .into_response()
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn parse_user_id(raw: Option<&str>) -> Result<UserId, Response> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "User ID is required"))?;
    Uuid::parse_str(raw)
        .map(UserId)
        .map_err(|_| failure(StatusCode::BAD_REQUEST, "User ID must be a valid UUID"))
}

fn service_failure(err: ComplianceServiceError) -> Response {
    match err {
        ComplianceServiceError::InvalidRequest(message) => {
            failure(StatusCode::BAD_REQUEST, &message)
        }
        ComplianceServiceError::UnknownAction(ref action) => {
            debug!(action = %action, "rejected unknown compliance action");
            failure(StatusCode::BAD_REQUEST, &err.to_string())
        }
        ComplianceServiceError::NotFound { .. } => {
            failure(StatusCode::NOT_FOUND, &err.to_string())
        }
        ComplianceServiceError::Store(_) | ComplianceServiceError::Encode(_) => {
            error!(error = %err, "compliance request failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        }
    }
}

pub(crate) async fn overview_handler<S>(
    State(service): State<Arc<ComplianceService<S>>>,
    Query(query): Query<OverviewQuery>,
) -> Response
where
    S: ComplianceStore + 'static,
{
    let user = match parse_user_id(query.user_id.as_deref()) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let overview = service.overview(user, Utc::now()).await;
    success(overview)
}

pub(crate) async fn action_handler<S>(
    State(service): State<Arc<ComplianceService<S>>>,
    payload: Result<Json<ComplianceRequest>, JsonRejection>,
) -> Response
where
    S: ComplianceStore + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            debug!(error = %rejection, "malformed compliance request body");
            return failure(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    let user = match parse_user_id(request.user_id.as_deref()) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let Some(action) = request.action.as_deref().filter(|a| !a.trim().is_empty()) else {
        return failure(StatusCode::BAD_REQUEST, "Action is required");
    };

    let action = match ComplianceAction::parse(action.trim(), request.data) {
        Ok(action) => action,
        Err(err) => return service_failure(err),
    };

    match service.execute(user, action, Utc::now()).await {
        Ok(data) => success(data),
        Err(err) => service_failure(err),
    }
}
