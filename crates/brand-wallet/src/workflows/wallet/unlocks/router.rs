use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{BrandId, TierKey, TierTemplate, UserId};
use super::repository::{NotificationSink, RepositoryError, WalletRepository};
use super::service::{CardUnlockService, CardUnlockServiceError};
use crate::workflows::wallet::activity::ActivitySnapshot;

/// Router builder exposing wallet, brand console, dashboard and preview endpoints.
pub fn wallet_router<R, N>(service: Arc<CardUnlockService<R, N>>) -> Router
where
    R: WalletRepository + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/users/:user_id/wallet/:brand_id/tiers",
            get(wallet_tiers_handler::<R, N>),
        )
        .route(
            "/api/v1/brands/:brand_id/members/:user_id/tiers",
            get(member_tiers_handler::<R, N>),
        )
        .route(
            "/api/v1/users/:user_id/dashboard",
            get(dashboard_handler::<R, N>),
        )
        .route(
            "/api/v1/unlock-conditions/preview",
            post(preview_handler::<R, N>),
        )
        .with_state(service)
}

/// Templates and counters a brand admin wants to try out before saving.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub templates: Vec<TierTemplate>,
    #[serde(default)]
    pub snapshot: ActivitySnapshot,
    #[serde(default)]
    pub current_tier: Option<TierKey>,
}

pub(crate) async fn wallet_tiers_handler<R, N>(
    State(service): State<Arc<CardUnlockService<R, N>>>,
    Path((user_id, brand_id)): Path<(String, String)>,
) -> Response
where
    R: WalletRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.wallet_tiers(&UserId(user_id), &BrandId(brand_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn member_tiers_handler<R, N>(
    State(service): State<Arc<CardUnlockService<R, N>>>,
    Path((brand_id, user_id)): Path<(String, String)>,
) -> Response
where
    R: WalletRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.member_tiers(&BrandId(brand_id), &UserId(user_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(CardUnlockServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "error": "user holds no wallet card with this brand",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn dashboard_handler<R, N>(
    State(service): State<Arc<CardUnlockService<R, N>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: WalletRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.dashboard(&UserId(user_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn preview_handler<R, N>(
    State(service): State<Arc<CardUnlockService<R, N>>>,
    axum::Json(request): axum::Json<PreviewRequest>,
) -> Response
where
    R: WalletRepository + 'static,
    N: NotificationSink + 'static,
{
    let tiers = service.preview(
        &request.templates,
        &request.snapshot,
        request.current_tier.as_ref(),
    );
    (StatusCode::OK, axum::Json(json!({ "tiers": tiers }))).into_response()
}

fn error_response(error: CardUnlockServiceError) -> Response {
    let status = match &error {
        CardUnlockServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        CardUnlockServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
