//! Administration endpoints: dashboard statistics and platform settings

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::settings::{PlatformSettings, UpdateSettings},
    services::stats::StatsResponse,
    AppState,
};

use super::AuthenticatedUser;

/// Dashboard statistics
#[utoipa::path(
    get,
    path = "/admin/stats",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Statistics", body = StatsResponse)
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<StatsResponse>> {
    let stats = state.services.stats.get_stats(&claims).await?;
    Ok(Json(stats))
}

/// Get platform settings
#[utoipa::path(
    get,
    path = "/admin/settings",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current settings", body = PlatformSettings)
    )
)]
pub async fn get_settings(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<PlatformSettings>> {
    claims.require_admin()?;
    let settings = state.services.settings.get_settings().await?;
    Ok(Json(settings))
}

/// Update platform settings
#[utoipa::path(
    put,
    path = "/admin/settings",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = UpdateSettings,
    responses(
        (status = 200, description = "Settings updated", body = PlatformSettings),
        (status = 400, description = "Fee rate outside [0, 1]")
    )
)]
pub async fn update_settings(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdateSettings>,
) -> AppResult<Json<PlatformSettings>> {
    let settings = state
        .services
        .settings
        .update_settings(&claims, request)
        .await?;
    Ok(Json(settings))
}
