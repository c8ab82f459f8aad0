//! Profile endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::user::{UpdateProfile, User},
    AppState,
};

use super::CurrentViewer;

/// Get current user's profile
#[utoipa::path(
    get,
    path = "/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile", body = User),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn get_me(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> AppResult<Json<User>> {
    let user = state.services.users.get_profile(&viewer).await?;
    Ok(Json(user))
}

/// Update current user's profile, including the preferred pincode
#[utoipa::path(
    put,
    path = "/me",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 400, description = "Invalid field or pincode")
    )
)]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Json(request): Json<UpdateProfile>,
) -> AppResult<Json<User>> {
    let user = state.services.users.update_profile(&viewer, request).await?;
    Ok(Json(user))
}
