//! Current location endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{location::Locality, pincode::Pincode},
    services::pincode::{CompatibilityResult, PincodeChange},
    AppState,
};

use super::CurrentViewer;

#[derive(Debug, Serialize, ToSchema)]
pub struct PincodeResponse {
    pub pincode: Option<Pincode>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetPincodeRequest {
    /// Six digits, no surrounding whitespace
    #[schema(example = "500001")]
    pub pincode: String,
}

/// Result of a pincode submission. `compatibility` describes the cart against the
/// new value as seen before the switch.
#[derive(Debug, Serialize, ToSchema)]
pub struct SetPincodeResponse {
    pub change: PincodeChange,
    pub compatibility: CompatibilityResult,
}

/// Get the active pincode
#[utoipa::path(
    get,
    path = "/pincode",
    tag = "pincode",
    params(("X-Session-Id" = Option<String>, Header, description = "Anonymous session")),
    responses(
        (status = 200, description = "Active pincode, if any", body = PincodeResponse)
    )
)]
pub async fn get_pincode(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> AppResult<Json<PincodeResponse>> {
    let current = state.services.pincode.load(&viewer).await?;
    Ok(Json(PincodeResponse {
        pincode: current.get().cloned(),
    }))
}

/// Set the active pincode
#[utoipa::path(
    put,
    path = "/pincode",
    tag = "pincode",
    params(("X-Session-Id" = Option<String>, Header, description = "Anonymous session")),
    request_body = SetPincodeRequest,
    responses(
        (status = 200, description = "Pincode stored", body = SetPincodeResponse),
        (status = 400, description = "Not six digits")
    )
)]
pub async fn set_pincode(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Json(request): Json<SetPincodeRequest>,
) -> AppResult<Json<SetPincodeResponse>> {
    let pincode = Pincode::parse(&request.pincode)?;
    let (compatibility, change) = state.services.pincode.switch_to(&viewer, pincode).await?;
    Ok(Json(SetPincodeResponse {
        change,
        compatibility,
    }))
}

/// Skip: forget the active pincode
#[utoipa::path(
    delete,
    path = "/pincode",
    tag = "pincode",
    params(("X-Session-Id" = Option<String>, Header, description = "Anonymous session")),
    responses(
        (status = 200, description = "Pincode cleared", body = PincodeChange)
    )
)]
pub async fn clear_pincode(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> AppResult<Json<PincodeChange>> {
    let change = state.services.pincode.clear(&viewer).await?;
    Ok(Json(change))
}

/// Preview how a pincode switch would affect the cart
#[utoipa::path(
    post,
    path = "/pincode/compatibility",
    tag = "pincode",
    security(("bearer_auth" = [])),
    request_body = SetPincodeRequest,
    responses(
        (status = 200, description = "Compatibility of the switch", body = CompatibilityResult)
    )
)]
pub async fn check_compatibility(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Json(request): Json<SetPincodeRequest>,
) -> AppResult<Json<CompatibilityResult>> {
    let result = state
        .services
        .pincode
        .preview_switch(&viewer, &request.pincode)
        .await?;
    Ok(Json(result))
}

/// Localities served by a pincode (empty when the directory is unreachable)
#[utoipa::path(
    get,
    path = "/pincode/{pincode}/localities",
    tag = "pincode",
    params(("pincode" = String, Path, description = "Six-digit pincode")),
    responses(
        (status = 200, description = "Localities", body = Vec<Locality>)
    )
)]
pub async fn get_localities(
    State(state): State<AppState>,
    Path(pincode): Path<String>,
) -> AppResult<Json<Vec<Locality>>> {
    let localities = state.services.pincode.localities(&pincode).await?;
    Ok(Json(localities))
}
