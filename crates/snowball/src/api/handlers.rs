//! HTTP handlers for the control-plane facade.

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use snowball_protocol::{
    DiscoveredPeer, NodeIdentity, PairingRequest, ResourceGrant, ResourceRequest,
};

use super::error::ApiError;
use super::state::AppState;
use crate::discovery;
use crate::pairing::PairingStatus;
use crate::resources::LocalCapabilities;
use crate::tokens::SecurityToken;

/// Scope and lifetime of the token handed out with an approved pairing.
const SESSION_SCOPE: &str = "host.session";
const SESSION_TTL_SECS: i64 = 300;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn identity(State(state): State<AppState>) -> Json<NodeIdentity> {
    Json(state.identity.clone())
}

#[derive(Debug, Default, Deserialize)]
pub struct DiscoverQuery {
    /// Override the configured collection window.
    pub timeout_ms: Option<u64>,
}

/// One-shot LAN broadcast; returns whatever answered within the window.
pub async fn discover(
    State(state): State<AppState>,
    Query(query): Query<DiscoverQuery>,
) -> Result<Json<Vec<DiscoveredPeer>>, ApiError> {
    let timeout = query
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(state.broadcast_timeout);

    let peers = discovery::broadcast(state.discovery_port, timeout)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(Json(peers))
}

/// Accepts any JSON object; normalization happens in the coordinator.
pub async fn request_pairing(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Json<PairingRequest> {
    Json(state.coordinator.create_request(&payload).await)
}

#[derive(Debug, Deserialize)]
pub struct ApproveBody {
    pub request_id: String,
}

#[derive(Debug, Serialize)]
pub struct ApproveResponse {
    pub approved: bool,
    /// Short-lived scoped token for the freshly paired session. Opaque
    /// bearer string, expiry-checked only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<SecurityToken>,
}

/// Approve a pairing request.
///
/// An unknown request id answers `{approved: false}` rather than 404 —
/// duplicate approval clicks are an expected race, not an error. Approval
/// comes with a session token for the remote runtime handshake.
pub async fn approve_pairing(
    State(state): State<AppState>,
    Json(body): Json<ApproveBody>,
) -> Result<Json<ApproveResponse>, ApiError> {
    let approved = state.coordinator.approve(&body.request_id).await?;
    let session_token = approved.then(|| SecurityToken::generate(SESSION_SCOPE, SESSION_TTL_SECS));
    Ok(Json(ApproveResponse {
        approved,
        session_token,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub host_id: Option<String>,
}

pub async fn pairing_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Json<PairingStatus> {
    Json(state.coordinator.status(query.host_id.as_deref()).await)
}

pub async fn pairing_requests(State(state): State<AppState>) -> Json<Vec<PairingRequest>> {
    Json(state.coordinator.requests().await)
}

pub async fn capabilities(State(state): State<AppState>) -> Json<LocalCapabilities> {
    Json(state.controller.capabilities())
}

pub async fn grant_resources(
    State(state): State<AppState>,
    Json(request): Json<ResourceRequest>,
) -> Result<Json<ResourceGrant>, ApiError> {
    let grant = state.controller.grant(&request).await?;
    Ok(Json(grant))
}

#[derive(Debug, Deserialize)]
pub struct LaunchBody {
    pub command: Vec<String>,
    pub resources: ResourceRequest,
}

#[derive(Debug, Serialize)]
pub struct LaunchResponse {
    pub pid: u32,
}

/// Grant the requested resources and launch the command sandboxed.
pub async fn launch(
    State(state): State<AppState>,
    Json(body): Json<LaunchBody>,
) -> Result<Json<LaunchResponse>, ApiError> {
    let grant = state.controller.grant(&body.resources).await?;
    let handle = state.sandbox.launch(&body.command, &grant).await?;
    Ok(Json(LaunchResponse { pid: handle.pid }))
}
