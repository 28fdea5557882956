// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Edge-controller join tokens and certificates.

use axum::{extract::State, Json};

use super::RpcJson;
use crate::{
    error::{AuthxError, ErrorBody},
    inventory::{ControllerCertRequest, ControllerCertificate, JoinToken},
    models::{CreateControllerCertRequest, JoinTokenRequest, OrganizationRequest, Success},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/inventory/CreateEICJoinToken",
    request_body = OrganizationRequest,
    tag = "Inventory",
    responses((status = 200, body = JoinToken), (status = 400, body = ErrorBody))
)]
pub async fn create_eic_join_token(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<OrganizationRequest>,
) -> Result<Json<JoinToken>, AuthxError> {
    Ok(Json(state.join_tokens.create(&request.organization_id)?))
}

#[utoipa::path(
    post,
    path = "/inventory/ValidEICJoinToken",
    request_body = JoinTokenRequest,
    tag = "Inventory",
    responses(
        (status = 200, body = Success),
        (status = 401, description = "Unknown or expired token", body = ErrorBody)
    )
)]
pub async fn valid_eic_join_token(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<JoinTokenRequest>,
) -> Result<Json<Success>, AuthxError> {
    state
        .join_tokens
        .validate(&request.organization_id, &request.token_id)?;
    Ok(Json(Success {}))
}

#[utoipa::path(
    post,
    path = "/certificates/CreateControllerCert",
    request_body = CreateControllerCertRequest,
    tag = "Certificates",
    responses(
        (status = 200, body = ControllerCertificate),
        (status = 400, description = "Missing ids or unparseable IPs", body = ErrorBody)
    )
)]
pub async fn create_controller_cert(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<CreateControllerCertRequest>,
) -> Result<Json<ControllerCertificate>, AuthxError> {
    let certificate = state
        .minter
        .mint_blocking(ControllerCertRequest {
            organization_id: request.organization_id,
            edge_controller_id: request.edge_controller_id,
            name: request.name,
            ips: request.ips,
        })
        .await?;
    Ok(Json(certificate))
}
