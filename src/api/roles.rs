// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use super::RpcJson;
use crate::{
    error::{AuthxError, ErrorBody},
    models::{EditUserRoleRequest, OrganizationRequest, RoleList, Success, UserRoleRequest},
    state::AppState,
    storage::Role,
};

#[utoipa::path(
    post,
    path = "/authx/AddRole",
    request_body = Role,
    tag = "Role",
    responses(
        (status = 200, body = Success),
        (status = 400, description = "Missing ids or primitives", body = ErrorBody),
        (status = 409, body = ErrorBody)
    )
)]
pub async fn add_role(
    State(state): State<AppState>,
    RpcJson(role): RpcJson<Role>,
) -> Result<Json<Success>, AuthxError> {
    state.authx.add_role(role)?;
    Ok(Json(Success {}))
}

#[utoipa::path(
    post,
    path = "/authx/EditUserRole",
    request_body = EditUserRoleRequest,
    tag = "Role",
    responses((status = 200, body = Success), (status = 404, body = ErrorBody))
)]
pub async fn edit_user_role(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<EditUserRoleRequest>,
) -> Result<Json<Success>, AuthxError> {
    state
        .authx
        .edit_user_role(&request.username, &request.new_role_id)?;
    Ok(Json(Success {}))
}

#[utoipa::path(
    post,
    path = "/authx/ListRoles",
    request_body = OrganizationRequest,
    tag = "Role",
    responses((status = 200, body = RoleList))
)]
pub async fn list_roles(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<OrganizationRequest>,
) -> Result<Json<RoleList>, AuthxError> {
    let roles = state.authx.list_roles(&request.organization_id)?;
    Ok(Json(RoleList { roles }))
}

#[utoipa::path(
    post,
    path = "/authx/GetUserRole",
    request_body = UserRoleRequest,
    tag = "Role",
    responses((status = 200, body = Role), (status = 404, body = ErrorBody))
)]
pub async fn get_user_role(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<UserRoleRequest>,
) -> Result<Json<Role>, AuthxError> {
    Ok(Json(
        state
            .authx
            .get_user_role(&request.organization_id, &request.email)?,
    ))
}
