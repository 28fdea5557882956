// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Device groups, devices and device tokens.

use axum::{extract::State, Json};

use super::RpcJson;
use crate::{
    authx::DeviceGroupUpdate,
    error::{AuthxError, ErrorBody},
    models::{
        AddDeviceGroupRequest, DeviceGroupIdRequest, DeviceGroupLoginRequest, DeviceGroupSecret,
        DeviceIdRequest, DeviceList, DeviceLoginRequest, RefreshTokenRequest, Success,
        UpdateDeviceGroupRequest, UpdateDeviceRequest,
    },
    state::AppState,
    storage::{DeviceCredentials, DeviceGroupCredentials},
    token::TokenPair,
};

// =============================================================================
// Device groups
// =============================================================================

#[utoipa::path(
    post,
    path = "/authx/AddDeviceGroupCredentials",
    request_body = AddDeviceGroupRequest,
    tag = "Device",
    responses((status = 200, body = DeviceGroupCredentials), (status = 409, body = ErrorBody))
)]
pub async fn add_device_group_credentials(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<AddDeviceGroupRequest>,
) -> Result<Json<DeviceGroupCredentials>, AuthxError> {
    Ok(Json(state.authx.add_device_group_credentials(
        &request.organization_id,
        &request.device_group_id,
        request.enabled,
        request.default_device_connectivity,
    )?))
}

#[utoipa::path(
    post,
    path = "/authx/UpdateDeviceGroupCredentials",
    request_body = UpdateDeviceGroupRequest,
    tag = "Device",
    responses((status = 200, body = Success), (status = 404, body = ErrorBody))
)]
pub async fn update_device_group_credentials(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<UpdateDeviceGroupRequest>,
) -> Result<Json<Success>, AuthxError> {
    let update = DeviceGroupUpdate {
        enabled: request.update_enabled.then_some(request.enabled),
        default_device_connectivity: request
            .update_device_connectivity
            .then_some(request.default_device_connectivity),
    };
    state.authx.update_device_group_credentials(
        &request.organization_id,
        &request.device_group_id,
        update,
    )?;
    Ok(Json(Success {}))
}

#[utoipa::path(
    post,
    path = "/authx/GetDeviceGroupCredentials",
    request_body = DeviceGroupIdRequest,
    tag = "Device",
    responses((status = 200, body = DeviceGroupCredentials), (status = 404, body = ErrorBody))
)]
pub async fn get_device_group_credentials(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<DeviceGroupIdRequest>,
) -> Result<Json<DeviceGroupCredentials>, AuthxError> {
    Ok(Json(state.authx.get_device_group_credentials(
        &request.organization_id,
        &request.device_group_id,
    )?))
}

/// Removes the group and every device in it.
#[utoipa::path(
    post,
    path = "/authx/RemoveDeviceGroupCredentials",
    request_body = DeviceGroupIdRequest,
    tag = "Device",
    responses((status = 200, body = Success), (status = 404, body = ErrorBody))
)]
pub async fn remove_device_group_credentials(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<DeviceGroupIdRequest>,
) -> Result<Json<Success>, AuthxError> {
    state
        .authx
        .remove_device_group_credentials(&request.organization_id, &request.device_group_id)?;
    Ok(Json(Success {}))
}

#[utoipa::path(
    post,
    path = "/authx/DeviceGroupLogin",
    request_body = DeviceGroupLoginRequest,
    tag = "Device",
    responses(
        (status = 200, body = Success),
        (status = 401, body = ErrorBody),
        (status = 403, description = "Group is disabled", body = ErrorBody)
    )
)]
pub async fn device_group_login(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<DeviceGroupLoginRequest>,
) -> Result<Json<Success>, AuthxError> {
    state
        .authx
        .device_group_login(&request.organization_id, &request.device_group_api_key)?;
    Ok(Json(Success {}))
}

#[utoipa::path(
    post,
    path = "/authx/GetDeviceGroupSecret",
    request_body = DeviceGroupIdRequest,
    tag = "Device",
    responses((status = 200, body = DeviceGroupSecret), (status = 404, body = ErrorBody))
)]
pub async fn get_device_group_secret(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<DeviceGroupIdRequest>,
) -> Result<Json<DeviceGroupSecret>, AuthxError> {
    let secret = state
        .authx
        .get_device_group_secret(&request.organization_id, &request.device_group_id)?;
    Ok(Json(DeviceGroupSecret {
        organization_id: request.organization_id,
        device_group_id: request.device_group_id,
        secret,
    }))
}

// =============================================================================
// Devices
// =============================================================================

#[utoipa::path(
    post,
    path = "/authx/AddDeviceCredentials",
    request_body = DeviceIdRequest,
    tag = "Device",
    responses(
        (status = 200, body = DeviceCredentials),
        (status = 403, description = "Group is disabled", body = ErrorBody),
        (status = 404, description = "Group does not exist", body = ErrorBody),
        (status = 409, body = ErrorBody)
    )
)]
pub async fn add_device_credentials(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<DeviceIdRequest>,
) -> Result<Json<DeviceCredentials>, AuthxError> {
    Ok(Json(state.authx.add_device_credentials(
        &request.organization_id,
        &request.device_group_id,
        &request.device_id,
    )?))
}

#[utoipa::path(
    post,
    path = "/authx/UpdateDeviceCredentials",
    request_body = UpdateDeviceRequest,
    tag = "Device",
    responses((status = 200, body = Success), (status = 404, body = ErrorBody))
)]
pub async fn update_device_credentials(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<UpdateDeviceRequest>,
) -> Result<Json<Success>, AuthxError> {
    state.authx.update_device_credentials(
        &request.organization_id,
        &request.device_group_id,
        &request.device_id,
        request.enabled,
    )?;
    Ok(Json(Success {}))
}

#[utoipa::path(
    post,
    path = "/authx/GetDeviceCredentials",
    request_body = DeviceIdRequest,
    tag = "Device",
    responses((status = 200, body = DeviceCredentials), (status = 404, body = ErrorBody))
)]
pub async fn get_device_credentials(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<DeviceIdRequest>,
) -> Result<Json<DeviceCredentials>, AuthxError> {
    Ok(Json(state.authx.get_device_credentials(
        &request.organization_id,
        &request.device_group_id,
        &request.device_id,
    )?))
}

#[utoipa::path(
    post,
    path = "/authx/RemoveDeviceCredentials",
    request_body = DeviceIdRequest,
    tag = "Device",
    responses((status = 200, body = Success), (status = 404, body = ErrorBody))
)]
pub async fn remove_device_credentials(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<DeviceIdRequest>,
) -> Result<Json<Success>, AuthxError> {
    state.authx.remove_device_credentials(
        &request.organization_id,
        &request.device_group_id,
        &request.device_id,
    )?;
    Ok(Json(Success {}))
}

#[utoipa::path(
    post,
    path = "/authx/ListDeviceCredentials",
    request_body = DeviceGroupIdRequest,
    tag = "Device",
    responses((status = 200, body = DeviceList))
)]
pub async fn list_device_credentials(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<DeviceGroupIdRequest>,
) -> Result<Json<DeviceList>, AuthxError> {
    let devices = state
        .authx
        .list_device_credentials(&request.organization_id, &request.device_group_id)?;
    Ok(Json(DeviceList { devices }))
}

#[utoipa::path(
    post,
    path = "/authx/DeviceLogin",
    request_body = DeviceLoginRequest,
    tag = "Device",
    responses(
        (status = 200, body = TokenPair),
        (status = 401, body = ErrorBody),
        (status = 403, description = "Device or group is disabled", body = ErrorBody)
    )
)]
pub async fn device_login(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<DeviceLoginRequest>,
) -> Result<Json<TokenPair>, AuthxError> {
    Ok(Json(
        state
            .authx
            .device_login(&request.organization_id, &request.device_api_key)?,
    ))
}

#[utoipa::path(
    post,
    path = "/authx/RefreshDeviceToken",
    request_body = RefreshTokenRequest,
    tag = "Device",
    responses((status = 200, body = TokenPair), (status = 401, body = ErrorBody))
)]
pub async fn refresh_device_token(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<RefreshTokenRequest>,
) -> Result<Json<TokenPair>, AuthxError> {
    Ok(Json(
        state
            .authx
            .refresh_device_token(&request.token, &request.refresh_token)?,
    ))
}
