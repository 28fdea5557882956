// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use super::RpcJson;
use crate::{
    error::{AuthxError, ErrorBody},
    models::{
        AddBasicCredentialsRequest, ChangePasswordRequest, LoginRequest, RefreshTokenRequest,
        Success, UsernameRequest,
    },
    state::AppState,
    token::TokenPair,
};

#[utoipa::path(
    post,
    path = "/authx/AddBasicCredentials",
    request_body = AddBasicCredentialsRequest,
    tag = "User",
    responses(
        (status = 200, body = Success),
        (status = 400, body = ErrorBody),
        (status = 404, description = "Role does not exist", body = ErrorBody),
        (status = 409, body = ErrorBody)
    )
)]
pub async fn add_basic_credentials(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<AddBasicCredentialsRequest>,
) -> Result<Json<Success>, AuthxError> {
    state
        .authx
        .add_basic_credentials(
            &request.username,
            &request.organization_id,
            &request.role_id,
            &request.password,
        )
        .await?;
    Ok(Json(Success {}))
}

#[utoipa::path(
    post,
    path = "/authx/ChangePassword",
    request_body = ChangePasswordRequest,
    tag = "User",
    responses(
        (status = 200, body = Success),
        (status = 401, description = "Current password is wrong", body = ErrorBody)
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<ChangePasswordRequest>,
) -> Result<Json<Success>, AuthxError> {
    state
        .authx
        .change_password(&request.username, &request.password, &request.new_password)
        .await?;
    Ok(Json(Success {}))
}

#[utoipa::path(
    post,
    path = "/authx/DeleteCredentials",
    request_body = UsernameRequest,
    tag = "User",
    responses((status = 200, body = Success), (status = 404, body = ErrorBody))
)]
pub async fn delete_credentials(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<UsernameRequest>,
) -> Result<Json<Success>, AuthxError> {
    state.authx.delete_credentials(&request.username)?;
    Ok(Json(Success {}))
}

#[utoipa::path(
    post,
    path = "/authx/LoginWithBasicCredentials",
    request_body = LoginRequest,
    tag = "User",
    responses((status = 200, body = TokenPair), (status = 401, body = ErrorBody))
)]
pub async fn login_with_basic_credentials(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<LoginRequest>,
) -> Result<Json<TokenPair>, AuthxError> {
    let pair = state
        .authx
        .login_with_basic_credentials(&request.username, &request.password)
        .await?;
    Ok(Json(pair))
}

#[utoipa::path(
    post,
    path = "/authx/RefreshToken",
    request_body = RefreshTokenRequest,
    tag = "User",
    responses((status = 200, body = TokenPair), (status = 401, body = ErrorBody))
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<RefreshTokenRequest>,
) -> Result<Json<TokenPair>, AuthxError> {
    Ok(Json(
        state
            .authx
            .refresh_token(&request.token, &request.refresh_token)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::state;
    use crate::storage::Role;
    use crate::auth::Primitive;

    fn seed(state: &AppState) {
        state
            .authx
            .add_role(Role {
                organization_id: "org1".into(),
                role_id: "role1".into(),
                name: "owner".into(),
                internal: false,
                primitives: vec![Primitive::Org],
            })
            .unwrap();
    }

    #[tokio::test]
    async fn handlers_drive_the_core() {
        let state = state();
        seed(&state);

        add_basic_credentials(
            State(state.clone()),
            RpcJson(AddBasicCredentialsRequest {
                username: "alice".into(),
                organization_id: "org1".into(),
                role_id: "role1".into(),
                password: "MyLittlePassword".into(),
            }),
        )
        .await
        .unwrap();

        let Json(pair) = login_with_basic_credentials(
            State(state.clone()),
            RpcJson(LoginRequest {
                username: "alice".into(),
                password: "MyLittlePassword".into(),
            }),
        )
        .await
        .unwrap();

        change_password(
            State(state.clone()),
            RpcJson(ChangePasswordRequest {
                username: "alice".into(),
                password: "MyLittlePassword".into(),
                new_password: "AnotherPassword".into(),
            }),
        )
        .await
        .unwrap();

        let Json(second) = refresh_token(
            State(state.clone()),
            RpcJson(RefreshTokenRequest {
                token: pair.token.clone(),
                refresh_token: pair.refresh_token.clone(),
            }),
        )
        .await
        .unwrap();
        assert_ne!(second, pair);

        delete_credentials(
            State(state.clone()),
            RpcJson(UsernameRequest {
                username: "alice".into(),
            }),
        )
        .await
        .unwrap();
        let err = delete_credentials(
            State(state),
            RpcJson(UsernameRequest {
                username: "alice".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthxError::NotFound(_)));
    }
}
