use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bookshelf_core::models::{NewUser, UserProfileUpdate, UserResponse};
use bookshelf_core::{AppError, AssetKind, AssetReference};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::utils::multipart::read_upload_form;

const ALL_FIELDS_REQUIRED: &str = "All fields are required";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[utoipa::path(
    post,
    path = "/api/users/register",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = AccessTokenResponse),
        (status = 400, description = "Missing fields or email already registered", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, body), fields(operation = "register_user"))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    body.validate()
        .map_err(|_| AppError::BadRequest(ALL_FIELDS_REQUIRED.to_string()))?;

    if state.users.find_by_email(&body.email).await?.is_some() {
        return Err(AppError::BadRequest("User already exists with this email.".to_string()).into());
    }

    let password_hash = hash_password(&body.password)?;
    let user = state
        .users
        .create(NewUser::new(body.name, body.email, password_hash))
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    let access_token = state.jwt.issue(user.id)?;
    Ok((StatusCode::CREATED, Json(AccessTokenResponse { access_token })))
}

#[utoipa::path(
    post,
    path = "/api/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AccessTokenResponse),
        (status = 400, description = "Missing fields or wrong password", body = ErrorResponse),
        (status = 404, description = "Unknown email", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, body), fields(operation = "login_user"))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<Json<AccessTokenResponse>, HttpAppError> {
    body.validate()
        .map_err(|_| AppError::BadRequest(ALL_FIELDS_REQUIRED.to_string()))?;

    let user = state
        .users
        .find_by_email(&body.email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    if !verify_password(&body.password, &user.password_hash)? {
        return Err(AppError::BadRequest("Username or password incorrect!".to_string()).into());
    }

    let access_token = state.jwt.issue(user.id)?;
    Ok(Json(AccessTokenResponse { access_token }))
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %auth.user_id))]
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, HttpAppError> {
    let user = state
        .users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

#[utoipa::path(
    patch,
    path = "/api/users",
    tag = "users",
    request_body = UserProfileUpdate,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "No updatable field supplied", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, update), fields(user_id = %auth.user_id))]
pub async fn update_current_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(update): ValidatedJson<UserProfileUpdate>,
) -> Result<Json<UserResponse>, HttpAppError> {
    if update.is_empty() {
        return Err(AppError::BadRequest("No valid fields to update".to_string()).into());
    }

    let user = state
        .users
        .update_profile(auth.user_id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/api/users/profile-photo",
    tag = "users",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Profile photo replaced", body = UserResponse),
        (status = 400, description = "Missing or rejected file", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Remote store failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, multipart), fields(user_id = %auth.user_id))]
pub async fn update_profile_photo(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<UserResponse>, HttpAppError> {
    let user_id = auth.user_id;
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut form =
        read_upload_form(multipart, &state.staging, &[AssetKind::ProfilePhoto], &[]).await?;
    let staged = form
        .take_file(AssetKind::ProfilePhoto)
        .ok_or_else(|| AppError::BadRequest("Profile photo is required".to_string()))?;

    let previous = user.profile_photo.and_then(|url| {
        AssetReference::new(url, AssetKind::ProfilePhoto)
            .map_err(|e| {
                tracing::warn!(user_id = %user_id, error = %e, "Skipping malformed profile photo reference");
            })
            .ok()
    });

    let users = state.users.clone();
    let updated = state
        .uploads
        .replace(previous, staged, user_id, move |reference| async move {
            users
                .set_profile_photo(user_id, reference.remote_url())
                .await?
                .ok_or_else(|| AppError::NotFound("User not found".to_string()))
        })
        .await?;

    Ok(Json(updated.into()))
}
