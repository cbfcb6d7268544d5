use std::sync::Arc;

use axum::{extract::State, Json};
use bookshelf_core::AppError;
use bookshelf_services::DescriptionPolisher;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct FixGrammarRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FixGrammarResponse {
    pub original: String,
    pub corrected: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ImproveDescriptionRequest {
    #[serde(default)]
    pub text: String,
    /// Free-form instruction, e.g. "make it shorter"
    pub instruction: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImproveDescriptionResponse {
    pub original: String,
    pub improved: String,
}

fn polisher(state: &AppState) -> Result<&DescriptionPolisher, AppError> {
    state.polisher.as_ref().ok_or_else(|| {
        AppError::TextGeneration(
            "Text generation is not configured (NLP_CLOUD_API_KEY is not set)".to_string(),
        )
    })
}

#[utoipa::path(
    post,
    path = "/api/books/fix-grammar",
    tag = "text",
    request_body = FixGrammarRequest,
    responses(
        (status = 200, description = "Corrected text", body = FixGrammarResponse),
        (status = 400, description = "Empty text", body = ErrorResponse),
        (status = 500, description = "Text generation failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, body), fields(user_id = %auth.user_id))]
pub async fn fix_grammar(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<FixGrammarRequest>,
) -> Result<Json<FixGrammarResponse>, HttpAppError> {
    let corrected = polisher(&state)?.fix_grammar(&body.text).await?;

    Ok(Json(FixGrammarResponse {
        original: body.text,
        corrected,
    }))
}

#[utoipa::path(
    post,
    path = "/api/books/improve-description",
    tag = "text",
    request_body = ImproveDescriptionRequest,
    responses(
        (status = 200, description = "Improved description", body = ImproveDescriptionResponse),
        (status = 400, description = "Empty text", body = ErrorResponse),
        (status = 500, description = "Text generation failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, body), fields(user_id = %auth.user_id))]
pub async fn improve_description(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<ImproveDescriptionRequest>,
) -> Result<Json<ImproveDescriptionResponse>, HttpAppError> {
    let improved = polisher(&state)?
        .improve(&body.text, body.instruction.as_deref())
        .await?;

    Ok(Json(ImproveDescriptionResponse {
        original: body.text,
        improved,
    }))
}
