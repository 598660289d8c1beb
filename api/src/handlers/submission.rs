use axum::{
    extract::{Path, State},
    http::StatusCode,
    Form, Json,
};
use tracing::info;

use authz::types::FORM_KEY_ACTION;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        CommentForm, CommentResponse, CreateSubmissionForm, SubmissionFileResponse,
        SubmissionResponse,
    },
    protect::{CurrentUser, GateParams},
    AppState,
};

/// The review form as the gate saw it.
fn comment_form(gate: &GateParams) -> ApiResult<CommentForm> {
    let action = gate
        .form_value(FORM_KEY_ACTION)?
        .ok_or_else(|| ApiError::BadRequest("missing action".to_string()))?;
    Ok(CommentForm {
        action,
        message: gate.form_value("message")?,
    })
}

/// Create a submission owned by the caller
///
/// POST /api/v1/submissions
#[utoipa::path(
    post,
    path = "/api/v1/submissions",
    request_body(content = CreateSubmissionForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Submission created", body = SubmissionResponse),
        (status = 400, description = "Invalid form", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Not allowed to submit, or over the limit", body = crate::error::ApiErrorResponse),
    ),
    tag = "submissions"
)]
pub async fn create_submission(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Form(form): Form<CreateSubmissionForm>,
) -> ApiResult<(StatusCode, Json<SubmissionResponse>)> {
    let id = state.db.create_submission(user_id, &form.title).await?;
    let submission = state
        .db
        .get_submission(id)
        .await?
        .ok_or_else(|| ApiError::InternalError(format!("submission {} vanished", id)))?;

    Ok((StatusCode::CREATED, Json(submission.into())))
}

/// Read one of the caller's submissions
///
/// GET /api/v1/submissions/{submission_id}
#[utoipa::path(
    get,
    path = "/api/v1/submissions/{submission_id}",
    params(
        ("submission_id" = i64, Path, description = "Submission id")
    ),
    responses(
        (status = 200, description = "Submission found", body = SubmissionResponse),
        (status = 400, description = "Invalid submission id", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Not the submitter, or no such submission", body = crate::error::ApiErrorResponse),
    ),
    tag = "submissions"
)]
pub async fn get_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<i64>,
) -> ApiResult<Json<SubmissionResponse>> {
    let submission = state
        .db
        .get_submission(submission_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("submission with id {}", submission_id)))?;

    Ok(Json(submission.into()))
}

/// Post a review action on a submission
///
/// POST /api/v1/submissions/{submission_id}/comment
#[utoipa::path(
    post,
    path = "/api/v1/submissions/{submission_id}/comment",
    params(
        ("submission_id" = i64, Path, description = "Submission id")
    ),
    request_body(content = CommentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Action accepted", body = CommentResponse),
        (status = 401, description = "Action not granted to the caller", body = crate::error::ApiErrorResponse),
        (status = 404, description = "No such submission", body = crate::error::ApiErrorResponse),
    ),
    tag = "submissions"
)]
pub async fn comment_submission(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(submission_id): Path<i64>,
    gate: GateParams,
) -> ApiResult<Json<CommentResponse>> {
    let form = comment_form(&gate)?;
    if state.db.get_submission(submission_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "submission with id {}",
            submission_id
        )));
    }

    info!(user_id = %user_id, submission_id, action = %form.action, "Review action accepted");

    Ok(Json(CommentResponse {
        submission_ids: vec![submission_id],
        author_id: user_id.0,
        action: form.action,
        message: form.message,
    }))
}

/// Post one review action on several of the caller's submissions
///
/// POST /api/v1/submission-batch/{submission_ids}/comment
#[utoipa::path(
    post,
    path = "/api/v1/submission-batch/{submission_ids}/comment",
    params(
        ("submission_ids" = String, Path, description = "Comma separated submission ids")
    ),
    request_body(content = CommentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Action accepted", body = CommentResponse),
        (status = 400, description = "Invalid submission id in the list", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Caller does not own every submission, or lacks the action", body = crate::error::ApiErrorResponse),
    ),
    tag = "submissions"
)]
pub async fn comment_submission_batch(
    CurrentUser(user_id): CurrentUser,
    Path(submission_ids): Path<String>,
    gate: GateParams,
) -> ApiResult<Json<CommentResponse>> {
    let form = comment_form(&gate)?;
    let ids = submission_ids
        .split(',')
        .map(|raw| {
            raw.parse::<i64>()
                .map_err(|_| ApiError::BadRequest(format!("invalid submission id '{}'", raw)))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    info!(user_id = %user_id, count = ids.len(), action = %form.action, "Batch review action accepted");

    Ok(Json(CommentResponse {
        submission_ids: ids,
        author_id: user_id.0,
        action: form.action,
        message: form.message,
    }))
}

/// Read metadata of a file from one of the caller's submissions
///
/// GET /api/v1/files/{file_id}
#[utoipa::path(
    get,
    path = "/api/v1/files/{file_id}",
    params(
        ("file_id" = i64, Path, description = "Submission file id")
    ),
    responses(
        (status = 200, description = "File found", body = SubmissionFileResponse),
        (status = 400, description = "Invalid file id", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Not the submitter, or no such file", body = crate::error::ApiErrorResponse),
    ),
    tag = "submissions"
)]
pub async fn get_submission_file(
    State(state): State<AppState>,
    Path(file_id): Path<i64>,
) -> ApiResult<Json<SubmissionFileResponse>> {
    let file = state
        .db
        .get_submission_files(&[file_id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound(format!("submission file with id {}", file_id)))?;

    Ok(Json(file.into()))
}
