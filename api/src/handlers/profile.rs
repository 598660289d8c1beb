use axum::{extract::State, Json};

use crate::{
    error::ApiResult,
    models::ProfileResponse,
    protect::CurrentUser,
    AppState,
};

/// The caller's own profile
///
/// GET /api/v1/profile
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "Authenticated user", body = ProfileResponse),
        (status = 401, description = "Not logged in", body = crate::error::ApiErrorResponse),
    ),
    tag = "users"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<ProfileResponse>> {
    let roles = state.users.get_user_roles(user_id).await?;

    Ok(Json(ProfileResponse {
        user_id: user_id.0,
        roles: roles.iter().map(str::to_string).collect(),
    }))
}
