use axum::Json;
use tracing::info;

use crate::{models::AdminResponse, protect::CurrentUser};

/// Administrators only
///
/// GET /api/v1/admin
#[utoipa::path(
    get,
    path = "/api/v1/admin",
    responses(
        (status = 200, description = "Caller holds every administrator role", body = AdminResponse),
        (status = 401, description = "Not logged in or not an administrator", body = crate::error::ApiErrorResponse),
    ),
    tag = "admin"
)]
pub async fn admin_dashboard(CurrentUser(user_id): CurrentUser) -> Json<AdminResponse> {
    info!(user_id = %user_id, "Admin dashboard opened");

    Json(AdminResponse {
        user_id: user_id.0,
        message: "welcome, administrator".to_string(),
    })
}
