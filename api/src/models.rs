use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub users: DatabaseHealth,
    pub submissions: DatabaseHealth,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub message: String,
}

/// The authenticated caller and the roles they hold
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub user_id: i64,
    pub roles: Vec<String>,
}

/// Form accepted when creating a submission
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSubmissionForm {
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResponse {
    pub id: i64,
    pub submitter_id: i64,
    pub title: String,
}

impl From<database::Submission> for SubmissionResponse {
    fn from(s: database::Submission) -> Self {
        Self {
            id: s.id,
            submitter_id: s.submitter_id,
            title: s.title,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionFileResponse {
    pub id: i64,
    pub submission_id: i64,
    pub submitter_id: i64,
    pub filename: String,
}

impl From<database::SubmissionFile> for SubmissionFileResponse {
    fn from(f: database::SubmissionFile) -> Self {
        Self {
            id: f.id,
            submission_id: f.submission_id,
            submitter_id: f.submitter_id,
            filename: f.filename,
        }
    }
}

/// Review form posted against one or more submissions
///
/// Fields missing from the body are taken from the query string.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentForm {
    pub action: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Acknowledges an accepted review action
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    pub submission_ids: Vec<i64>,
    pub author_id: i64,
    pub action: String,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminResponse {
    pub user_id: i64,
    pub message: String,
}
