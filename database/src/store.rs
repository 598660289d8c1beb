//! Engine-facing ownership lookups backed by [`Database`].

use async_trait::async_trait;
use tracing::error;

use authz::store::ResourceStore;
use authz::types::{ResourceOwnership, SubmissionsFilter};

use crate::Database;

#[async_trait]
impl ResourceStore for Database {
    async fn search_submissions(
        &self,
        filter: SubmissionsFilter,
    ) -> authz::Result<Vec<ResourceOwnership>> {
        let submissions = Database::search_submissions(self, filter).await.map_err(|e| {
            error!(?filter, "Submission search failed: {}", e);
            authz::AuthzError::from(e)
        })?;

        Ok(submissions.iter().map(ResourceOwnership::from).collect())
    }

    async fn get_submission_files(&self, ids: Vec<i64>) -> authz::Result<Vec<ResourceOwnership>> {
        let files = Database::get_submission_files(self, &ids).await.map_err(|e| {
            error!(?ids, "Submission file lookup failed: {}", e);
            authz::AuthzError::from(e)
        })?;

        Ok(files.iter().map(ResourceOwnership::from).collect())
    }
}
