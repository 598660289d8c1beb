use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::Authorizer;
use crate::error::{AuthzError, Result};
use crate::store::ResourceStore;
use crate::types::{RequestParams, ResourceKind, SubmissionsFilter, UserId};

/// Admits the user if they own fewer than `max_count` resources of `kind`,
/// i.e. creating one more would not exceed the cap.
///
/// Only submissions carry a quota.
pub async fn within_limit(
    store: &dyn ResourceStore,
    user_id: UserId,
    kind: ResourceKind,
    max_count: usize,
) -> Result<bool> {
    match kind {
        ResourceKind::Submission => {
            let owned = store
                .search_submissions(SubmissionsFilter::by_submitter(user_id))
                .await?;

            if owned.len() >= max_count {
                debug!(
                    user_id = %user_id,
                    owned = owned.len(),
                    max_count,
                    "User is at the submission limit"
                );
                return Ok(false);
            }
            Ok(true)
        }
        ResourceKind::SubmissionBatch | ResourceKind::SubmissionFile => Err(
            AuthzError::InvalidResource(format!("no quota is defined for {}", kind)),
        ),
    }
}

pub struct WithinLimit {
    store: Arc<dyn ResourceStore>,
    kind: ResourceKind,
    max_count: usize,
}

impl WithinLimit {
    pub fn new(store: Arc<dyn ResourceStore>, kind: ResourceKind, max_count: usize) -> Self {
        Self {
            store,
            kind,
            max_count,
        }
    }
}

#[async_trait]
impl Authorizer for WithinLimit {
    fn name(&self) -> &'static str {
        "within_limit"
    }

    async fn evaluate(&self, _params: &RequestParams, user_id: UserId) -> Result<bool> {
        within_limit(self.store.as_ref(), user_id, self.kind, self.max_count).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockResourceStore;
    use crate::types::ResourceOwnership;
    use rstest::rstest;

    fn store_owning(count: usize) -> MockResourceStore {
        let mut store = MockResourceStore::new();
        store
            .expect_search_submissions()
            .withf(|filter| filter.submitter_id == Some(UserId(5)) && filter.submission_id.is_none())
            .returning(move |_| {
                Ok((0..count as i64)
                    .map(|id| ResourceOwnership {
                        id,
                        submitter_id: UserId(5),
                    })
                    .collect())
            });
        store
    }

    #[rstest]
    #[case(0, 3, true)]
    #[case(2, 3, true)]
    #[case(3, 3, false)]
    #[case(7, 3, false)]
    #[case(0, 1, true)]
    #[case(1, 1, false)]
    #[tokio::test]
    async fn test_within_limit(#[case] owned: usize, #[case] max: usize, #[case] expected: bool) {
        let store = store_owning(owned);
        let result = within_limit(&store, UserId(5), ResourceKind::Submission, max).await;
        assert_eq!(result.unwrap(), expected);
    }

    #[rstest]
    #[case(ResourceKind::SubmissionBatch)]
    #[case(ResourceKind::SubmissionFile)]
    #[tokio::test]
    async fn test_kind_without_quota_is_invalid_resource(#[case] kind: ResourceKind) {
        let mut store = MockResourceStore::new();
        store.expect_search_submissions().times(0);

        let result = within_limit(&store, UserId(5), kind, 10).await;
        assert!(matches!(result, Err(AuthzError::InvalidResource(_))));
    }

    #[tokio::test]
    async fn test_search_failure_propagates() {
        let mut store = MockResourceStore::new();
        store
            .expect_search_submissions()
            .returning(|_| Err(AuthzError::Lookup("disk I/O error".into())));

        let result = within_limit(&store, UserId(5), ResourceKind::Submission, 10).await;
        assert!(matches!(result, Err(AuthzError::Lookup(_))));
    }
}
