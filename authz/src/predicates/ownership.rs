use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::Authorizer;
use crate::error::{AuthzError, Result};
use crate::store::ResourceStore;
use crate::types::{RequestParams, ResourceKind, SubmissionsFilter, UserId};

/// Admits the user only if they own the resource(s) named in the path.
///
/// For a batch, every id is parsed before anything is looked up, then each id
/// is checked in list order. The first id that is not owned denies the whole
/// request; an id that does not exist is an error instead.
pub async fn owns_resource(
    store: &dyn ResourceStore,
    params: &RequestParams,
    user_id: UserId,
    kind: ResourceKind,
) -> Result<bool> {
    match kind {
        ResourceKind::Submission => {
            let sid = parse_id(path_value(params, kind)?, kind)?;
            submission_owned_by(store, sid, user_id).await
        }
        ResourceKind::SubmissionBatch => {
            let sids = path_value(params, kind)?
                .split(',')
                .map(|raw| parse_id(raw, kind))
                .collect::<Result<Vec<_>>>()?;

            // TODO batch these lookups once the store supports an id list filter
            for sid in sids {
                if !submission_owned_by(store, sid, user_id).await? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        ResourceKind::SubmissionFile => {
            let fid = parse_id(path_value(params, kind)?, kind)?;
            let files = store.get_submission_files(vec![fid]).await?;
            let file = files
                .iter()
                .find(|f| f.id == fid)
                .ok_or_else(|| AuthzError::NotFound(format!("submission file with id {}", fid)))?;

            Ok(is_owner(file.submitter_id, user_id, kind, fid))
        }
    }
}

async fn submission_owned_by(store: &dyn ResourceStore, sid: i64, user_id: UserId) -> Result<bool> {
    let submissions = store.search_submissions(SubmissionsFilter::by_id(sid)).await?;
    let submission = submissions
        .first()
        .ok_or_else(|| AuthzError::NotFound(format!("submission with id {}", sid)))?;

    Ok(is_owner(
        submission.submitter_id,
        user_id,
        ResourceKind::Submission,
        sid,
    ))
}

fn is_owner(owner: UserId, user_id: UserId, kind: ResourceKind, id: i64) -> bool {
    if owner != user_id {
        debug!(user_id = %user_id, owner = %owner, "User does not own {} {}", kind, id);
        return false;
    }
    true
}

fn path_value(params: &RequestParams, kind: ResourceKind) -> Result<&str> {
    params.path_param(kind.path_key()).ok_or_else(|| {
        AuthzError::InvalidInput(format!("missing path parameter '{}'", kind.path_key()))
    })
}

fn parse_id(raw: &str, kind: ResourceKind) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| AuthzError::InvalidInput(format!("invalid {} id '{}'", kind, raw)))
}

pub struct OwnsResource {
    store: Arc<dyn ResourceStore>,
    kind: ResourceKind,
}

impl OwnsResource {
    pub fn new(store: Arc<dyn ResourceStore>, kind: ResourceKind) -> Self {
        Self { store, kind }
    }
}

#[async_trait]
impl Authorizer for OwnsResource {
    fn name(&self) -> &'static str {
        "owns_resource"
    }

    async fn evaluate(&self, params: &RequestParams, user_id: UserId) -> Result<bool> {
        owns_resource(self.store.as_ref(), params, user_id, self.kind).await
    }
}
