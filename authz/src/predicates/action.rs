use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::Authorizer;
use crate::error::Result;
use crate::roles::ActionTable;
use crate::store::RoleStore;
use crate::types::{RequestParams, UserId, FORM_KEY_ACTION};

/// Admits the user if the action they submitted is granted to them by `table`.
///
/// The form is decoded first and a broken form is an error. A missing or
/// unknown action is just not granted.
pub async fn can_perform_action(
    store: &dyn RoleStore,
    table: &ActionTable,
    params: &RequestParams,
    user_id: UserId,
) -> Result<bool> {
    let action = params.form_value(FORM_KEY_ACTION)?.unwrap_or_default();
    let user_roles = store.get_user_roles(user_id).await?;

    let ok = table.permits(&action, &user_roles);
    if !ok {
        debug!(user_id = %user_id, action = %action, "Action not granted to user");
    }
    Ok(ok)
}

pub struct CanPerformAction {
    store: Arc<dyn RoleStore>,
    table: Arc<ActionTable>,
}

impl CanPerformAction {
    pub fn new(store: Arc<dyn RoleStore>, table: Arc<ActionTable>) -> Self {
        Self { store, table }
    }
}

#[async_trait]
impl Authorizer for CanPerformAction {
    fn name(&self) -> &'static str {
        "can_perform_action"
    }

    fn reads_form(&self) -> bool {
        true
    }

    async fn evaluate(&self, params: &RequestParams, user_id: UserId) -> Result<bool> {
        can_perform_action(self.store.as_ref(), &self.table, params, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthzError;
    use crate::roles::{ROLE_ARCHIVIST, ROLE_CURATOR, ROLE_TRIAL_CURATOR};
    use crate::store::MockRoleStore;
    use crate::types::{FormBody, RoleSet};
    use rstest::rstest;

    fn store_with(labels: &'static [&'static str]) -> MockRoleStore {
        let mut store = MockRoleStore::new();
        store
            .expect_get_user_roles()
            .returning(move |_| Ok(labels.iter().copied().collect::<RoleSet>()));
        store
    }

    async fn check(user: &'static [&'static str], form: &str) -> Result<bool> {
        let store = store_with(user);
        let params = RequestParams::new().with_form(form.to_string());
        can_perform_action(&store, &ActionTable::default(), &params, UserId(3)).await
    }

    #[rstest]
    #[case(&[], "action=comment", true)]
    #[case(&[ROLE_CURATOR], "action=comment", true)]
    #[case(&[], "action=approve", false)]
    #[case(&[ROLE_CURATOR], "action=approve", true)]
    #[case(&[ROLE_ARCHIVIST], "action=mark-added", true)]
    #[case(&[ROLE_CURATOR], "action=mark-added", false)]
    #[case(&[ROLE_TRIAL_CURATOR], "action=assign", true)]
    #[case(&[ROLE_TRIAL_CURATOR], "action=request-changes", false)]
    #[case(&[ROLE_CURATOR], "action=launch-rockets", false)]
    #[case(&[ROLE_CURATOR], "message=hello", false)]
    #[case(&[ROLE_CURATOR], "action=", false)]
    #[tokio::test]
    async fn test_action_rules(
        #[case] user: &'static [&'static str],
        #[case] form: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(check(user, form).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_form_decode_failure_is_error() {
        let mut store = MockRoleStore::new();
        store.expect_get_user_roles().times(0);

        let params = RequestParams::new().with_body(FormBody::Unreadable("stream reset".into()));
        let result =
            can_perform_action(&store, &ActionTable::default(), &params, UserId(3)).await;
        assert!(matches!(result, Err(AuthzError::FormDecode(_))));
    }

    #[tokio::test]
    async fn test_role_lookup_failure_is_error_even_for_comment() {
        let mut store = MockRoleStore::new();
        store
            .expect_get_user_roles()
            .returning(|_| Err(AuthzError::Lookup("no connection".into())));

        let params = RequestParams::new().with_form("action=comment");
        let result =
            can_perform_action(&store, &ActionTable::default(), &params, UserId(3)).await;
        assert!(matches!(result, Err(AuthzError::Lookup(_))));
    }
}
