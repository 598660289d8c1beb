//! Role labels, action labels and the action → role table.

use serde::{Deserialize, Serialize};

use crate::types::RoleSet;

pub const ROLE_ADMINISTRATOR: &str = "Administrator";
pub const ROLE_MODERATOR: &str = "Moderator";
pub const ROLE_CURATOR: &str = "Curator";
pub const ROLE_TESTER: &str = "Tester";
pub const ROLE_MECHANIC: &str = "Mechanic";
pub const ROLE_HUNTER: &str = "Hunter";
pub const ROLE_HACKER: &str = "Hacker";
pub const ROLE_ARCHIVIST: &str = "Archivist";
pub const ROLE_TRIAL_CURATOR: &str = "Trial Curator";

pub const ACTION_COMMENT: &str = "comment";
pub const ACTION_APPROVE: &str = "approve";
pub const ACTION_REQUEST_CHANGES: &str = "request-changes";
pub const ACTION_ACCEPT: &str = "accept";
pub const ACTION_MARK_ADDED: &str = "mark-added";
pub const ACTION_REJECT: &str = "reject";
pub const ACTION_ASSIGN: &str = "assign";
pub const ACTION_UNASSIGN: &str = "unassign";

/// Named groups of roles referenced by routes and by the action table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleGroups {
    /// May approve, reject, accept or request changes on a submission.
    pub deciders: RoleSet,
    /// May mark a submission as added to the archive.
    pub adders: RoleSet,
    pub trial_curators: RoleSet,
    /// Anyone considered staff, e.g. for uploading on behalf of others.
    pub staff: RoleSet,
    /// Required, all of them, for the administration pages.
    pub administrators: RoleSet,
}

impl Default for RoleGroups {
    fn default() -> Self {
        let deciders: RoleSet = [
            ROLE_ADMINISTRATOR,
            ROLE_MODERATOR,
            ROLE_CURATOR,
            ROLE_TESTER,
            ROLE_MECHANIC,
            ROLE_HUNTER,
            ROLE_HACKER,
        ]
        .into_iter()
        .collect();
        let adders: RoleSet = [ROLE_ADMINISTRATOR, ROLE_ARCHIVIST].into_iter().collect();
        let trial_curators: RoleSet = [ROLE_TRIAL_CURATOR].into_iter().collect();
        let staff = deciders.union(&adders).union(&trial_curators);

        Self {
            deciders,
            adders,
            trial_curators,
            staff,
            administrators: [ROLE_ADMINISTRATOR].into_iter().collect(),
        }
    }
}

/// Who an action rule grants the action to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// Every authenticated user, no role check at all.
    Anyone,
    /// Users holding at least one of these roles.
    AnyRoleOf(RoleSet),
}

/// One row of the action table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRule {
    pub actions: Vec<String>,
    pub grant: Grant,
}

impl ActionRule {
    fn new(actions: &[&str], grant: Grant) -> Self {
        Self {
            actions: actions.iter().map(|a| a.to_string()).collect(),
            grant,
        }
    }

    fn covers(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }

    fn grants(&self, user_roles: &RoleSet) -> bool {
        match &self.grant {
            Grant::Anyone => true,
            Grant::AnyRoleOf(roles) => user_roles.intersects(roles),
        }
    }
}

/// Maps submitted action labels to the roles allowed to perform them.
///
/// Built once at startup from [`RoleGroups`] and never mutated afterwards.
/// An action may appear in several rules; it is permitted if any of them
/// grants it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTable {
    rules: Vec<ActionRule>,
}

impl ActionTable {
    pub fn new(rules: Vec<ActionRule>) -> Self {
        Self { rules }
    }

    /// The standard review workflow table.
    ///
    /// Commenting is open to everyone. Assigning is open to the union of
    /// deciders, adders and trial curators.
    pub fn from_groups(groups: &RoleGroups) -> Self {
        let assigners = groups
            .deciders
            .union(&groups.adders)
            .union(&groups.trial_curators);

        Self::new(vec![
            ActionRule::new(&[ACTION_COMMENT], Grant::Anyone),
            ActionRule::new(&[ACTION_MARK_ADDED], Grant::AnyRoleOf(groups.adders.clone())),
            ActionRule::new(
                &[
                    ACTION_APPROVE,
                    ACTION_REJECT,
                    ACTION_REQUEST_CHANGES,
                    ACTION_ACCEPT,
                ],
                Grant::AnyRoleOf(groups.deciders.clone()),
            ),
            ActionRule::new(&[ACTION_ASSIGN, ACTION_UNASSIGN], Grant::AnyRoleOf(assigners)),
        ])
    }

    /// True if some rule covering `action` grants it to a holder of `user_roles`.
    ///
    /// Unknown actions are simply not permitted.
    pub fn permits(&self, action: &str, user_roles: &RoleSet) -> bool {
        self.rules
            .iter()
            .filter(|rule| rule.covers(action))
            .any(|rule| rule.grants(user_roles))
    }
}

impl Default for ActionTable {
    fn default() -> Self {
        Self::from_groups(&RoleGroups::default())
    }
}
