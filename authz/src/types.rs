//! Core value types shared by the resolver, the predicates and the stores.
//!
//! # Security Considerations
//!
//! - An [`Identity`] is only ever produced by the identity resolver from a
//!   session the store vouched for. Never build one from request data.
//! - Role labels are compared as exact, case-sensitive strings.
//! - Resource ids come from untrusted path parameters and are parsed strictly;
//!   anything that is not a base-10 `i64` is rejected as invalid input.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::error::{AuthzError, Result};

/// Path parameter carrying a single submission id.
pub const RESOURCE_KEY_SUBMISSION_ID: &str = "submission_id";
/// Path parameter carrying a comma-joined list of submission ids.
pub const RESOURCE_KEY_SUBMISSION_IDS: &str = "submission_ids";
/// Path parameter carrying a single submission file id.
pub const RESOURCE_KEY_FILE_ID: &str = "file_id";

/// Form field naming the operation the caller intends to perform.
pub const FORM_KEY_ACTION: &str = "action";

/// Numeric user identifier as stored by the session and user stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The authenticated actor for one request.
///
/// Inserted into the request extensions by the gate once the session has
/// been resolved, and dropped with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Identity {
    pub user_id: UserId,
}

impl Identity {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

/// A set of opaque role labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, role: impl Into<String>) -> bool {
        self.0.insert(role.into())
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// True when every role in `required` is also in `self`.
    pub fn is_superset(&self, required: &RoleSet) -> bool {
        self.0.is_superset(&required.0)
    }

    /// True when the two sets share at least one role.
    pub fn intersects(&self, other: &RoleSet) -> bool {
        !self.0.is_disjoint(&other.0)
    }

    /// Returns the union of `self` and `other`.
    pub fn union(&self, other: &RoleSet) -> RoleSet {
        RoleSet(self.0.union(&other.0).cloned().collect())
    }
}

impl<S: Into<String>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        RoleSet(iter.into_iter().map(Into::into).collect())
    }
}

/// The kinds of owned resources a route can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// One submission, id under [`RESOURCE_KEY_SUBMISSION_ID`].
    Submission,
    /// Several submissions, comma-joined ids under [`RESOURCE_KEY_SUBMISSION_IDS`].
    SubmissionBatch,
    /// One uploaded submission file, id under [`RESOURCE_KEY_FILE_ID`].
    SubmissionFile,
}

impl ResourceKind {
    /// The path parameter the resource id(s) arrive under.
    pub fn path_key(&self) -> &'static str {
        match self {
            ResourceKind::Submission => RESOURCE_KEY_SUBMISSION_ID,
            ResourceKind::SubmissionBatch => RESOURCE_KEY_SUBMISSION_IDS,
            ResourceKind::SubmissionFile => RESOURCE_KEY_FILE_ID,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Submission => "submission",
            ResourceKind::SubmissionBatch => "submission batch",
            ResourceKind::SubmissionFile => "submission file",
        })
    }
}

/// Ownership metadata for one resource, as returned by the resource store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOwnership {
    pub id: i64,
    pub submitter_id: UserId,
}

/// Filter for [`ResourceStore::search_submissions`](crate::store::ResourceStore::search_submissions).
///
/// Unset fields do not constrain the search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionsFilter {
    pub submission_id: Option<i64>,
    pub submitter_id: Option<UserId>,
}

impl SubmissionsFilter {
    pub fn by_id(submission_id: i64) -> Self {
        Self {
            submission_id: Some(submission_id),
            ..Self::default()
        }
    }

    pub fn by_submitter(submitter_id: UserId) -> Self {
        Self {
            submitter_id: Some(submitter_id),
            ..Self::default()
        }
    }
}

/// Request body as captured by the transport layer.
#[derive(Debug, Clone, Default)]
pub enum FormBody {
    /// No body was sent.
    #[default]
    Empty,
    /// The buffered body and its declared content type.
    Raw {
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
    /// The body could not be read (too large, connection error, ...).
    Unreadable(String),
}

/// The parameters a request declares: path variables, query string and body.
///
/// Path variables are available eagerly. The form is decoded lazily, only by
/// the predicates that need it, so a broken body does not affect routes whose
/// checks never look at it.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    path: HashMap<String, String>,
    query: Option<String>,
    body: FormBody,
}

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(key.into(), value.into());
        self
    }

    pub fn with_path_params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.path.extend(params);
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_body(mut self, body: FormBody) -> Self {
        self.body = body;
        self
    }

    /// Shorthand for an urlencoded form body.
    pub fn with_form(self, encoded: impl Into<Vec<u8>>) -> Self {
        self.with_body(FormBody::Raw {
            content_type: Some(FORM_URLENCODED.to_string()),
            bytes: encoded.into(),
        })
    }

    pub fn path_param(&self, key: &str) -> Option<&str> {
        self.path.get(key).map(String::as_str)
    }

    /// Looks up a submitted form value.
    ///
    /// Urlencoded body fields take precedence over query string fields. Bodies
    /// with any other content type are ignored. Fails if the body could not
    /// be read or either source is not valid urlencoded text.
    pub fn form_value(&self, key: &str) -> Result<Option<String>> {
        match &self.body {
            FormBody::Empty => {}
            FormBody::Unreadable(reason) => {
                return Err(AuthzError::FormDecode(format!("unreadable body: {}", reason)))
            }
            FormBody::Raw {
                content_type,
                bytes,
            } => {
                if is_form_urlencoded(content_type.as_deref()) {
                    let text = std::str::from_utf8(bytes).map_err(|e| {
                        AuthzError::FormDecode(format!("body is not valid UTF-8: {}", e))
                    })?;
                    if let Some(value) = lookup_urlencoded(text, key)? {
                        return Ok(Some(value));
                    }
                }
            }
        }

        match &self.query {
            Some(query) => lookup_urlencoded(query, key),
            None => Ok(None),
        }
    }
}

fn is_form_urlencoded(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case(FORM_URLENCODED))
        .unwrap_or(false)
}

/// Returns the first value for `key` in urlencoded `text`.
fn lookup_urlencoded(text: &str, key: &str) -> Result<Option<String>> {
    validate_percent_escapes(text)?;
    Ok(url::form_urlencoded::parse(text.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned()))
}

/// `form_urlencoded::parse` is lossy; reject broken escapes like `%zz` instead
/// of silently passing them through.
fn validate_percent_escapes(text: &str) -> Result<()> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(AuthzError::FormDecode(format!(
                    "invalid percent escape at byte {}",
                    i
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(labels: &[&str]) -> RoleSet {
        labels.iter().copied().collect()
    }

    #[test]
    fn test_role_set_superset() {
        let user = roles(&["Curator", "Tester"]);
        assert!(user.is_superset(&roles(&["Curator"])));
        assert!(user.is_superset(&RoleSet::new()));
        assert!(!user.is_superset(&roles(&["Curator", "Administrator"])));
    }

    #[test]
    fn test_role_set_is_case_sensitive() {
        let user = roles(&["curator"]);
        assert!(!user.contains("Curator"));
        assert!(!user.intersects(&roles(&["Curator"])));
    }

    #[test]
    fn test_role_set_deduplicates() {
        let set = roles(&["Tester", "Tester"]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_resource_kind_path_keys() {
        assert_eq!(ResourceKind::Submission.path_key(), "submission_id");
        assert_eq!(ResourceKind::SubmissionBatch.path_key(), "submission_ids");
        assert_eq!(ResourceKind::SubmissionFile.path_key(), "file_id");
    }

    #[test]
    fn test_form_value_from_body() {
        let params = RequestParams::new().with_form("action=mark-added&message=hi%20there");
        assert_eq!(
            params.form_value("action").unwrap().as_deref(),
            Some("mark-added")
        );
        assert_eq!(
            params.form_value("message").unwrap().as_deref(),
            Some("hi there")
        );
        assert_eq!(params.form_value("missing").unwrap(), None);
    }

    #[test]
    fn test_form_body_takes_precedence_over_query() {
        let params = RequestParams::new()
            .with_query("action=approve")
            .with_form("action=comment");
        assert_eq!(params.form_value("action").unwrap().as_deref(), Some("comment"));

        let params = RequestParams::new().with_query("action=approve");
        assert_eq!(params.form_value("action").unwrap().as_deref(), Some("approve"));
    }

    #[test]
    fn test_non_form_body_is_ignored() {
        let params = RequestParams::new().with_body(FormBody::Raw {
            content_type: Some("application/json".into()),
            bytes: br#"{"action":"approve"}"#.to_vec(),
        });
        assert_eq!(params.form_value("action").unwrap(), None);
    }

    #[test]
    fn test_content_type_parameters_are_accepted() {
        let params = RequestParams::new().with_body(FormBody::Raw {
            content_type: Some("application/x-www-form-urlencoded; charset=utf-8".into()),
            bytes: b"action=reject".to_vec(),
        });
        assert_eq!(params.form_value("action").unwrap().as_deref(), Some("reject"));
    }

    #[test]
    fn test_form_decode_failures() {
        let bad_escape = RequestParams::new().with_form("action=%zz");
        assert!(matches!(
            bad_escape.form_value("action"),
            Err(AuthzError::FormDecode(_))
        ));

        let bad_utf8 = RequestParams::new().with_form(vec![b'a', b'=', 0xff, 0xfe]);
        assert!(matches!(
            bad_utf8.form_value("a"),
            Err(AuthzError::FormDecode(_))
        ));

        let unreadable =
            RequestParams::new().with_body(FormBody::Unreadable("length limit exceeded".into()));
        assert!(matches!(
            unreadable.form_value("action"),
            Err(AuthzError::FormDecode(_))
        ));
    }

    #[test]
    fn test_path_params() {
        let params = RequestParams::new().with_path_param(RESOURCE_KEY_SUBMISSION_ID, "42");
        assert_eq!(params.path_param("submission_id"), Some("42"));
        assert_eq!(params.path_param("file_id"), None);
    }
}
