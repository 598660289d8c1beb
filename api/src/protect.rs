//! Route gate.
//!
//! [`ProtectLayer`] wraps a route's handler with a fixed, ordered list of
//! checks. For every request it pulls the session secret from the cookie,
//! gathers the path parameters, query string and (when a check needs it) the
//! form body, and asks the [`AuthzEngine`] for a verdict. Admitted requests
//! reach the handler with the caller's [`Identity`] and the decoded
//! [`RequestParams`] in the extensions; denied ones are answered here and the
//! handler never runs.

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, RawPathParams},
    http::{header, request::Parts, Request},
    response::{IntoResponse, Response},
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::debug;

use authz::types::FormBody;
use authz::{AuthzEngine, Decision, Identity, RequestParams, SharedAuthorizer, UserId};

use crate::credential::SessionCookie;
use crate::error::ApiError;

/// Default cap on a buffered form body.
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024;

#[derive(Clone)]
pub struct ProtectLayer {
    engine: AuthzEngine,
    predicates: Arc<[SharedAuthorizer]>,
    cookie: SessionCookie,
    body_limit: usize,
}

impl ProtectLayer {
    /// An empty `predicates` list admits any authenticated caller.
    pub fn new(engine: AuthzEngine, predicates: Vec<SharedAuthorizer>) -> Self {
        Self {
            engine,
            predicates: predicates.into(),
            cookie: SessionCookie::default(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_cookie(mut self, cookie: SessionCookie) -> Self {
        self.cookie = cookie;
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    fn reads_form(&self) -> bool {
        self.predicates.iter().any(|p| p.reads_form())
    }
}

impl<S> Layer<S> for ProtectLayer {
    type Service = Protect<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Protect {
            inner,
            gate: self.clone(),
        }
    }
}

#[derive(Clone)]
pub struct Protect<S> {
    inner: S,
    gate: ProtectLayer,
}

impl<S> Service<Request<Body>> for Protect<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let gate = self.gate.clone();
        // Keep the service that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();

            let secret = match gate.cookie.secret_from_headers(&parts.headers) {
                Ok(secret) => secret,
                Err(e) => return Ok(e.into_response()),
            };

            let (params, body) = collect_params(&gate, &mut parts, body).await;

            let decision = gate
                .engine
                .authorize(secret.as_deref(), &params, &gate.predicates)
                .await;

            match decision {
                Decision::Admit(identity) => {
                    parts.extensions.insert(identity);
                    parts.extensions.insert(params);
                    inner.call(Request::from_parts(parts, body)).await
                }
                Decision::Deny(denial) => Ok(ApiError::from(denial).into_response()),
            }
        })
    }
}

/// Builds the engine's view of the request.
///
/// The body is only buffered when one of the route's checks reads the form;
/// it is then handed back so the handler can still extract it.
async fn collect_params(
    gate: &ProtectLayer,
    parts: &mut Parts,
    body: Body,
) -> (RequestParams, Body) {
    let mut params = RequestParams::new();

    if let Ok(path) = RawPathParams::from_request_parts(parts, &()).await {
        params = params.with_path_params(
            path.iter()
                .map(|(key, value)| (key.to_string(), value.to_string())),
        );
    }

    if let Some(query) = parts.uri.query() {
        params = params.with_query(query);
    }

    if !gate.reads_form() {
        return (params, body);
    }

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match axum::body::to_bytes(body, gate.body_limit).await {
        Ok(bytes) if bytes.is_empty() => (params.with_body(FormBody::Empty), Body::empty()),
        Ok(bytes) => {
            let form = FormBody::Raw {
                content_type,
                bytes: bytes.to_vec(),
            };
            (params.with_body(form), Body::from(bytes))
        }
        Err(e) => {
            debug!("Failed to read request body: {}", e);
            (
                params.with_body(FormBody::Unreadable(e.to_string())),
                Body::empty(),
            )
        }
    }
}

/// The caller admitted by the gate.
///
/// Only usable on routes wrapped in a [`ProtectLayer`]; anywhere else the
/// identity is missing and the request is treated as unauthenticated.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .map(|identity| CurrentUser(identity.user_id))
            .ok_or(ApiError::Unauthorized)
    }
}

/// The request as the gate decoded it.
///
/// Handlers read form fields through this so they see the same values the
/// checks did: body first, then the query string.
#[derive(Debug, Clone)]
pub struct GateParams(pub RequestParams);

impl GateParams {
    pub fn form_value(&self, key: &str) -> Result<Option<String>, ApiError> {
        self.0
            .form_value(key)
            .map_err(|e| ApiError::BadRequest(e.to_string()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for GateParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestParams>()
            .cloned()
            .map(GateParams)
            .ok_or(ApiError::Unauthorized)
    }
}
