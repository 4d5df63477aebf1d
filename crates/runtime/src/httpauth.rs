//! Named middleware chains and JSON helpers used by generated REST routes.
//!
//! Each endpoint names the chain that guards it. At registration time the
//! generated `register_routes` resolves every name against a
//! [`MiddlewareChainMap`] and fails if one is missing, so no route is ever
//! served without its chain.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

/// Identity of the caller, when a chain authenticated one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDetails {
    pub id: String,
}

/// Per-request context produced by a middleware chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    user: Option<UserDetails>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn authenticated(id: impl Into<String>) -> Self {
        Self {
            user: Some(UserDetails { id: id.into() }),
        }
    }

    pub fn user(&self) -> Option<&UserDetails> {
        self.user.as_ref()
    }
}

type ChainFn = dyn Fn(&HeaderMap) -> Result<RequestContext, Response> + Send + Sync;

/// A middleware chain. Either yields a [`RequestContext`] or the response
/// that short-circuits the request.
#[derive(Clone)]
pub struct MiddlewareChain(Arc<ChainFn>);

impl MiddlewareChain {
    pub fn new<F>(chain: F) -> Self
    where
        F: Fn(&HeaderMap) -> Result<RequestContext, Response> + Send + Sync + 'static,
    {
        Self(Arc::new(chain))
    }

    /// Run the chain against a request's headers.
    pub fn run(&self, headers: &HeaderMap) -> Result<RequestContext, Response> {
        (self.0)(headers)
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MiddlewareChain")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("unknown middleware chain: {0}")]
    UnknownChain(String),
}

/// Chains by name.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareChainMap {
    chains: BTreeMap<String, MiddlewareChain>,
}

impl MiddlewareChainMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chain(mut self, name: impl Into<String>, chain: MiddlewareChain) -> Self {
        self.chains.insert(name.into(), chain);
        self
    }

    pub fn get(&self, name: &str) -> Result<MiddlewareChain, RouteError> {
        self.chains
            .get(name)
            .cloned()
            .ok_or_else(|| RouteError::UnknownChain(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.chains.keys().map(String::as_str)
    }
}

/// Chain that lets every request through anonymously.
pub fn public_chain() -> MiddlewareChain {
    MiddlewareChain::new(|_| Ok(RequestContext::anonymous()))
}

/// Chain that requires `Authorization: Bearer <token>` and maps the token to
/// a user id with `verify`. Anything else is answered with 401.
pub fn bearer_chain<F>(verify: F) -> MiddlewareChain
where
    F: Fn(&str) -> Option<String> + Send + Sync + 'static,
{
    MiddlewareChain::new(move |headers| {
        let user_id = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|token| verify(token.trim()));

        match user_id {
            Some(id) => Ok(RequestContext::authenticated(id)),
            None => Err((StatusCode::UNAUTHORIZED, "unauthorized").into_response()),
        }
    })
}

/// Decode a JSON request body.
///
/// The request must declare `Content-Type: application/json` (parameters such
/// as `charset` are ignored) and the body must not carry unknown fields when
/// `T` denies them. Failures become a 400 response carrying the reason.
pub fn parse_json_input<T: DeserializeOwned>(headers: &HeaderMap, body: &[u8]) -> Result<T, Response> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"));

    if !is_json {
        return Err((
            StatusCode::BAD_REQUEST,
            "expecting Content-Type with application/json header",
        )
            .into_response());
    }

    serde_json::from_slice(body).map_err(|e| {
        debug!("Rejected JSON input: {}", e);
        (StatusCode::BAD_REQUEST, e.to_string()).into_response()
    })
}

/// Path parameters of a request whose chain already ran. Rejections are
/// answered with axum's own response.
pub async fn path_params<T>(parts: &mut Parts) -> Result<T, Response>
where
    T: DeserializeOwned + Send,
{
    Path::<T>::from_request_parts(parts, &())
        .await
        .map(|Path(params)| params)
        .map_err(IntoResponse::into_response)
}

/// Collect the body of a request whose chain already ran, then decode it
/// with [`parse_json_input`]. The router's body limit still applies.
pub async fn read_json_input<T: DeserializeOwned>(parts: Parts, body: Body) -> Result<T, Response> {
    let headers = parts.headers.clone();
    let bytes = Bytes::from_request(Request::from_parts(parts, body), &())
        .await
        .map_err(IntoResponse::into_response)?;
    parse_json_input(&headers, &bytes)
}

/// Encode a handler's output as a 200 JSON response.
pub fn json_output<T: Serialize>(output: &T) -> Response {
    Json(output).into_response()
}
