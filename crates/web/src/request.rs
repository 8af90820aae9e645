//! The per-request context handed to every layer.
//!
//! - `RequestContext`: request head and body, route parameters, request state and
//!   dispatch bookkeeping
//! - `Params`: route parameters bound while matching, ordered root to leaf

use crate::dispatch::{DispatchState, Failure};
use crate::state::RequestState;
use arbor_build::ParamValue;
use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri, Version};

/// Route parameters in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: Vec<(String, ParamValue)>,
}

impl Params {
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.iter().find(|(key, _)| key == name).map(|(_, value)| value)
    }

    /// The value of a single-segment parameter.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    /// The segments of any parameter, a single-segment parameter yields one element.
    pub fn get_all(&self, name: &str) -> Option<&[String]> {
        self.get(name).map(ParamValue::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl From<Vec<(String, ParamValue)>> for Params {
    fn from(values: Vec<(String, ParamValue)>) -> Self {
        Self { values }
    }
}

/// Everything a layer can see and change about the request being dispatched.
#[derive(Debug)]
pub struct RequestContext {
    parts: Parts,
    body: Bytes,
    params: Params,
    state: RequestState,
    route: Option<String>,
    failure: Option<Failure>,
    dispatch_state: DispatchState,
}

impl RequestContext {
    pub fn new(parts: Parts, body: Bytes) -> Self {
        Self {
            parts,
            body,
            params: Params::empty(),
            state: RequestState::new(),
            route: None,
            failure: None,
            dispatch_state: DispatchState::Pending,
        }
    }

    pub fn from_request(request: Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts, body)
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    pub fn version(&self) -> Version {
        self.parts.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.parts.headers
    }

    /// Request extensions, for typed values that are not JSON.
    pub fn extensions(&self) -> &http::Extensions {
        &self.parts.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut http::Extensions {
        &mut self.parts.extensions
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Shortcut for a single-segment route parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get_str(name)
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RequestState {
        &mut self.state
    }

    /// The pattern of the matched route, `None` while a not-found page runs.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Set once a layer failed, error pages read it.
    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    pub fn dispatch_state(&self) -> DispatchState {
        self.dispatch_state
    }

    pub(crate) fn set_route(&mut self, pattern: String, params: Params) {
        self.route = Some(pattern);
        self.params = params;
    }

    pub(crate) fn set_failure(&mut self, failure: Failure) {
        self.failure = Some(failure);
    }

    pub(crate) fn set_dispatch_state(&mut self, state: DispatchState) {
        self.dispatch_state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Params {
        Params::from(vec![
            ("tenant".to_string(), ParamValue::One("acme".to_string())),
            ("rest".to_string(), ParamValue::Many(vec!["a".to_string(), "b".to_string()])),
        ])
    }

    #[test]
    fn test_params() {
        let params = params();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get_str("tenant"), Some("acme"));
        assert_eq!(params.get_str("rest"), None);
        assert_eq!(params.get_all("rest"), Some(["a".to_string(), "b".to_string()].as_slice()));
        assert_eq!(params.get_all("tenant"), Some(["acme".to_string()].as_slice()));
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["tenant", "rest"]);
        assert!(params.get("missing").is_none());
    }

    #[test]
    fn test_context_accessors() {
        let request = Request::builder().method(Method::POST).uri("/x/acme?q=1").body(Bytes::from("hi")).unwrap();
        let mut ctx = RequestContext::from_request(request);

        assert_eq!(ctx.method(), Method::POST);
        assert_eq!(ctx.path(), "/x/acme");
        assert_eq!(ctx.body().as_ref(), b"hi");
        assert_eq!(ctx.dispatch_state(), DispatchState::Pending);
        assert!(ctx.route().is_none());

        ctx.set_route("/x/:tenant".into(), params());
        assert_eq!(ctx.route(), Some("/x/:tenant"));
        assert_eq!(ctx.param("tenant"), Some("acme"));
    }
}
