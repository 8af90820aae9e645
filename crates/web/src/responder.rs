//! Converts handler outputs into HTTP responses.
//!
//! The [`Responder`] trait defines how a value becomes a response. It is implemented for
//! the common return types of handlers: strings, `()`, `Option`, pre-built responses,
//! status tuples and [`Json`].

use crate::RequestContext;
use crate::body::ResponseBody;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Response, StatusCode};
use mime::Mime;
use serde::Serialize;
use std::convert::Infallible;
use tracing::error;

/// A type that can be converted into an HTTP response.
pub trait Responder {
    fn response_to(self, ctx: &RequestContext) -> Response<ResponseBody>;
}

/// `None` yields an empty 200 response.
impl<T: Responder> Responder for Option<T> {
    fn response_to(self, ctx: &RequestContext) -> Response<ResponseBody> {
        match self {
            Some(t) => t.response_to(ctx),
            None => Response::new(ResponseBody::empty()),
        }
    }
}

/// Passes pre-built responses through.
impl<B> Responder for Response<B>
where
    B: Into<ResponseBody>,
{
    fn response_to(self, _ctx: &RequestContext) -> Response<ResponseBody> {
        self.map(Into::into)
    }
}

impl<T: Responder> Responder for (StatusCode, T) {
    fn response_to(self, ctx: &RequestContext) -> Response<ResponseBody> {
        let (status, responder) = self;
        let mut response = responder.response_to(ctx);
        *response.status_mut() = status;
        response
    }
}

impl<T: Responder> Responder for (T, StatusCode) {
    fn response_to(self, ctx: &RequestContext) -> Response<ResponseBody> {
        let (responder, status) = self;
        (status, responder).response_to(ctx)
    }
}

impl<T: Responder> Responder for Box<T> {
    fn response_to(self, ctx: &RequestContext) -> Response<ResponseBody> {
        (*self).response_to(ctx)
    }
}

impl Responder for () {
    fn response_to(self, _ctx: &RequestContext) -> Response<ResponseBody> {
        Response::new(ResponseBody::empty())
    }
}

impl Responder for &'static str {
    fn response_to(self, _ctx: &RequestContext) -> Response<ResponseBody> {
        with_content_type(ResponseBody::from(self), &mime::TEXT_PLAIN_UTF_8)
    }
}

impl Responder for String {
    fn response_to(self, _ctx: &RequestContext) -> Response<ResponseBody> {
        with_content_type(ResponseBody::from(self), &mime::TEXT_PLAIN_UTF_8)
    }
}

impl Responder for Infallible {
    fn response_to(self, _ctx: &RequestContext) -> Response<ResponseBody> {
        match self {}
    }
}

/// Serializes the wrapped value as `application/json`.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: Serialize> Responder for Json<T> {
    fn response_to(self, ctx: &RequestContext) -> Response<ResponseBody> {
        match serde_json::to_vec(&self.0) {
            Ok(bytes) => with_content_type(ResponseBody::from(bytes), &mime::APPLICATION_JSON),
            Err(e) => {
                error!(cause = %e, path = ctx.path(), "failed to serialize json response");
                crate::response::internal_error()
            }
        }
    }
}

/// An HTML document, `text/html; charset=utf-8`.
#[derive(Debug, Clone)]
pub struct Html<T>(pub T);

impl<T: Into<ResponseBody>> Responder for Html<T> {
    fn response_to(self, _ctx: &RequestContext) -> Response<ResponseBody> {
        with_content_type(self.0.into(), &mime::TEXT_HTML_UTF_8)
    }
}

fn with_content_type(body: ResponseBody, content_type: &Mime) -> Response<ResponseBody> {
    let mut response = Response::new(body);
    if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}
