//! Ready-made short-circuit responses.
//!
//! A middleware or layout returns one of these instead of calling `next` to end the
//! chain early. They are ordinary responses, not failures.

use crate::body::ResponseBody;
use http::header::{InvalidHeaderValue, LOCATION};
use http::{HeaderValue, Response, StatusCode};

pub fn status(status: StatusCode) -> Response<ResponseBody> {
    let mut response = Response::new(ResponseBody::from(status.canonical_reason().unwrap_or_default()));
    *response.status_mut() = status;
    response
}

/// `302 Found` pointing at `location`.
pub fn redirect(location: &str) -> Result<Response<ResponseBody>, InvalidHeaderValue> {
    redirect_with(StatusCode::FOUND, location)
}

pub fn redirect_with(code: StatusCode, location: &str) -> Result<Response<ResponseBody>, InvalidHeaderValue> {
    let mut response = Response::new(ResponseBody::empty());
    *response.status_mut() = code;
    response.headers_mut().insert(LOCATION, HeaderValue::from_str(location)?);
    Ok(response)
}

pub fn not_found() -> Response<ResponseBody> {
    status(StatusCode::NOT_FOUND)
}

pub fn forbidden() -> Response<ResponseBody> {
    status(StatusCode::FORBIDDEN)
}

pub fn internal_error() -> Response<ResponseBody> {
    status(StatusCode::INTERNAL_SERVER_ERROR)
}
