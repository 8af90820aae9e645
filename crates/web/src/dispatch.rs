//! Running a resolved chain against one request.
//!
//! ```text
//! Pending ──> Running(0) ──> Running(1) ──> ... ──> Responded
//!                  │              │
//!                  └──────────────┴──> Failed ──> error page (once) or generic 500
//! ```

use crate::ResponseBody;
use crate::layer::{BoxError, ChainLayer, Next};
use crate::request::RequestContext;
use crate::response;
use futures::FutureExt;
use http::{Response, StatusCode};
use std::any::Any;
use std::fmt::{self, Display, Formatter};
use std::panic::AssertUnwindSafe;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchState {
    #[default]
    Pending,
    /// The layer at this chain position is running.
    Running(usize),
    Responded,
    Failed,
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("layer {layer} failed: {source}")]
    Layer {
        layer: String,
        #[source]
        source: BoxError,
    },

    #[error("next called past the end of the chain")]
    ChainExhausted,

    #[error("layer panicked: {message}")]
    Panicked { message: String },
}

/// What went wrong, as seen by an error page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    layer: Option<String>,
    message: String,
}

impl Failure {
    pub fn new<S: Into<String>>(layer: Option<String>, message: S) -> Self {
        Self { layer, message: message.into() }
    }

    /// Relative path of the failing file, if known.
    pub fn layer(&self) -> Option<&str> {
        self.layer.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.layer {
            Some(layer) => write!(f, "{layer}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Runs `chain` and turns every failure into a response.
///
/// On failure the context records the [`Failure`] and `error_page` runs exactly once with an
/// exhausted continuation. If there is no error page, or it fails too, a plain 500 is
/// returned. An error page answering 200 is answered with 500 instead.
pub async fn dispatch(chain: &[ChainLayer], error_page: Option<&ChainLayer>, ctx: &mut RequestContext) -> Response<ResponseBody> {
    ctx.set_dispatch_state(DispatchState::Pending);

    let outcome = AssertUnwindSafe(Next::new(chain).run(ctx)).catch_unwind().await;
    let failure = match outcome {
        Ok(Ok(response)) => {
            ctx.set_dispatch_state(DispatchState::Responded);
            return response;
        }
        Ok(Err(e)) => failure_from_error(chain, ctx, &e),
        Err(panic) => {
            let failing = running_layer(chain, ctx);
            Failure::new(failing, DispatchError::Panicked { message: panic_message(&*panic) }.to_string())
        }
    };

    error!(layer = failure.layer().unwrap_or("-"), cause = %failure.message(), "dispatch failed");
    ctx.set_dispatch_state(DispatchState::Failed);
    ctx.set_failure(failure);

    let Some(page) = error_page else {
        return response::internal_error();
    };

    match AssertUnwindSafe(page.call(ctx, Next::exhausted())).catch_unwind().await {
        Ok(Ok(mut response)) => {
            if response.status() == StatusCode::OK {
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            }
            debug!(page = page.path(), status = %response.status(), "error page responded");
            response
        }
        Ok(Err(e)) => {
            error!(page = page.path(), cause = %e, "error page failed");
            response::internal_error()
        }
        Err(panic) => {
            error!(page = page.path(), cause = %panic_message(&*panic), "error page panicked");
            response::internal_error()
        }
    }
}

fn failure_from_error(chain: &[ChainLayer], ctx: &RequestContext, e: &BoxError) -> Failure {
    match e.downcast_ref::<DispatchError>() {
        Some(DispatchError::Layer { layer, source }) => Failure::new(Some(layer.clone()), source.to_string()),
        _ => Failure::new(running_layer(chain, ctx), e.to_string()),
    }
}

fn running_layer(chain: &[ChainLayer], ctx: &RequestContext) -> Option<String> {
    match ctx.dispatch_state() {
        DispatchState::Running(index) => chain.get(index).map(|layer| layer.path().to_string()),
        _ => None,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
