//! Handlers, layouts and middleware share one contract: the [`Layer`].
//!
//! A layer receives the request context and a [`Next`] continuation. It may change the
//! context and call [`Next::run`] to enter the rest of the chain, inspect or change the
//! response afterwards, answer on its own without calling `next`, or fail.

use crate::ResponseBody;
use crate::dispatch::{DispatchError, DispatchState};
use crate::request::RequestContext;
use crate::responder::Responder;
use async_trait::async_trait;
use futures::future::BoxFuture;
use http::Response;
use std::error::Error;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

pub type BoxError = Box<dyn Error + Send + Sync>;

pub type LayerResult = Result<Response<ResponseBody>, BoxError>;

#[async_trait]
pub trait Layer: Send + Sync {
    async fn call(&self, ctx: &mut RequestContext, next: Next<'_>) -> LayerResult;
}

/// A bound layer together with the relative path of the file it serves.
#[derive(Clone)]
pub struct ChainLayer {
    path: String,
    layer: Arc<dyn Layer>,
}

impl ChainLayer {
    pub fn new<S: Into<String>>(path: S, layer: Arc<dyn Layer>) -> Self {
        Self { path: path.into(), layer }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) async fn call(&self, ctx: &mut RequestContext, next: Next<'_>) -> LayerResult {
        self.layer.call(ctx, next).await
    }
}

impl Debug for ChainLayer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ChainLayer").field(&self.path).finish()
    }
}

/// The continuation of a chain: the layers that have not run yet.
///
/// Running it consumes it, so a layer enters the rest of its chain at most once:
///
/// ```compile_fail
/// use arbor_web::layer_fn;
///
/// let twice = layer_fn(|ctx, next| {
///     Box::pin(async move {
///         next.run(ctx).await?;
///         next.run(ctx).await
///     })
/// });
/// ```
#[derive(Debug)]
pub struct Next<'a> {
    chain: &'a [ChainLayer],
    index: usize,
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [ChainLayer]) -> Self {
        Self { chain, index: 0 }
    }

    /// A continuation with nothing left to run.
    pub(crate) fn exhausted() -> Self {
        Self { chain: &[], index: 0 }
    }

    /// Position of the next layer in the whole chain.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn remaining(&self) -> usize {
        self.chain.len()
    }

    /// Runs the next layer.
    ///
    /// Errors of the layer are wrapped into [`DispatchError::Layer`] naming the failing file,
    /// errors that already are a [`DispatchError`] pass through unchanged. Once the layer
    /// responded, the calling layer is marked running again.
    pub async fn run(self, ctx: &mut RequestContext) -> LayerResult {
        let Some((layer, rest)) = self.chain.split_first() else {
            return Err(DispatchError::ChainExhausted.into());
        };

        ctx.set_dispatch_state(DispatchState::Running(self.index));
        let next = Next { chain: rest, index: self.index + 1 };
        match layer.call(ctx, next).await {
            Ok(response) => {
                if let Some(caller) = self.index.checked_sub(1) {
                    ctx.set_dispatch_state(DispatchState::Running(caller));
                }
                Ok(response)
            }
            Err(source) if source.is::<DispatchError>() => Err(source),
            Err(source) => Err(DispatchError::Layer { layer: layer.path.clone(), source }.into()),
        }
    }
}

pub struct LayerFn<F> {
    f: F,
}

impl<F> Debug for LayerFn<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("LayerFn")
    }
}

/// Creates a layer from a closure receiving the context and the continuation.
///
/// ```
/// use arbor_web::layer_fn;
///
/// let timing = layer_fn(|ctx, next| {
///     Box::pin(async move {
///         ctx.state_mut().insert("seen", true);
///         next.run(ctx).await
///     })
/// });
/// ```
pub fn layer_fn<F>(f: F) -> LayerFn<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, LayerResult> + Send + Sync,
{
    LayerFn { f }
}

#[async_trait]
impl<F> Layer for LayerFn<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, LayerResult> + Send + Sync,
{
    async fn call(&self, ctx: &mut RequestContext, next: Next<'_>) -> LayerResult {
        (self.f)(ctx, next).await
    }
}

pub struct HandlerFn<F> {
    f: F,
}

impl<F> Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("HandlerFn")
    }
}

/// Creates a leaf layer from a closure whose output is a [`Responder`].
///
/// The continuation is never called, a handler always ends the chain.
pub fn handler_fn<F, R>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, Result<R, BoxError>> + Send + Sync,
    R: Responder,
{
    HandlerFn { f }
}

#[async_trait]
impl<F, R> Layer for HandlerFn<F>
where
    F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, Result<R, BoxError>> + Send + Sync,
    R: Responder,
{
    async fn call(&self, ctx: &mut RequestContext, _next: Next<'_>) -> LayerResult {
        let responder = (self.f)(ctx).await?;
        Ok(responder.response_to(ctx))
    }
}
