//! Request dispatch for filesystem routes.
//!
//! `arbor-web` takes a [`Build`](arbor_build::Build), binds every route file to a
//! [`Layer`] registered in a [`LayerRegistry`], and dispatches requests through the
//! resulting chains: middleware first, then layouts, then the handler.
//!
//! ```no_run
//! use arbor_build::BuildOptions;
//! use arbor_web::{App, LayerRegistry, Server, handler_fn, layer_fn};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let registry = LayerRegistry::new()
//!         .bind("_middleware.ts", layer_fn(|ctx, next| Box::pin(async move { next.run(ctx).await })))
//!         .bind("index.ts", handler_fn(|_ctx| Box::pin(async move { Ok("home") })));
//!
//!     let app = App::from_dir("routes", &BuildOptions::default(), &registry)?;
//!     Server::builder().app(Arc::new(app)).address("127.0.0.1:8080").build()?.start().await?;
//!     Ok(())
//! }
//! ```

mod app;
mod body;
mod dispatch;
mod layer;
mod registry;
mod request;
mod resolve;
mod responder;
mod server;
mod state;
mod table;

pub mod response;

pub use app::App;
pub use body::ResponseBody;
pub use dispatch::{DispatchError, DispatchState, Failure, dispatch};
pub use layer::{BoxError, ChainLayer, HandlerFn, Layer, LayerFn, LayerResult, Next, handler_fn, layer_fn};
pub use registry::LayerRegistry;
pub use request::{Params, RequestContext};
pub use resolve::{ChainResolver, Resolution, split_path};
pub use responder::{Html, Json, Responder};
pub use server::{DEFAULT_MAX_BODY_SIZE, Server, ServerBuildError, ServerBuilder};
pub use state::RequestState;
pub use table::{BindError, BoundChain, BoundRoute, RouteTable};
