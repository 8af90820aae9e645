//! The request entry point.
//!
//! An [`App`] owns the current [`RouteTable`]. Tables are immutable and swapped whole, so a
//! request keeps the table it started with even when a rebuild lands mid-flight.

use crate::body::ResponseBody;
use crate::dispatch::dispatch;
use crate::registry::LayerRegistry;
use crate::request::RequestContext;
use crate::resolve::Resolution;
use crate::response;
use crate::table::{BindError, RouteTable};
use arbor_build::{BuildOptions, Builder};
use arc_swap::ArcSwap;
use bytes::Bytes;
use http::{Request, Response, StatusCode};
use std::path::Path;
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, info_span};

#[derive(Debug)]
pub struct App {
    table: ArcSwap<RouteTable>,
}

impl App {
    pub fn new(table: RouteTable) -> Self {
        Self { table: ArcSwap::from_pointee(table) }
    }

    /// Builds the routes under `root` and binds them against `registry`.
    pub fn from_dir<P: AsRef<Path>>(root: P, options: &BuildOptions, registry: &LayerRegistry) -> Result<Self, BindError> {
        Ok(Self::new(build_table(root.as_ref(), options, registry)?))
    }

    /// The table new requests resolve against.
    pub fn table(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    pub fn replace(&self, table: RouteTable) {
        info!(routes = table.len(), "route table replaced");
        self.table.store(Arc::new(table));
    }

    /// Rebuilds from disk and swaps the table in.
    ///
    /// On error the current table stays in place.
    pub fn rebuild<P: AsRef<Path>>(&self, root: P, options: &BuildOptions, registry: &LayerRegistry) -> Result<(), BindError> {
        match build_table(root.as_ref(), options, registry) {
            Ok(table) => {
                self.replace(table);
                Ok(())
            }
            Err(e) => {
                error!(cause = %e, "rebuild failed, keeping the current route table");
                Err(e)
            }
        }
    }

    pub async fn handle(&self, request: Request<Bytes>) -> Response<ResponseBody> {
        let table = self.table();
        let mut ctx = RequestContext::from_request(request);

        match table.resolve(ctx.path()) {
            Resolution::Matched { route, params } => {
                let pattern = route.pattern().to_string();
                let span = info_span!("dispatch", method = %ctx.method(), path = ctx.path(), route = %pattern);
                ctx.set_route(pattern, params);
                let chain = route.chain();
                dispatch(chain.layers(), chain.error_page(), &mut ctx).instrument(span).await
            }
            Resolution::NotFound { page: Some(page) } => {
                let span = info_span!("not_found", method = %ctx.method(), path = ctx.path());
                let mut response = dispatch(page.layers(), page.error_page(), &mut ctx).instrument(span).await;
                if response.status() == StatusCode::OK {
                    *response.status_mut() = StatusCode::NOT_FOUND;
                }
                response
            }
            Resolution::NotFound { page: None } => {
                debug!(path = ctx.path(), "no route and no not-found page");
                response::not_found()
            }
        }
    }
}

fn build_table(root: &Path, options: &BuildOptions, registry: &LayerRegistry) -> Result<RouteTable, BindError> {
    let build = Builder::new(options).with_configs(registry).build(root)?;
    RouteTable::bind(&build, registry)
}
