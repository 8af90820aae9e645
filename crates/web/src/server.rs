use crate::app::App;
use crate::body::ResponseBody;
use crate::response;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Request bodies above this size are answered with `413 Payload Too Large`.
pub const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

pub struct ServerBuilder {
    app: Option<Arc<App>>,
    address: Option<io::Result<Vec<SocketAddr>>>,
    max_body_size: usize,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { app: None, address: None, max_body_size: DEFAULT_MAX_BODY_SIZE }
    }

    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    pub fn app(mut self, app: Arc<App>) -> Self {
        self.app = Some(app);
        self
    }

    pub fn max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let app = self.app.ok_or(ServerBuildError::MissingApp)?;
        let address = self.address.ok_or(ServerBuildError::MissingAddress)??;
        Ok(Server { app, address, max_body_size: self.max_body_size })
    }
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder").field("address", &self.address).field("max_body_size", &self.max_body_size).finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct Server {
    app: Arc<App>,
    address: Vec<SocketAddr>,
    max_body_size: usize,
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("app must be set")]
    MissingApp,
    #[error("address must be set")]
    MissingAddress,
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] io::Error),
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Installs a default subscriber, binds the configured address and serves until the
    /// listener fails.
    pub async fn start(self) -> io::Result<()> {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            debug!(cause = %e, "a global subscriber is already installed");
        }

        let listener = match TcpListener::bind(self.address.as_slice()).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(cause = %e, address = ?self.address, "bind server error");
                return Err(e);
            }
        };
        info!("start listening at {:?}", listener.local_addr()?);
        self.serve(listener).await;
        Ok(())
    }

    /// Serves connections from an already bound listener.
    pub async fn serve(self, listener: TcpListener) {
        let server = Arc::new(self);
        loop {
            let (tcp_stream, remote_addr) = match listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let server = Arc::clone(&server);
            tokio::spawn(async move {
                let service = service_fn(move |request| {
                    let server = Arc::clone(&server);
                    async move { Ok::<_, Infallible>(server.call(request).await) }
                });
                match http1::Builder::new().serve_connection(TokioIo::new(tcp_stream), service).await {
                    Ok(()) => debug!(%remote_addr, "finished process, connection shutdown"),
                    Err(e) => error!(%remote_addr, cause = %e, "service has error, connection shutdown"),
                }
            });
        }
    }

    async fn call(&self, request: Request<Incoming>) -> Response<ResponseBody> {
        let (parts, body) = request.into_parts();
        let body = match Limited::new(body, self.max_body_size).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.is::<LengthLimitError>() => {
                warn!(path = parts.uri.path(), limit = self.max_body_size, "request body too large");
                return response::status(StatusCode::PAYLOAD_TOO_LARGE);
            }
            Err(e) => {
                warn!(path = parts.uri.path(), cause = %e, "failed to read request body");
                return response::status(StatusCode::BAD_REQUEST);
            }
        };
        self.app.handle(Request::from_parts(parts, body)).await
    }
}
