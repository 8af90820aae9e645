use arbor_build::{BuildOptions, RouteConfig};
use arbor_web::{App, BindError, Layer, LayerRegistry, RequestContext, Server, handler_fn, layer_fn, response};
use bytes::Bytes;
use http::header::{COOKIE, LOCATION};
use http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn routes(paths: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for path in paths {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "export default function page() {}\n").unwrap();
    }
    dir
}

fn request(path: &str) -> Request<Bytes> {
    Request::builder().uri(path).body(Bytes::new()).unwrap()
}

async fn body_string(response: Response<arbor_web::ResponseBody>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn append(ctx: &mut RequestContext, name: &str) {
    let trace = format!("{}{name}>", ctx.state().get_str("trace").unwrap_or_default());
    ctx.state_mut().insert("trace", trace);
}

/// Records its name in the `trace` state value and continues.
fn tracer(name: &'static str) -> impl Layer {
    layer_fn(move |ctx, next| {
        Box::pin(async move {
            append(ctx, name);
            next.run(ctx).await
        })
    })
}

/// Answers with the trace collected so far.
fn page(name: &'static str) -> impl Layer {
    handler_fn(move |ctx| Box::pin(async move { Ok(format!("{}{name}", ctx.state().get_str("trace").unwrap_or_default())) }))
}

#[tokio::test]
async fn test_onion_order() {
    let dir = routes(&["_middleware.ts", "layout.ts", "admin/_middleware.ts", "admin/layout.ts", "admin/index.ts"]);
    let registry = LayerRegistry::new()
        .bind("_middleware.ts", tracer("mw"))
        .bind(
            "layout.ts",
            layer_fn(|ctx, next| {
                Box::pin(async move {
                    append(ctx, "layout");
                    let mut response = next.run(ctx).await?;
                    response.headers_mut().insert("x-wrapped", "yes".parse()?);
                    Ok(response)
                })
            }),
        )
        .bind("admin/_middleware.ts", tracer("admin-mw"))
        .bind("admin/layout.ts", tracer("admin-layout"))
        .bind("admin/index.ts", page("admin"));

    let app = App::from_dir(dir.path(), &BuildOptions::default(), &registry).unwrap();
    let response = app.handle(request("/admin")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-wrapped"], "yes");
    assert_eq!(body_string(response).await, "mw>admin-mw>layout>admin-layout>admin");
}

#[tokio::test]
async fn test_middleware_short_circuits() {
    let dir = routes(&["admin/_middleware.ts", "admin/index.ts", "login/index.ts"]);
    let handled = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&handled);
    let registry = LayerRegistry::new()
        .bind(
            "admin/_middleware.ts",
            layer_fn(|ctx, next| {
                Box::pin(async move {
                    if ctx.headers().contains_key(COOKIE) {
                        next.run(ctx).await
                    } else {
                        Ok(response::redirect("/login")?)
                    }
                })
            }),
        )
        .bind(
            "admin/index.ts",
            handler_fn(move |_ctx| {
                seen.store(true, Ordering::SeqCst);
                Box::pin(async move { Ok("admin") })
            }),
        )
        .bind("login/index.ts", page("login"));

    let app = App::from_dir(dir.path(), &BuildOptions::default(), &registry).unwrap();

    let response = app.handle(request("/admin")).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[LOCATION], "/login");
    assert!(!handled.load(Ordering::SeqCst));

    let signed_in = Request::builder().uri("/admin").header(COOKIE, "session=1").body(Bytes::new()).unwrap();
    let response = app.handle(signed_in).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(handled.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_layout_overrides() {
    let dir = routes(&[
        "_middleware.ts",
        "layout.ts",
        "login/index.ts",
        "admin/layout.ts",
        "admin/settings/layout.ts",
        "admin/settings/index.ts",
    ]);
    let registry = LayerRegistry::new()
        .bind("_middleware.ts", tracer("mw"))
        .bind("layout.ts", tracer("app"))
        .bind_with_config("login/index.ts", page("login"), RouteConfig::default().with_skip_app_wrapper(true))
        .bind("admin/layout.ts", tracer("admin"))
        .bind("admin/settings/layout.ts", tracer("settings"))
        .bind_with_config(
            "admin/settings/index.ts",
            page("page"),
            RouteConfig::default().with_skip_inherited_layouts(true),
        );

    let app = App::from_dir(dir.path(), &BuildOptions::default(), &registry).unwrap();
    assert_eq!(body_string(app.handle(request("/login")).await).await, "mw>login");
    assert_eq!(body_string(app.handle(request("/admin/settings")).await).await, "mw>settings>page");
}

#[tokio::test]
async fn test_error_page_runs_once_after_failure() {
    let dir = routes(&["_500.ts", "layout.ts", "index.ts"]);
    let calls = Arc::new(AtomicUsize::new(0));
    let page_calls = Arc::clone(&calls);
    let registry = LayerRegistry::new()
        .bind(
            "_500.ts",
            layer_fn(move |ctx, next| {
                page_calls.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move {
                    assert_eq!(next.remaining(), 0);
                    let failure = ctx.failure().map(ToString::to_string).unwrap_or_default();
                    Ok(Response::new(arbor_web::ResponseBody::from(failure)))
                })
            }),
        )
        .bind("layout.ts", tracer("layout"))
        .bind("index.ts", handler_fn(|_ctx| Box::pin(async move { Err::<(), _>("database is down".into()) })));

    let app = App::from_dir(dir.path(), &BuildOptions::default(), &registry).unwrap();
    let response = app.handle(request("/")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "index.ts: database is down");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failing_middleware_stops_the_chain() {
    let dir = routes(&["_500.ts", "_middleware.ts", "index.ts"]);
    let handled = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&handled);
    let calls = Arc::new(AtomicUsize::new(0));
    let page_calls = Arc::clone(&calls);
    let registry = LayerRegistry::new()
        .bind(
            "_500.ts",
            handler_fn(move |ctx| {
                page_calls.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move { Ok(ctx.failure().map(ToString::to_string).unwrap_or_default()) })
            }),
        )
        .bind("_middleware.ts", layer_fn(|_ctx, _next| Box::pin(async move { Err("denied".into()) })))
        .bind(
            "index.ts",
            handler_fn(move |_ctx| {
                seen.store(true, Ordering::SeqCst);
                Box::pin(async move { Ok("home") })
            }),
        );

    let app = App::from_dir(dir.path(), &BuildOptions::default(), &registry).unwrap();
    let response = app.handle(request("/")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "_middleware.ts: denied");
    assert!(!handled.load(Ordering::SeqCst));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

fn explode() -> Result<&'static str, arbor_web::BoxError> {
    panic!("kaboom")
}

#[tokio::test]
async fn test_panic_reaches_error_page() {
    let dir = routes(&["_500.ts", "index.ts"]);
    let registry = LayerRegistry::new()
        .bind(
            "_500.ts",
            handler_fn(|ctx| {
                Box::pin(async move { Ok(ctx.failure().map(|failure| failure.message().to_string()).unwrap_or_default()) })
            }),
        )
        .bind("index.ts", handler_fn(|_ctx| Box::pin(async move { explode() })));

    let app = App::from_dir(dir.path(), &BuildOptions::default(), &registry).unwrap();
    let response = app.handle(request("/")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.contains("kaboom"));
}

#[tokio::test]
async fn test_not_found_pages() {
    let dir = routes(&["index.ts", "docs/layout.ts", "docs/_404.ts", "docs/index.ts"]);
    let registry = LayerRegistry::new()
        .bind("index.ts", page("home"))
        .bind("docs/layout.ts", tracer("docs"))
        .bind("docs/_404.ts", page("missing"))
        .bind("docs/index.ts", page("docs"));

    let app = App::from_dir(dir.path(), &BuildOptions::default(), &registry).unwrap();

    let response = app.handle(request("/docs/nope/deeper")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "docs>missing");

    let response = app.handle(request("/elsewhere")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "Not Found");
}

#[tokio::test]
async fn test_params_are_decoded() {
    let dir = routes(&["users/[name]/index.ts", "docs/[...slug]/index.ts"]);
    let registry = LayerRegistry::new()
        .bind("users/[name]/index.ts", handler_fn(|ctx| Box::pin(async move { Ok(ctx.param("name").unwrap_or_default().to_string()) })))
        .bind(
            "docs/[...slug]/index.ts",
            handler_fn(|ctx| {
                Box::pin(async move {
                    let route = ctx.route().unwrap_or_default().to_string();
                    Ok(format!("{route} {}", ctx.params().get_all("slug").unwrap_or_default().join("|")))
                })
            }),
        );

    let app = App::from_dir(dir.path(), &BuildOptions::default(), &registry).unwrap();
    assert_eq!(body_string(app.handle(request("/users/caf%C3%A9")).await).await, "café");
    assert_eq!(body_string(app.handle(request("/docs/a/b%20c")).await).await, "/docs/:slug+ a|b c");
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_dropped_request_cancels_chain() {
    let dir = routes(&["index.ts"]);
    let dropped = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&dropped);
    let registry = LayerRegistry::new().bind(
        "index.ts",
        handler_fn(move |_ctx| {
            let guard = DropFlag(Arc::clone(&flag));
            Box::pin(async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                drop(guard);
                Ok("late")
            })
        }),
    );

    let app = App::from_dir(dir.path(), &BuildOptions::default(), &registry).unwrap();
    tokio::time::timeout(Duration::from_millis(50), app.handle(request("/"))).await.unwrap_err();
    assert!(dropped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_rebuild_swaps_table() {
    let dir = routes(&["index.ts"]);
    let registry = LayerRegistry::new().bind("index.ts", page("home")).bind("about/index.ts", page("about"));
    let app = App::from_dir(dir.path(), &BuildOptions::default(), &registry).unwrap();
    assert_eq!(app.handle(request("/about")).await.status(), StatusCode::NOT_FOUND);

    let before = app.table();
    fs::create_dir_all(dir.path().join("about")).unwrap();
    fs::write(dir.path().join("about/index.ts"), "export default {}\n").unwrap();
    app.rebuild(dir.path(), &BuildOptions::default(), &registry).unwrap();

    assert_eq!(body_string(app.handle(request("/about")).await).await, "about");
    assert_eq!(before.len(), 1);
    assert_eq!(app.table().len(), 2);

    fs::create_dir_all(dir.path().join("contact")).unwrap();
    fs::write(dir.path().join("contact/index.ts"), "export default {}\n").unwrap();
    let err = app.rebuild(dir.path(), &BuildOptions::default(), &registry).unwrap_err();
    assert!(matches!(err, BindError::Unbound { ref path, .. } if path == "contact/index.ts"));
    assert_eq!(app.table().len(), 2);
    assert_eq!(body_string(app.handle(request("/about")).await).await, "about");
}

#[test]
fn test_unbound_file_fails_binding() {
    let dir = routes(&["layout.ts", "index.ts"]);
    let registry = LayerRegistry::new().bind("index.ts", page("home"));
    let err = App::from_dir(dir.path(), &BuildOptions::default(), &registry).unwrap_err();
    assert_eq!(err.to_string(), "no layer is bound to layout file layout.ts");
}

async fn raw_exchange(address: std::net::SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(address).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    // a reset after the reply still leaves the reply in `buf`
    stream.read_to_end(&mut buf).await.unwrap_or_default();
    String::from_utf8_lossy(&buf).into_owned()
}

#[tokio::test]
async fn test_server_round_trip() {
    let dir = routes(&["echo/index.ts"]);
    let registry = LayerRegistry::new().bind(
        "echo/index.ts",
        handler_fn(|ctx| Box::pin(async move { Ok(String::from_utf8_lossy(ctx.body()).into_owned()) })),
    );
    let app = Arc::new(App::from_dir(dir.path(), &BuildOptions::default(), &registry).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let server = Server::builder().app(app).address(address).max_body_size(8).build().unwrap();
    tokio::spawn(server.serve(listener));

    let reply = raw_exchange(address, "POST /echo HTTP/1.1\r\nHost: test\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello").await;
    assert!(reply.starts_with("HTTP/1.1 200"), "{reply}");
    assert!(reply.ends_with("hello"), "{reply}");

    let reply = raw_exchange(
        address,
        "POST /echo HTTP/1.1\r\nHost: test\r\nContent-Length: 16\r\nConnection: close\r\n\r\nmuch too long!!!",
    )
    .await;
    assert!(reply.starts_with("HTTP/1.1 413"), "{reply}");

    let reply = raw_exchange(address, "GET /missing HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n").await;
    assert!(reply.starts_with("HTTP/1.1 404"), "{reply}");
}

#[test]
fn test_server_builder_errors() {
    let err = Server::builder().address("127.0.0.1:0").build().unwrap_err();
    assert_eq!(err.to_string(), "app must be set");

    let dir = routes(&["index.ts"]);
    let registry = LayerRegistry::new().bind("index.ts", page("home"));
    let app = Arc::new(App::from_dir(dir.path(), &BuildOptions::default(), &registry).unwrap());
    let err = Server::builder().app(app).build().unwrap_err();
    assert_eq!(err.to_string(), "address must be set");
}
