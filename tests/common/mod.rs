//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::Request;
use tokio::net::TcpListener;

use switchyard::dispatch::{handler, reply, Handler};
use switchyard::{Context, Dispatcher, HttpServer, ServerConfig, Shutdown};

/// Handler that ends the response with `text`.
#[allow(dead_code)]
pub fn returns(text: &'static str) -> Handler {
    handler(move |_ctx, _next| Box::pin(async move { reply::text(text) }))
}

/// Handler that appends `text` and continues the chain.
#[allow(dead_code)]
pub fn writes(text: &'static str) -> Handler {
    handler(move |ctx, next| {
        Box::pin(async move {
            ctx.send(text);
            next.run(ctx).await?;
            reply::done()
        })
    })
}

/// Build a bodiless request.
#[allow(dead_code)]
pub fn request(method: &str, uri: &str) -> Request<Bytes> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::new())
        .unwrap()
}

/// Response body of a dispatched context as text.
#[allow(dead_code)]
pub fn body_text(ctx: &Context) -> String {
    String::from_utf8(ctx.response().body().to_vec()).unwrap()
}

/// Configuration bound to an ephemeral local port.
#[allow(dead_code)]
pub fn test_config(request_secs: u64) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.timeouts.request_secs = request_secs;
    config
}

/// Serve `dispatcher` on an ephemeral port. Trigger the returned
/// `Shutdown` to stop the server.
#[allow(dead_code)]
pub async fn spawn_server(config: ServerConfig, dispatcher: Arc<Dispatcher>) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind(config.listener.bind_address()).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, dispatcher);
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    (addr, shutdown)
}
