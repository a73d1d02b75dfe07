//! HTTP endpoint collaborator.
//!
//! A minimal hyper server that invokes the checker and serializes the
//! aggregate document. The core never depends on this module; hosts with
//! their own HTTP stack can call [`response_for`] from any handler.

use std::convert::Infallible;
use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming as IncomingBody;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::info;

use crate::checker::Checker;
use crate::status::{AggregatedResult, Status};

/// Build the HTTP response for an aggregate result: `Up` maps to 200,
/// `Unknown` and `Down` map to 503.
pub fn response_for(result: &AggregatedResult) -> Response<Full<Bytes>> {
    let code = match result.status {
        Status::Up => StatusCode::OK,
        Status::Unknown | Status::Down => StatusCode::SERVICE_UNAVAILABLE,
    };
    let body = serde_json::to_string(result).unwrap_or_else(|_| r#"{"status":"down"}"#.to_string());
    Response::builder()
        .status(code)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Bind `addr` and serve the health endpoint until the caller drops the
/// future.
pub async fn run_endpoint(
    addr: SocketAddr,
    checker: Checker,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    info!("health endpoint listening on http://{}", addr);
    serve(listener, checker).await
}

/// Serve the health endpoint on an already-bound listener. Every request,
/// regardless of path, yields the aggregate document.
pub async fn serve(
    listener: TcpListener,
    checker: Checker,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        let (stream, _) = listener.accept().await?;
        let _ = stream.set_nodelay(true);
        let checker = checker.clone();

        tokio::spawn(async move {
            let service = service_fn(move |_req: Request<IncomingBody>| {
                let checker = checker.clone();
                async move {
                    let result = checker.check().await;
                    Ok::<_, Infallible>(response_for(&result))
                }
            });

            let io = TokioIo::new(stream);
            let _ = http1::Builder::new().serve_connection(io, service).await;
        });
    }
}
