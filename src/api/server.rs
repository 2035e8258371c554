//! Read-only HTTP API over the status state.
//!
//! Routes:
//! - `/` greeting
//! - `/health` liveness of this service itself
//! - `/status` latest outcome per target as JSON
//! - `/metrics` Prometheus text exposition

use crate::monitor::ProbeOutcome;
use crate::state::AppState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus_client::encoding::text::encode;
use serde::Serialize;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// Body of `/status`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub uptime_seconds: f64,
    pub monitored_services: usize,
    pub summary: Summary,
    pub services: BTreeMap<String, ProbeOutcome>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub up: usize,
    pub down: usize,
}

/// Status API HTTP server.
pub struct ApiServer {
    listener: TcpListener,
    state: AppState,
}

impl ApiServer {
    /// Bind the listener. Failing here is fatal for the service.
    pub async fn bind(address: SocketAddr, state: AppState) -> std::io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self { listener, state })
    }

    /// Address actually bound (useful when binding port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve requests until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        match self.listener.local_addr() {
            Ok(address) => info!(address = %address, "status API listening"),
            Err(e) => error!(error = %e, "status API listening on unknown address"),
        }

        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, _addr)) => {
                            let state = self.state.clone();

                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let service = service_fn(move |req| {
                                    let state = state.clone();
                                    async move { handle_request(req, &state).await }
                                });

                                if let Err(e) = http1::Builder::new()
                                    .serve_connection(io, service)
                                    .await
                                {
                                    debug!(error = %e, "api connection error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept api connection");
                        }
                    }
                }

                _ = shutdown.recv() => {
                    info!("status API shutting down");
                    break;
                }
            }
        }
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: &AppState,
) -> Result<Response<Full<Bytes>>, Infallible> {
    debug!(path = %req.uri().path(), method = %req.method(), "api request");
    Ok(route(req.method(), req.uri().path(), state))
}

/// Dispatch a request to its handler.
pub fn route(method: &Method, path: &str, state: &AppState) -> Response<Full<Bytes>> {
    if method != Method::GET {
        return text(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed\n");
    }

    match path {
        "/" => text(StatusCode::OK, "Keep Alive Service running"),
        "/health" => text(StatusCode::OK, "OK"),
        "/status" => status(state),
        "/metrics" => metrics(state),
        _ => text(StatusCode::NOT_FOUND, "Not found\n"),
    }
}

/// Build the `/status` body from the current snapshot.
pub fn status_response(state: &AppState) -> StatusResponse {
    let snapshot = state.status().snapshot();
    StatusResponse {
        uptime_seconds: state.uptime().as_secs_f64(),
        monitored_services: state.targets().len(),
        summary: Summary {
            up: snapshot.up,
            down: snapshot.down,
        },
        services: snapshot.per_target,
    }
}

fn status(state: &AppState) -> Response<Full<Bytes>> {
    match serde_json::to_vec(&status_response(state)) {
        Ok(body) => respond(StatusCode::OK, "application/json", body.into()),
        Err(e) => {
            error!(error = %e, "failed to encode status");
            text(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode status\n")
        }
    }
}

fn metrics(state: &AppState) -> Response<Full<Bytes>> {
    let mut buffer = String::new();
    if let Err(e) = encode(&mut buffer, state.metrics().registry()) {
        error!(error = %e, "failed to encode metrics");
        return text(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics\n");
    }

    respond(
        StatusCode::OK,
        "text/plain; version=0.0.4; charset=utf-8",
        buffer.into(),
    )
}

fn text(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    respond(status, "text/plain; charset=utf-8", Bytes::from_static(body.as_bytes()))
}

fn respond(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
