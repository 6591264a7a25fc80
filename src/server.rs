//! HTTP server implementation using hyper.
//!
//! Every request resolves its session from the bearer token, runs the
//! matched route's guard, and only then reaches the handler. Guard redirects
//! become `307` responses; an unresolved session becomes `503`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http_body_util::{BodyExt, Limited};
use hyper::body::Incoming;
use hyper::header::{CONTENT_LENGTH, HeaderValue};
use hyper::service::service_fn;
use hyper::{Request, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto;
use tokio::net::TcpListener;
use tokio::sync::{Semaphore, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::{Config, SharedConfig};
use crate::guard::Outcome;
use crate::response::{self, HttpResponse};
use crate::router::{Context, RouteMatch, RouterHandle};
use crate::session::SessionState;

/// Timeout for reading request headers (slowloris protection).
const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Shared server state.
pub struct State {
    pub config: SharedConfig,
    pub router: Arc<RouterHandle>,
}

/// Handle to a running server instance.
pub struct Server {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<crate::Result<()>>,
}

impl Server {
    /// The address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shut down the accept loop and wait for it to finish.
    pub async fn shutdown(self) -> crate::Result<()> {
        let _ = self.shutdown_tx.send(());
        self.task.await.unwrap_or(Ok(()))
    }
}

fn add_standard_headers(response: &mut HttpResponse) {
    let headers = response.headers_mut();
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
}

fn payload_too_large() -> HttpResponse {
    response::error(StatusCode::PAYLOAD_TOO_LARGE, "Payload too large")
}

/// Turn a guard outcome that is not `Render` into a response.
fn deny(outcome: Outcome) -> HttpResponse {
    match outcome {
        Outcome::Redirect(redirect) => {
            response::redirect(&redirect.location).unwrap_or_else(|e| e.into_response())
        }
        Outcome::Loading => crate::Error::SessionPending.into_response(),
        Outcome::Render => response::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
    }
}

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<State>,
) -> Result<HttpResponse, std::convert::Infallible> {
    let (parts, body) = req.into_parts();
    let max_body = state.config.server.max_body_size;

    // Reject oversized bodies early via Content-Length header
    let declared = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|cl| cl.to_str().ok())
        .and_then(|cl| cl.parse::<usize>().ok());
    if declared.is_some_and(|len| len > max_body) {
        let mut response = payload_too_large();
        add_standard_headers(&mut response);
        return Ok(response);
    }

    // Chunked bodies are limited while reading
    let body_bytes = match BodyExt::collect(Limited::new(body, max_body)).await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => {
            let mut response = payload_too_large();
            add_standard_headers(&mut response);
            return Ok(response);
        }
    };

    let requested = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string());

    let mut response = match state.router.match_route(&parts.method, parts.uri.path()) {
        RouteMatch::Matched { endpoint, params } => {
            let session = SessionState::from_headers(&parts.headers, &state.config.auth);
            let outcome = endpoint
                .guard
                .as_ref()
                .map_or(Outcome::Render, |guard| {
                    guard.evaluate(&session, &requested, &state.config.access)
                });

            if outcome.is_render() {
                let ctx = Context {
                    method: parts.method,
                    uri: parts.uri,
                    headers: parts.headers,
                    params,
                    body: body_bytes,
                    session,
                    config: Arc::clone(&state.config),
                };
                match (endpoint.handler)(ctx).await {
                    Ok(response) => response,
                    Err(e) => e.into_response(),
                }
            } else {
                deny(outcome)
            }
        }
        RouteMatch::MethodNotAllowed => {
            response::error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
        }
        RouteMatch::NotFound => response::error(StatusCode::NOT_FOUND, "Not found"),
    };

    add_standard_headers(&mut response);
    Ok(response)
}

fn connection_builder() -> auto::Builder<TokioExecutor> {
    let mut builder = auto::Builder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(HEADER_READ_TIMEOUT);
    builder
}

/// Bind, start accepting connections, and return a handle.
pub async fn start(config: Config, router: Arc<RouterHandle>) -> crate::Result<Server> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;

    let semaphore = Arc::new(Semaphore::new(config.server.max_connections));
    let state = Arc::new(State {
        config: Arc::new(config),
        router,
    });

    info!("Server listening on http://{}", addr);

    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, remote_addr) = result?;
                    let io = TokioIo::new(stream);

                    match Arc::clone(&semaphore).try_acquire_owned() {
                        Ok(permit) => {
                            let state = Arc::clone(&state);
                            tokio::spawn(async move {
                                let service = service_fn(move |req| {
                                    handle_request(req, Arc::clone(&state))
                                });
                                if let Err(e) = connection_builder().serve_connection(io, service).await {
                                    error!("Error serving connection from {}: {}", remote_addr, e);
                                }
                                drop(permit);
                            });
                        }
                        Err(_) => {
                            warn!("Connection limit reached, rejecting {}", remote_addr);
                            tokio::spawn(async move {
                                let service = service_fn(|_req: Request<Incoming>| async {
                                    Ok::<_, std::convert::Infallible>(response::error(
                                        StatusCode::SERVICE_UNAVAILABLE,
                                        "Service unavailable",
                                    ))
                                });
                                let _ = connection_builder().serve_connection(io, service).await;
                            });
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    break;
                }
            }
        }

        Ok(())
    });

    Ok(Server {
        addr,
        shutdown_tx,
        task,
    })
}

/// Run the HTTP server until the accept loop ends.
pub async fn run(config: Config, router: Arc<RouterHandle>) -> crate::Result<()> {
    let server = start(config, router).await?;
    server.task.await.unwrap_or(Ok(()))
}
