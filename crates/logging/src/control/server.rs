//! crates/logging/src/control/server.rs
//!
//! HTTP listener serving level control requests.
//!
//! The socket is bound synchronously so bind failures surface from
//! `Logger::configure`. An axum router serves [`CONTROL_PATH`] on a
//! dedicated thread running a current-thread runtime until the listener is
//! stopped, then drains in-flight requests through axum's graceful shutdown.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use tokio::sync::oneshot;

use super::{CONTROL_PATH, ControlQuery, ControlResponse};
use crate::error::LogError;
use crate::levels::LevelControl;

/// Time allowed for in-flight requests once shutdown has been signalled.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Running control listener; stops when dropped.
#[derive(Debug)]
pub(crate) struct ControlListener {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    complete_rx: Option<Receiver<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ControlListener {
    /// Binds `addr` and starts serving on a background thread.
    pub(crate) fn start(addr: &str, levels: Arc<LevelControl>) -> Result<Self, LogError> {
        let listener_error = |source: io::Error| LogError::ControlListener {
            addr: addr.to_owned(),
            source,
        };

        let std_listener = std::net::TcpListener::bind(addr).map_err(listener_error)?;
        std_listener.set_nonblocking(true).map_err(listener_error)?;
        let local_addr = std_listener.local_addr().map_err(listener_error)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(listener_error)?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (complete_tx, complete_rx) = bounded::<()>(1);
        let app = router(levels);

        let thread = thread::Builder::new()
            .name("zclog-control".to_owned())
            .spawn(move || {
                runtime.block_on(async move {
                    let listener = match tokio::net::TcpListener::from_std(std_listener) {
                        Ok(listener) => listener,
                        Err(error) => {
                            tracing::error!(target: "zclog::control", %error, "failed to register control listener");
                            return;
                        }
                    };
                    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                        let _ = shutdown_rx.await;
                        tracing::debug!(target: "zclog::control", "level control listener received shutdown signal");
                    });
                    if let Err(error) = server.await {
                        tracing::error!(target: "zclog::control", %error, "level control listener failed");
                    }
                });
                let _ = complete_tx.send(());
            })
            .map_err(listener_error)?;

        tracing::info!(
            target: "zclog::control",
            addr = %local_addr,
            path = CONTROL_PATH,
            "level control listener started"
        );
        Ok(Self {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            complete_rx: Some(complete_rx),
            thread: Some(thread),
        })
    }

    /// Address the listener is bound to.
    pub(crate) const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections and waits, bounded, for the serving thread.
    pub(crate) fn stop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        let Some(thread) = self.thread.take() else {
            return;
        };

        let finished = self
            .complete_rx
            .take()
            .map(|complete_rx| complete_rx.recv_timeout(SHUTDOWN_TIMEOUT));
        if let Some(Err(RecvTimeoutError::Timeout)) = finished {
            tracing::warn!(target: "zclog::control", timeout = ?SHUTDOWN_TIMEOUT, "level control listener did not stop in time");
            return;
        }
        if thread.join().is_err() {
            tracing::error!(target: "zclog::control", "control listener thread panicked");
        }
        tracing::debug!(target: "zclog::control", "level control listener stopped");
    }
}

impl Drop for ControlListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn router(levels: Arc<LevelControl>) -> Router {
    Router::new()
        .route(CONTROL_PATH, get(apply_level).fallback(method_not_allowed))
        .fallback(not_found)
        .with_state(levels)
}

async fn apply_level(
    State(levels): State<Arc<LevelControl>>,
    Query(query): Query<ControlQuery>,
) -> ControlResponse {
    let response = query.apply(&levels);
    tracing::debug!(target: "zclog::control", status = response.status(), "answered control request");
    response
}

async fn method_not_allowed() -> ControlResponse {
    ControlResponse::MethodNotAllowed
}

async fn not_found() -> ControlResponse {
    ControlResponse::NotFound
}

impl IntoResponse for ControlResponse {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Applied { .. } => StatusCode::OK,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        };
        (status, self.body()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::Severity;

    fn request(addr: SocketAddr, path: &str, query: &[(&str, &str)]) -> (u16, String) {
        let response = reqwest::blocking::Client::new()
            .get(format!("http://{addr}{path}"))
            .query(query)
            .send()
            .unwrap();
        let status = response.status().as_u16();
        (status, response.text().unwrap())
    }

    #[test]
    fn serves_control_requests_until_dropped() {
        let levels = Arc::new(LevelControl::default());
        let listener = ControlListener::start("127.0.0.1:0", Arc::clone(&levels)).unwrap();
        let addr = listener.local_addr();

        let ok = request(addr, CONTROL_PATH, &[("logger", "svc::db"), ("level", "1")]);
        assert_eq!(ok, (200, "ok".to_owned()));
        assert_eq!(levels.override_for("svc::db"), Some(Severity::Debug));

        let (status, body) = request(addr, CONTROL_PATH, &[("logger", "svc::db"), ("level", "9")]);
        assert_eq!(status, 400);
        assert!(body.starts_with("error: "), "{body}");
        assert_eq!(levels.override_for("svc::db"), Some(Severity::Debug));

        let missing = request(addr, "/elsewhere", &[]);
        assert_eq!(missing, (404, "error: not found".to_owned()));

        drop(listener);
        assert!(std::net::TcpStream::connect(addr).is_err());
    }

    #[test]
    fn bind_conflict_is_reported() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = occupied.local_addr().unwrap().to_string();

        let error = ControlListener::start(&addr, Arc::new(LevelControl::default())).unwrap_err();
        assert!(matches!(error, LogError::ControlListener { .. }), "{error}");
    }
}
