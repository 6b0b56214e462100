//! The web server actor.
//!
//! Owns the server lifecycle, the session registry, and the broadcast
//! backlog. `Start` binds a listener for the current document root and
//! `Stop` tears it down again; the route table and the registry survive
//! both and are cleared only by `Reset`.

use crate::connection::{self, SocketHandler};
use crate::routes::{strip_api_path, ApiRequest, ApiResponse, RouteTable};
use crate::sessions::{Session, SessionId, SessionRegistry};
use crate::static_files;
use async_trait::async_trait;
use bytes::Bytes;
use device_actors::{Actor, Flow, Mailbox};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use warp::filters::path::FullPath;
use warp::http::Method;
use warp::{Filter, Rejection, Reply};

/// Reserved WebSocket path segment.
pub const SOCKET_PATH: &str = "ws";

/// Largest request body an API handler will look at.
pub const MAX_API_BODY_BYTES: usize = 1024;

/// Messages consumed by the web actor.
#[derive(Debug)]
pub enum WebMessage {
    /// Bind a listener serving the route table and this document root.
    Start { bind: SocketAddr, doc_root: PathBuf },
    /// Tear the listener down; table and sessions are kept.
    Stop,
    /// Queue a payload for the next broadcast drain.
    Broadcast(String),
    /// Drain the backlog to every registered session.
    FlushBroadcasts,
    /// A connection task registered a new session (handshake).
    SessionOpened(Session),
    /// A connection task ended.
    SessionClosed(SessionId),
    /// Clear the route table, the session registry, and the backlog.
    Reset,
    Quit,
}

struct RunningInstance {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

pub struct WebServer {
    routes: Arc<RwLock<RouteTable>>,
    socket_handler: SocketHandler,
    self_mailbox: Mailbox<WebMessage>,
    sessions: SessionRegistry,
    backlog: VecDeque<String>,
    running: Option<RunningInstance>,
    bound: Arc<RwLock<Option<SocketAddr>>>,
}

impl WebServer {
    pub fn new(
        routes: Arc<RwLock<RouteTable>>,
        socket_handler: SocketHandler,
        self_mailbox: Mailbox<WebMessage>,
    ) -> Self {
        Self {
            routes,
            socket_handler,
            self_mailbox,
            sessions: SessionRegistry::new(),
            backlog: VecDeque::new(),
            running: None,
            bound: Arc::new(RwLock::new(None)),
        }
    }

    /// Cell holding the listener's address while one is bound. Grab a
    /// clone before spawning the actor.
    pub fn bound_address(&self) -> Arc<RwLock<Option<SocketAddr>>> {
        Arc::clone(&self.bound)
    }

    fn start_instance(&mut self, bind: SocketAddr, doc_root: PathBuf) {
        self.stop_instance();

        let filter = build_filter(
            Arc::clone(&self.routes),
            doc_root.clone(),
            Arc::clone(&self.socket_handler),
            self.self_mailbox.clone(),
        );
        let (shutdown, signal) = oneshot::channel::<()>();
        match warp::serve(filter).try_bind_with_graceful_shutdown(bind, async {
            signal.await.ok();
        }) {
            Ok((addr, serving)) => {
                info!(addr = %addr, doc_root = %doc_root.display(), "web server listening");
                *self.bound.write() = Some(addr);
                self.running = Some(RunningInstance {
                    shutdown,
                    task: tokio::spawn(serving),
                });
            }
            Err(e) => {
                // Unavailable until the next Start; nothing retries.
                error!(addr = %bind, error = %e, "failed to bind web server");
            }
        }
    }

    fn stop_instance(&mut self) {
        if let Some(instance) = self.running.take() {
            let _ = instance.shutdown.send(());
            // Open connections would keep a graceful shutdown waiting;
            // stopping means the listener and its connections go now.
            instance.task.abort();
            *self.bound.write() = None;
            info!("web server stopped");
        }
    }

    fn flush_broadcasts(&mut self) {
        if self.backlog.is_empty() {
            return;
        }
        debug!(
            payloads = self.backlog.len(),
            sessions = self.sessions.len(),
            "draining broadcast backlog"
        );
        while let Some(payload) = self.backlog.pop_front() {
            self.sessions.broadcast(&payload);
        }
        self.sessions.prune_dead();
    }
}

#[async_trait]
impl Actor for WebServer {
    type Message = WebMessage;

    fn name(&self) -> &'static str {
        "web"
    }

    async fn handle(&mut self, msg: WebMessage) -> anyhow::Result<Flow> {
        match msg {
            WebMessage::Start { bind, doc_root } => self.start_instance(bind, doc_root),
            WebMessage::Stop => self.stop_instance(),
            WebMessage::Broadcast(payload) => self.backlog.push_back(payload),
            WebMessage::FlushBroadcasts => self.flush_broadcasts(),
            WebMessage::SessionOpened(session) => self.sessions.register(session),
            WebMessage::SessionClosed(id) => {
                self.sessions.remove(id);
            }
            WebMessage::Reset => {
                self.routes.write().clear();
                self.sessions.clear();
                self.backlog.clear();
            }
            WebMessage::Quit => return Ok(Flow::Stop),
        }
        Ok(Flow::Continue)
    }

    async fn on_stop(&mut self) {
        self.stop_instance();
    }
}

/// Assemble the warp filter serving one instance: the WebSocket endpoint,
/// the API dispatch, and the static fallback.
pub fn build_filter(
    routes: Arc<RwLock<RouteTable>>,
    doc_root: PathBuf,
    socket_handler: SocketHandler,
    server: Mailbox<WebMessage>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone + Send + Sync + 'static {
    let ws_route = warp::path(SOCKET_PATH)
        .and(warp::path::end())
        .and(warp::ws())
        .map(move |ws: warp::ws::Ws| {
            let server = server.clone();
            let handler = Arc::clone(&socket_handler);
            ws.on_upgrade(move |socket| connection::run(socket, server, handler))
        });

    let fallback = warp::method()
        .and(warp::path::full())
        .and(warp::body::bytes())
        .and_then(move |method: Method, path: FullPath, body: Bytes| {
            let routes = Arc::clone(&routes);
            let doc_root = doc_root.clone();
            async move {
                Ok::<_, Rejection>(dispatch(routes, doc_root, method, path, body).await)
            }
        });

    ws_route.or(fallback)
}

async fn dispatch(
    routes: Arc<RwLock<RouteTable>>,
    doc_root: PathBuf,
    method: Method,
    path: FullPath,
    body: Bytes,
) -> warp::reply::Response {
    if let Some(name) = strip_api_path(path.as_str()) {
        if body.len() > MAX_API_BODY_BYTES {
            debug!(path = %name, len = body.len(), "oversized request body");
            return ApiResponse::client_error("request body too large").into_http();
        }
        // No match is not-found regardless of method.
        let handler = routes.read().resolve(&method, name);
        return match handler {
            Some(handler) => {
                let request = ApiRequest {
                    method,
                    path: name.to_string(),
                    body,
                };
                handler(request).await.into_http()
            }
            None => {
                debug!(method = %method, path = %name, "no API route matched");
                ApiResponse::not_found().into_http()
            }
        };
    }

    if method == Method::GET {
        static_files::serve(&doc_root, path.as_str()).await
    } else {
        ApiResponse::not_found().into_http()
    }
}
