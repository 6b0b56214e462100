//! paneld Web Subsystem
//!
//! The device's HTTP and WebSocket surface, owned by a single web actor:
//!
//! - a [`RouteTable`] dispatching `/API/` requests by exact method+path
//!   match in registration order,
//! - a static-file fallback streaming content from the mounted medium,
//! - a WebSocket session registry with a queued broadcast drained on
//!   request.
//!
//! The actor controls the lifecycle (bind/unbind on `Start`/`Stop`, session
//! bookkeeping, broadcast drains); the route table itself outlives server
//! instances and is cleared only by an explicit `Reset`.

pub mod connection;
pub mod routes;
pub mod server;
pub mod sessions;
pub mod static_files;

pub use connection::SocketHandler;
pub use routes::{strip_api_path, ApiHandler, ApiRequest, ApiResponse, RouteId, RouteTable, API_PREFIX};
pub use server::{build_filter, WebMessage, WebServer, SOCKET_PATH};
pub use sessions::{Session, SessionId, SessionRegistry};

// The device speaks plain HTTP types everywhere; re-export them so callers
// do not need a direct warp dependency.
pub use warp::http::{Method, StatusCode};
