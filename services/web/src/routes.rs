//! API route table.
//!
//! Routes are scanned in registration order and the first exact
//! (method, path) match wins. Removal frees the slot for reuse behind a
//! generation counter, so a stale [`RouteId`] can never address a slot's
//! new occupant and repeated add/remove does not grow the table.

use bytes::Bytes;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use tracing::debug;
use warp::http::{header::CONTENT_TYPE, HeaderValue, Method, StatusCode};
use warp::hyper::Body;

/// Path prefix reserved for the JSON API.
pub const API_PREFIX: &str = "/API/";

/// A request handed to an API handler, after prefix stripping.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Route-relative path, e.g. `get_data`.
    pub path: String,
    pub body: Bytes,
}

/// What an API handler answers with.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Success with an empty body.
    pub fn empty() -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "text/plain",
            body: Vec::new(),
        }
    }

    pub fn json(value: serde_json::Value) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "application/json",
            body: value.to_string().into_bytes(),
        }
    }

    /// Malformed request; no state change was applied.
    pub fn client_error(reason: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            content_type: "text/plain",
            body: reason.as_bytes().to_vec(),
        }
    }

    pub fn server_error(reason: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            content_type: "text/plain",
            body: reason.as_bytes().to_vec(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            content_type: "text/plain",
            body: b"Not Found".to_vec(),
        }
    }

    pub fn into_http(self) -> warp::reply::Response {
        let mut response = warp::reply::Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(self.content_type));
        response
    }
}

/// Boxed async handler stored in the table.
pub type ApiHandler = Arc<dyn Fn(ApiRequest) -> BoxFuture<'static, ApiResponse> + Send + Sync>;

/// Stable handle to a registered route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteId {
    index: u32,
    generation: u32,
}

struct Route {
    method: Method,
    path: String,
    handler: ApiHandler,
}

struct Slot {
    generation: u32,
    route: Option<Route>,
}

/// Ordered route table with generation-guarded slot reuse.
#[derive(Default)]
pub struct RouteTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Scan order; first match wins.
    order: Vec<RouteId>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route at the end of the scan order.
    pub fn register(&mut self, method: Method, path: &str, handler: ApiHandler) -> RouteId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    route: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.route = Some(Route {
            method: method.clone(),
            path: path.to_string(),
            handler,
        });
        let id = RouteId {
            index,
            generation: slot.generation,
        };
        self.order.push(id);
        debug!(method = %method, path = %path, "route registered");
        id
    }

    /// Remove a route. A stale id (already removed, slot possibly reused)
    /// is inert and returns `false`.
    pub fn unregister(&mut self, id: RouteId) -> bool {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return false;
        };
        if slot.generation != id.generation || slot.route.is_none() {
            return false;
        }
        slot.route = None;
        slot.generation += 1;
        self.free.push(id.index);
        self.order.retain(|entry| *entry != id);
        true
    }

    /// First route matching exactly, scanning in registration order.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<ApiHandler> {
        for id in &self.order {
            let Some(route) = self.slots[id.index as usize].route.as_ref() else {
                continue;
            };
            if route.method == *method && route.path == path {
                return Some(Arc::clone(&route.handler));
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drop every route. Only the explicit reset path calls this; server
    /// start/stop leaves the table intact.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.route.take().is_some() {
                slot.generation += 1;
                self.free.push(index as u32);
            }
        }
        self.order.clear();
    }
}

/// Route-relative name of an API request path, with any query-like suffix
/// removed. `None` when the path is outside the reserved prefix.
pub fn strip_api_path(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(API_PREFIX)?;
    Some(rest.split(['?', '#']).next().unwrap_or(rest))
}
