//! Static content fallback.
//!
//! GET requests outside the API prefix resolve under the document root on
//! the mounted medium. Files are streamed in fixed-size chunks.

use futures_util::stream;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::debug;
use warp::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use warp::hyper::Body;

/// Document served for a trailing-slash path.
pub const INDEX_FILE: &str = "index.html";

const CHUNK_SIZE: usize = 4096;

static CONTENT_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("html", "text/html"),
        ("htm", "text/html"),
        ("css", "text/css"),
        ("js", "application/javascript"),
        ("json", "application/json"),
        ("txt", "text/plain"),
        ("png", "image/png"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("gif", "image/gif"),
        ("svg", "image/svg+xml"),
        ("ico", "image/x-icon"),
    ])
});

/// Content type inferred from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    path.extension()
        .and_then(OsStr::to_str)
        .and_then(|ext| CONTENT_TYPES.get(ext.to_ascii_lowercase().as_str()).copied())
        .unwrap_or("application/octet-stream")
}

/// Map a URL path under the document root. Parent components are refused.
fn resolve(doc_root: &Path, url_path: &str) -> Option<PathBuf> {
    let mut path = doc_root.to_path_buf();
    for part in url_path.split('/') {
        match part {
            "" | "." => {}
            ".." => return None,
            part => path.push(part),
        }
    }
    if url_path.is_empty() || url_path.ends_with('/') {
        path.push(INDEX_FILE);
    }
    Some(path)
}

fn not_found() -> warp::reply::Response {
    let mut response = warp::reply::Response::new(Body::from("Not Found"));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

/// Stream the file a URL path resolves to, or a not-found response.
pub async fn serve(doc_root: &Path, url_path: &str) -> warp::reply::Response {
    let Some(path) = resolve(doc_root, url_path) else {
        debug!(path = %url_path, "refusing path traversal");
        return not_found();
    };

    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        _ => {
            debug!(path = %path.display(), "static file not found");
            return not_found();
        }
    }
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "failed to open static file");
            return not_found();
        }
    };

    let chunks = stream::unfold(file, |mut file| async move {
        let mut buf = vec![0u8; CHUNK_SIZE];
        match file.read(&mut buf).await {
            Ok(0) => None,
            Ok(n) => {
                buf.truncate(n);
                Some((Ok::<_, std::io::Error>(buf), file))
            }
            Err(e) => Some((Err(e), file)),
        }
    });

    let mut response = warp::reply::Response::new(Body::wrap_stream(chunks));
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&path)),
    );
    response
}
