//! Task-local trace id for the request being served.
//!
//! `RequestContext` opens the scope; error rendering and adapters read it back so
//! problem responses and log lines carry the same id.

use std::cell::RefCell;
use std::future::Future;

use tokio::task_local;

const UNKNOWN: &str = "unknown";

task_local! {
    static TRACE_ID: RefCell<Option<String>>;
}

/// Current trace id, or `"unknown"` outside a request scope.
pub fn trace_id() -> String {
    TRACE_ID
        .try_with(|cell| cell.borrow().clone())
        .ok()
        .flatten()
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Run `future` with `trace_id` visible to [`trace_id()`].
pub async fn with_trace_id<F, R>(trace_id: String, future: F) -> R
where
    F: Future<Output = R>,
{
    TRACE_ID.scope(RefCell::new(Some(trace_id)), future).await
}
