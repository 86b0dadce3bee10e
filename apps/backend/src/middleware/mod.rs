pub mod cors;
pub mod request_context;

pub use cors::cors_middleware;
pub use request_context::{RequestContext, TraceId};
