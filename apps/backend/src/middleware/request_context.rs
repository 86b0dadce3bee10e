//! Per-request context: trace id, tracing span, completion log.
//!
//! Every request gets a trace id (a sane inbound `x-request-id` is reused),
//! stored in extensions as [`TraceId`], scoped into [`crate::trace_ctx`] and
//! echoed back as `x-request-id`. The handler runs inside a `request` span;
//! one `request_completed` event is logged per request at a level that
//! follows the status class.

use std::future::{ready, Ready};
use std::time::Instant;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::{Error, HttpMessage};
use futures_util::future::LocalBoxFuture;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::trace_ctx;

const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_INBOUND_ID_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(pub String);

#[derive(Clone, Copy, Default)]
pub struct RequestContext;

impl<S, B> Transform<S, ServiceRequest> for RequestContext
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestContextMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestContextMiddleware { service }))
    }
}

pub struct RequestContextMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestContextMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let trace_id = reusable_request_id(&req).unwrap_or_else(|| Uuid::new_v4().to_string());
        req.extensions_mut().insert(TraceId(trace_id.clone()));

        let method = req.method().to_string();
        let path = req.path().to_string();
        let span = info_span!("request", trace_id = %trace_id, method = %method, path = %path);
        let inner = self.service.call(req);

        let scoped_id = trace_id.clone();
        let work = async move {
            let result = inner.await;
            let status = match &result {
                Ok(res) => res.status(),
                Err(err) => err.as_response_error().status_code(),
            };
            log_completion(&method, &path, status, started);
            result
        }
        .instrument(span);

        Box::pin(async move {
            let mut res = trace_ctx::with_trace_id(scoped_id, work).await?;
            if let Ok(value) = HeaderValue::from_str(&trace_id) {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }
            Ok(res)
        })
    }
}

/// Inbound ids are reused only when short and made of `[A-Za-z0-9_-]`.
fn reusable_request_id(req: &ServiceRequest) -> Option<String> {
    let raw = req.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?;
    is_sane_id(raw).then(|| raw.to_string())
}

fn is_sane_id(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= MAX_INBOUND_ID_LEN
        && raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn log_completion(method: &str, path: &str, status: StatusCode, started: Instant) {
    let status_code = status.as_u16();
    let duration_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    if status.is_server_error() {
        error!(http.method = method, url.path = path, http.status_code = status_code, duration_us, "request_completed");
    } else if status.is_client_error() {
        warn!(http.method = method, url.path = path, http.status_code = status_code, duration_us, "request_completed");
    } else {
        info!(http.method = method, url.path = path, http.status_code = status_code, duration_us, "request_completed");
    }
}
