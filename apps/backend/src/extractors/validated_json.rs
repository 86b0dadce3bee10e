use std::future::Future;
use std::ops::Deref;
use std::pin::Pin;

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use bytes::BytesMut;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use tracing::debug;

use crate::error::AppError;
use crate::errors::ErrorCode;

/// JSON body extractor whose failures render as problem+json.
///
/// Malformed JSON is `BAD_REQUEST`; well-formed JSON with missing or
/// mistyped fields is `VALIDATION_ERROR` naming the field. The content type
/// is not checked.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> FromRequest for ValidatedJson<T>
where
    T: DeserializeOwned + 'static,
{
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, AppError>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let path = req.path().to_string();
        let mut payload = payload.take();

        Box::pin(async move {
            let mut body = BytesMut::new();
            while let Some(chunk) = payload.next().await {
                let chunk = chunk.map_err(|e| {
                    AppError::bad_request(
                        ErrorCode::BadRequest,
                        format!("Failed to read request body: {e}"),
                    )
                })?;
                body.extend_from_slice(&chunk);
            }
            parse_body(&body).map(ValidatedJson).inspect_err(|e| {
                debug!(path = %path, body_len = body.len(), error = %e, "Rejected request body");
            })
        })
    }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| match e.classify() {
        Category::Data => {
            // serde's message ends with " at line X column Y"; keep the field part.
            let message = e.to_string();
            let field = message.split(" at line ").next().unwrap_or_default();
            AppError::invalid(
                ErrorCode::ValidationError,
                format!("Invalid request body: {field}"),
            )
        }
        Category::Eof => AppError::bad_request(
            ErrorCode::BadRequest,
            "Invalid JSON: unexpected end of input",
        ),
        Category::Syntax | Category::Io => AppError::bad_request(
            ErrorCode::BadRequest,
            format!("Invalid JSON at line {} column {}", e.line(), e.column()),
        ),
    })
}
