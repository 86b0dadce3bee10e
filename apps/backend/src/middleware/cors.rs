use actix_cors::Cors;
use actix_web::http::header;

use crate::config::ServerConfig;

/// CORS for the lobby/battle API. Origins come from `CORS_ALLOWED_ORIGINS`;
/// with nothing configured only the local frontend is allowed.
pub fn cors_middleware(config: &ServerConfig) -> Cors {
    let origins: Vec<&str> = if config.allowed_origins.is_empty() {
        vec!["http://localhost:3000", "http://127.0.0.1:3000"]
    } else {
        config.allowed_origins.iter().map(String::as_str).collect()
    };

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![
            header::HeaderName::from_static("x-trace-id"),
            header::HeaderName::from_static("x-request-id"),
        ])
        .max_age(3600);

    for origin in origins {
        cors = cors.allowed_origin(origin);
    }
    cors
}
