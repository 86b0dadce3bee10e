use actix_web::{web, App, HttpServer};
use battle_backend::config::db::DbKind;
use battle_backend::config::ServerConfig;
use battle_backend::infra::state::build_state;
use battle_backend::middleware::cors::cors_middleware;
use battle_backend::middleware::request_context::RequestContext;
use battle_backend::routes;
use tracing::{error, info};

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables come from the runtime (compose env_file, or a
    // sourced .env for local runs).
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid server configuration");
            std::process::exit(1);
        }
    };

    let db_kind = match std::env::var("BACKEND_DB_KIND") {
        Ok(raw) => match raw.parse::<DbKind>() {
            Ok(kind) => kind,
            Err(e) => {
                error!(error = %e, "invalid BACKEND_DB_KIND");
                std::process::exit(1);
            }
        },
        Err(_) => DbKind::Postgres,
    };

    let app_state = match build_state()
        .with_db(db_kind)
        .with_redis(config.redis_url.clone())
        .build()
        .await
    {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "failed to build application state");
            std::process::exit(1);
        }
    };

    info!(
        host = %config.host,
        port = config.port,
        db = ?db_kind,
        redis = config.redis_url.is_some(),
        "battle backend starting"
    );

    let data = web::Data::new(app_state);
    let bind = (config.host.clone(), config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware(&config))
            .wrap(RequestContext)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind(bind)?
    .run()
    .await
}
