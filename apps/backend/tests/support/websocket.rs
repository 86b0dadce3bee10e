use std::net::TcpListener;
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::{web, App, HttpServer};
use battle_backend::middleware::request_context::RequestContext;
use battle_backend::routes;
use battle_backend::state::app_state::AppState;
use battle_backend::ws::hub::PresenceRegistry;

/// A real HTTP server on an ephemeral port with every production route.
pub struct TestServer {
    pub handle: ServerHandle,
    pub addr: std::net::SocketAddr,
}

impl TestServer {
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub async fn stop(self) {
        self.handle.stop(true).await;
    }
}

pub async fn start_test_server(state: AppState) -> Result<TestServer, Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let data = web::Data::new(state);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(RequestContext)
            .configure(routes::configure)
    })
    .workers(1)
    .listen(listener)?
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);
    Ok(TestServer { handle, addr })
}

pub async fn wait_for_connections(
    presence: &PresenceRegistry,
    expected: usize,
    timeout: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = tokio::time::Instant::now();
    loop {
        if presence.active_connections_count() == expected {
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(format!(
                "timeout waiting for active_connections_count == {expected} (got {})",
                presence.active_connections_count()
            )
            .into());
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Poll until `user_id` has a socket in `lobby_code`.
pub async fn wait_for_lobby_member(
    presence: &PresenceRegistry,
    user_id: i64,
    lobby_code: &str,
    timeout: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = tokio::time::Instant::now();
    loop {
        let joined = presence
            .get(user_id)
            .is_some_and(|p| p.lobbies.iter().any(|code| code == lobby_code));
        if joined {
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(format!("timeout waiting for user {user_id} in lobby {lobby_code}").into());
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
