//! Redis pub/sub fan-out so events published on one instance reach sockets
//! held by every instance.

use std::sync::Arc;
use std::time::Duration;

use rand::random;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::ws::hub::PresenceRegistry;
use crate::ws::protocol::{Room, ServerMsg};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub room: Room,
    pub event: ServerMsg,
    #[serde(default)]
    pub except: Option<Uuid>,
}

pub struct RealtimeBroker {
    publisher: Mutex<ConnectionManager>,
}

// Subscriber retry configuration (background task)
const INITIAL_RETRY_DELAY_SECS: f64 = 1.0;
const MAX_RETRY_DELAY_SECS: f64 = 60.0;
const JITTER_PERCENT: f64 = 0.2;

// Publisher retry configuration (request path)
const PUBLISHER_MAX_ATTEMPTS: u32 = 3;
const PUBLISHER_INITIAL_RETRY_DELAY_MS: u64 = 50;
const PUBLISHER_MAX_RETRY_DELAY_MS: u64 = 200;

impl RealtimeBroker {
    /// Connect the publisher and start the subscriber that feeds `presence`.
    pub async fn connect(
        redis_url: &str,
        presence: Arc<PresenceRegistry>,
    ) -> Result<Arc<Self>, AppError> {
        let client = Client::open(redis_url)
            .map_err(|err| AppError::config(format!("Invalid REDIS_URL: {err}")))?;

        let manager = ConnectionManager::new(client.clone())
            .await
            .map_err(|err| {
                AppError::internal(
                    ErrorCode::ConfigError,
                    format!("Unable to initialize Redis connection manager: {err}"),
                )
            })?;

        tokio::spawn(run_subscription_loop_with_retry(client, presence));
        info!("Realtime fan-out connected to Redis");

        Ok(Arc::new(Self {
            publisher: Mutex::new(manager),
        }))
    }

    pub async fn publish(&self, envelope: &Envelope) -> Result<(), AppError> {
        let encoded = serde_json::to_string(envelope).map_err(|err| {
            AppError::internal(
                ErrorCode::InternalError,
                format!("Failed to serialize realtime envelope: {err}"),
            )
        })?;
        let channel = envelope.room.channel();

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let res = {
                let mut publisher = self.publisher.lock().await;
                publisher
                    .publish::<_, _, ()>(channel.clone(), encoded.clone())
                    .await
            };
            match res {
                Ok(()) => return Ok(()),
                Err(err) if attempt < PUBLISHER_MAX_ATTEMPTS && is_transient(&err) => {
                    let delay_ms = PUBLISHER_INITIAL_RETRY_DELAY_MS
                        .saturating_mul(2_u64.pow(attempt - 1))
                        .min(PUBLISHER_MAX_RETRY_DELAY_MS);
                    warn!(error = %err, attempt, retry_delay_ms = delay_ms, "Redis publish failed, retrying");
                    sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(err) => {
                    return Err(AppError::internal(
                        ErrorCode::InternalError,
                        format!("Failed to publish realtime event to Redis: {err}"),
                    ))
                }
            }
        }
    }
}

fn is_transient(err: &redis::RedisError) -> bool {
    err.is_io_error() || err.is_connection_dropped() || err.is_timeout()
}

fn retry_delay(attempt: u32) -> Duration {
    let base = INITIAL_RETRY_DELAY_SECS * 2f64.powi(attempt.saturating_sub(1).min(16) as i32);
    let capped = base.min(MAX_RETRY_DELAY_SECS);
    let jitter = (random::<f64>() * 2.0 - 1.0) * capped * JITTER_PERCENT;
    Duration::from_secs_f64((capped + jitter).max(0.1))
}

async fn run_subscription_loop_with_retry(client: Client, presence: Arc<PresenceRegistry>) {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match run_subscription_loop(&client, &presence).await {
            Ok(()) => attempt = 0,
            Err(err) => {
                let delay = retry_delay(attempt);
                warn!(
                    error = %err,
                    attempt,
                    retry_delay_secs = delay.as_secs_f64(),
                    "Redis subscription failed, retrying"
                );
                sleep(delay).await;
            }
        }
    }
}

async fn run_subscription_loop(
    client: &Client,
    presence: &PresenceRegistry,
) -> Result<(), redis::RedisError> {
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.psubscribe("user:*").await?;
    pubsub.psubscribe("lobby:*").await?;
    info!("Subscribed to Redis patterns 'user:*' and 'lobby:*'");

    let mut stream = pubsub.on_message();
    while let Some(msg) = stream.next().await {
        let Ok(channel) = msg.get_channel::<String>() else {
            continue;
        };
        let Ok(payload) = msg.get_payload::<String>() else {
            continue;
        };
        match serde_json::from_str::<Envelope>(&payload) {
            Ok(envelope) => {
                if Room::from_channel(&channel).as_ref() != Some(&envelope.room) {
                    warn!(channel = %channel, "[WS BROKER] envelope room does not match channel");
                    continue;
                }
                presence.broadcast(&envelope.room, &envelope.event, envelope.except);
            }
            Err(err) => {
                error!(error = %err, channel = %channel, "Failed to decode Redis realtime payload");
            }
        }
    }

    warn!("Redis subscription stream ended");
    Ok(())
}
