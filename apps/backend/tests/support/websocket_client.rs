use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

pub struct WebSocketClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketClient {
    pub async fn connect(url: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let (stream, _) = connect_async(url).await?;
        Ok(Self { stream })
    }

    /// Connect and consume the `connected` greeting.
    pub async fn connect_greeted(url: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut client = Self::connect(url).await?;
        let hello = client.recv_json().await?;
        if hello["type"] != "connected" {
            return Err(format!("expected connected greeting, got {hello}").into());
        }
        Ok(client)
    }

    /// Connect, greet, then bind to `user_id` and consume the ack.
    pub async fn connect_as(url: &str, user_id: i64) -> Result<Self, Box<dyn std::error::Error>> {
        let mut client = Self::connect_greeted(url).await?;
        client
            .send_json(&serde_json::json!({ "type": "setup", "user_id": user_id }))
            .await?;
        let ack = client.recv_json().await?;
        if ack["type"] != "setup_ack" {
            return Err(format!("expected setup_ack, got {ack}").into());
        }
        Ok(client)
    }

    pub async fn send_text(&mut self, text: &str) -> Result<(), Box<dyn std::error::Error>> {
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    pub async fn send_json(&mut self, value: &Value) -> Result<(), Box<dyn std::error::Error>> {
        self.send_text(&value.to_string()).await
    }

    /// Next text frame as JSON, skipping pings and pongs.
    pub async fn recv_json(&mut self) -> Result<Value, Box<dyn std::error::Error>> {
        loop {
            let next = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .map_err(|_| "timeout waiting for message")?;
            match next {
                Some(Ok(Message::Text(text))) => return Ok(serde_json::from_str(text.as_str())?),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Ok(other)) => return Err(format!("unexpected frame: {other:?}").into()),
                Some(Err(e)) => return Err(e.into()),
                None => return Err("stream ended".into()),
            }
        }
    }

    /// Receive until a message of `kind` arrives.
    pub async fn recv_type(&mut self, kind: &str) -> Result<Value, Box<dyn std::error::Error>> {
        loop {
            let msg = self.recv_json().await?;
            if msg["type"] == kind {
                return Ok(msg);
            }
        }
    }

    /// True when nothing but control frames arrives within `wait`.
    pub async fn is_quiet(&mut self, wait: Duration) -> bool {
        loop {
            match tokio::time::timeout(wait, self.stream.next()).await {
                Err(_) => return true,
                Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => continue,
                Ok(_) => return false,
            }
        }
    }

    /// Wait for the server to close the socket.
    pub async fn expect_close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            let next = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .map_err(|_| "timeout waiting for close")?;
            match next {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return Ok(()),
                Some(Ok(_)) => continue,
            }
        }
    }

    pub async fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.stream.close(None).await?;
        Ok(())
    }
}
