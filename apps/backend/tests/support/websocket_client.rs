// WebSocket client utilities for testing

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// WebSocket test client speaking the JSON game protocol
pub struct WebSocketClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketClient {
    /// Connect, retrying until success or timeout.
    pub async fn connect_retry(
        url: &str,
        timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let start = tokio::time::Instant::now();
        loop {
            match connect_async(url).await {
                Ok((stream, _)) => return Ok(Self { stream }),
                Err(err) => {
                    if start.elapsed() >= timeout {
                        return Err(Box::new(err));
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            }
        }
    }

    /// Connect and consume the `hello` greeting, which is returned.
    pub async fn connect_greeted(url: &str) -> Result<(Self, Value), Box<dyn std::error::Error>> {
        let mut client = Self::connect_retry(url, Duration::from_secs(1)).await?;
        let hello = client.recv_type("hello").await?;
        Ok((client, hello))
    }

    /// Send a JSON message
    pub async fn send_json(&mut self, value: Value) -> Result<(), Box<dyn std::error::Error>> {
        self.stream.send(Message::text(value.to_string())).await?;
        Ok(())
    }

    /// Send raw text
    pub async fn send_text(&mut self, text: &str) -> Result<(), Box<dyn std::error::Error>> {
        self.stream.send(Message::text(text.to_string())).await?;
        Ok(())
    }

    /// Next JSON message, or `None` when the server closed the socket.
    pub async fn recv_json(&mut self) -> Result<Option<Value>, Box<dyn std::error::Error>> {
        loop {
            let next = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .map_err(|_| "timeout waiting for message")?;
            match next.transpose()? {
                Some(Message::Text(text)) => return Ok(Some(serde_json::from_str(text.as_str())?)),
                Some(Message::Close(_)) | None => return Ok(None),
                // Pings and pongs are transport noise here.
                Some(_) => continue,
            }
        }
    }

    /// Skip messages until one of `kind` arrives.
    pub async fn recv_type(&mut self, kind: &str) -> Result<Value, Box<dyn std::error::Error>> {
        loop {
            match self.recv_json().await? {
                Some(msg) if msg["type"] == kind => return Ok(msg),
                Some(_) => continue,
                None => return Err(format!("socket closed before a {kind} message").into()),
            }
        }
    }

    pub async fn login(&mut self, id: &str, name: &str) -> Result<Value, Box<dyn std::error::Error>> {
        self.send_json(json!({"type": "login", "id": id, "name": name}))
            .await?;
        self.recv_type("logged_in").await
    }

    /// Create an English game and return its id from the `created` ack.
    pub async fn create_game(&mut self) -> Result<String, Box<dyn std::error::Error>> {
        self.send_json(json!({"type": "create", "language": "en"}))
            .await?;
        let created = self.recv_type("created").await?;
        created["game"]["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| "created without a game id".into())
    }

    /// Close the connection
    pub async fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.stream.close(None).await?;
        Ok(())
    }
}
