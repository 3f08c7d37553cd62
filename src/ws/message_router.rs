use async_trait::async_trait;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    error::Result,
    models::{WebSocketMessage, message::MessageType},
    ws::connection::SharedConnectionManager,
};

/// Message router trait for handling websocket messages
#[async_trait]
pub trait MessageRouter: Send + Sync {
    async fn route_message(
        &self,
        connection_id: Uuid,
        message: WebSocketMessage<Value>,
        connection_manager: SharedConnectionManager,
    ) -> Result<()>;
}

/// Dashboards only listen for notifications; the one request they send is a ping.
pub struct DefaultMessageRouter;

impl DefaultMessageRouter {
    pub fn new() -> Self {
        Self
    }

    async fn handle_ping(
        &self,
        connection_id: Uuid,
        connection_manager: SharedConnectionManager,
    ) -> Result<()> {
        let message = WebSocketMessage::new(MessageType::Pong, Value::Null);
        connection_manager.send_to(&connection_id, message).await
    }

    async fn reject(
        &self,
        connection_id: Uuid,
        message_type: &str,
        connection_manager: SharedConnectionManager,
    ) -> Result<()> {
        tracing::warn!("Unknown message type: {}", message_type);
        let message = WebSocketMessage::new(
            MessageType::Error,
            json!({ "error": format!("Unsupported message type: {}", message_type) }),
        );
        connection_manager.send_to(&connection_id, message).await
    }
}

impl Default for DefaultMessageRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageRouter for DefaultMessageRouter {
    async fn route_message(
        &self,
        connection_id: Uuid,
        message: WebSocketMessage<Value>,
        connection_manager: SharedConnectionManager,
    ) -> Result<()> {
        match message.type_.as_str() {
            "ping" => self.handle_ping(connection_id, connection_manager).await,
            other => self.reject(connection_id, other, connection_manager).await,
        }
    }
}
