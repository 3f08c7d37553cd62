use std::{collections::HashMap, sync::Arc};

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{
    RwLock,
    mpsc::{self, error::TrySendError},
};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{Notification, WebSocketMessage, message::MessageType},
    ws::message_router::MessageRouter,
};

/// Registry of connected dashboards; the explicit channel notifications travel through
pub struct ConnectionManager {
    connections: RwLock<HashMap<Uuid, mpsc::Sender<Message>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection
    pub async fn register(&self, id: Uuid, sender: mpsc::Sender<Message>) {
        let mut connections = self.connections.write().await;
        connections.insert(id, sender);
        tracing::info!("Registered connection {}", id);
    }

    /// Unregister a connection
    pub async fn unregister(&self, id: &Uuid) {
        let mut connections = self.connections.write().await;
        connections.remove(id);
        tracing::info!("Unregistered connection {}", id);
    }

    /// Send a message to a specific connection
    pub async fn send_to(&self, connection_id: &Uuid, message: impl Serialize) -> Result<()> {
        let sender = self
            .connections
            .read()
            .await
            .get(connection_id)
            .cloned()
            .ok_or_else(|| {
                AppError::WebSocket(format!("Connection {} not found", connection_id))
            })?;

        let message_json = serde_json::to_string(&message)?;
        sender
            .send(Message::Text(message_json.into()))
            .await
            .map_err(|e| {
                tracing::error!("Failed to send message to {}: {}", connection_id, e);
                AppError::WebSocket(format!("Failed to send message: {}", e))
            })
    }

    /// Broadcast a message to all connections.
    ///
    /// Never waits on a slow client: a full queue drops the message for that
    /// client, a closed one is unregistered.
    pub async fn broadcast(&self, message: impl Serialize) -> Result<()> {
        let message_json = serde_json::to_string(&message)?;
        let senders: Vec<(Uuid, mpsc::Sender<Message>)> = {
            let connections = self.connections.read().await;
            connections
                .iter()
                .map(|(id, sender)| (*id, sender.clone()))
                .collect()
        };

        let mut closed = Vec::new();
        for (id, sender) in senders {
            match sender.try_send(Message::Text(message_json.clone().into())) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!("Connection {} is not keeping up, message dropped", id);
                }
                Err(TrySendError::Closed(_)) => closed.push(id),
            }
        }

        for id in closed {
            self.unregister(&id).await;
        }

        Ok(())
    }

    /// Push a notification to every dashboard. Delivery problems are logged,
    /// never surfaced to the operation that triggered the notification.
    pub async fn notify(&self, notification: Notification) {
        tracing::debug!(kind = ?notification.kind, "{}", notification.message);
        let message = WebSocketMessage::new(MessageType::Notification, notification);
        if let Err(e) = self.broadcast(message).await {
            tracing::error!("Failed to broadcast notification: {}", e);
        }
    }

    /// Get the number of active connections
    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared state for the connection manager
pub type SharedConnectionManager = Arc<ConnectionManager>;

/// Handle a WebSocket connection
pub async fn handle_socket(
    socket: WebSocket,
    connection_manager: SharedConnectionManager,
    router: Arc<dyn MessageRouter>,
) {
    let connection_id = Uuid::new_v4();
    tracing::info!("New websocket connection: {}", connection_id);

    let (mut sender, mut receiver) = socket.split();

    // Outgoing messages for this client go through a channel
    let (tx, mut rx) = mpsc::channel::<Message>(100);
    connection_manager.register(connection_id, tx).await;

    let welcome = WebSocketMessage::new(
        MessageType::Notification,
        Notification::info("Connected to shipment notifications"),
    );
    if let Err(e) = connection_manager.send_to(&connection_id, welcome).await {
        tracing::error!("Error sending welcome notification: {}", e);
    }

    let mut forward_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = sender.send(message).await {
                tracing::error!("Error sending WebSocket message: {}", e);
                break;
            }
        }
    });

    let connection_manager_clone = connection_manager.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    tracing::debug!("Received message: {}", text.as_str());

                    match serde_json::from_str::<WebSocketMessage<Value>>(text.as_str()) {
                        Ok(message) => {
                            if let Err(e) = router
                                .route_message(
                                    connection_id,
                                    message,
                                    connection_manager_clone.clone(),
                                )
                                .await
                            {
                                tracing::error!("Error routing message: {}", e);
                            }
                        }
                        Err(e) => {
                            tracing::error!("Error parsing message: {}", e);
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Client disconnected");
                    break;
                }
                // Pings are answered by axum itself
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            }
        }
    });

    // Wait for either task to finish, then stop the other
    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => forward_task.abort(),
    }

    connection_manager.unregister(&connection_id).await;
    tracing::info!("WebSocket connection closed: {}", connection_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn next_json(rx: &mut mpsc::Receiver<Message>) -> Value {
        match rx.recv().await {
            Some(Message::Text(text)) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_notify_reaches_every_connection() {
        let manager = ConnectionManager::new();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        manager.register(Uuid::new_v4(), tx_a).await;
        manager.register(Uuid::new_v4(), tx_b).await;

        manager.notify(Notification::success("Client deleted")).await;

        for rx in [&mut rx_a, &mut rx_b] {
            let message = next_json(rx).await;
            assert_eq!(message["type_"], "notification");
            assert_eq!(message["data"]["kind"], "success");
            assert_eq!(message["data"]["message"], "Client deleted");
        }
    }

    #[tokio::test]
    async fn test_unregister_removes_connection() {
        let manager = ConnectionManager::new();
        let id = Uuid::new_v4();
        let (tx, _rx) = mpsc::channel(1);
        manager.register(id, tx).await;
        assert_eq!(manager.connection_count().await, 1);

        manager.unregister(&id).await;
        assert_eq!(manager.connection_count().await, 0);
        assert!(manager.send_to(&id, "hello").await.is_err());
    }

    #[tokio::test]
    async fn test_stalled_connection_does_not_block_notify() {
        let manager = ConnectionManager::new();
        let (tx_stalled, _rx_stalled) = mpsc::channel(1);
        let (tx_live, mut rx_live) = mpsc::channel(4);
        manager.register(Uuid::new_v4(), tx_stalled).await;
        manager.register(Uuid::new_v4(), tx_live).await;

        let within = std::time::Duration::from_secs(2);
        for message in ["Shipment created", "Shipment updated"] {
            tokio::time::timeout(within, manager.notify(Notification::success(message)))
                .await
                .expect("notify waited on a full connection");
        }

        let (tx_new, _rx_new) = mpsc::channel(1);
        tokio::time::timeout(within, manager.register(Uuid::new_v4(), tx_new))
            .await
            .expect("register waited on a full connection");
        assert_eq!(manager.connection_count().await, 3);

        assert_eq!(next_json(&mut rx_live).await["data"]["message"], "Shipment created");
        assert_eq!(next_json(&mut rx_live).await["data"]["message"], "Shipment updated");
    }

    #[tokio::test]
    async fn test_closed_connection_is_dropped_on_broadcast() {
        let manager = ConnectionManager::new();
        let (tx, rx) = mpsc::channel(1);
        manager.register(Uuid::new_v4(), tx).await;
        drop(rx);

        manager.notify(Notification::info("anyone there?")).await;
        assert_eq!(manager.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_notify_without_connections_is_silent() {
        let manager = ConnectionManager::new();
        manager.notify(Notification::error("nobody listens")).await;
        assert_eq!(manager.connection_count().await, 0);
    }
}
