//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use tracing::Level;

use crate::{
    domain::{ClientHandle, ConnectionCount, MessageText},
    infrastructure::dto::websocket::SendMessageRequest,
    ui::state::AppState,
    usecase::DisconnectError,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, StatusCode> {
    // Create a channel for this client to receive messages
    let (tx, rx) = mpsc::unbounded_channel();

    // Register locally and bump the shared counter before the upgrade,
    // so the count-update produced by this connect is queued for this client too
    match state.connect_client_usecase.execute(tx).await {
        Ok(connected) => {
            tracing::info!(
                "Client '{}' connected (count: {:?})",
                connected.handle,
                connected.count.map(|c| c.value())
            );
            let handle = connected.handle;
            let state_for_failure = state.clone();
            Ok(ws
                .on_failed_upgrade(move |e| {
                    tracing::warn!("WebSocket upgrade failed for '{}': {}", handle, e);
                    tokio::spawn(async move {
                        let result = state_for_failure
                            .disconnect_client_usecase
                            .execute(&handle)
                            .await;
                        log_disconnect(&handle, &result);
                    });
                })
                .on_upgrade(move |socket| handle_socket(socket, state, rx, handle)))
        }
        Err(e) => {
            tracing::warn!("Failed to register client: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// The loop ends when the channel is unregistered from the MessagePusher
/// (disconnect or shutdown) or when the socket can no longer be written to.
///
/// # Arguments
///
/// * `rx` - Channel receiver for frames relayed from the bus
/// * `sender` - WebSocket sink to send messages to this client
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    rx: mpsc::UnboundedReceiver<String>,
    handle: ClientHandle,
) {
    let (sender, mut receiver) = socket.split();
    let state_clone = state.clone();

    // Spawn a task to receive messages from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!("WebSocket error on '{}': {}", handle, e);
                    break;
                }
            };

            match msg {
                Message::Text(frame) => {
                    let text = SendMessageRequest::text_from_frame(&frame);
                    let text = match MessageText::new(text, state_clone.max_message_length) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!("Dropping message from '{}': {}", handle, e);
                            continue;
                        }
                    };

                    // Local → Bus. Delivery, including to this client, comes back through the bus
                    if let Err(e) = state_clone.publish_message_usecase.execute(text).await {
                        tracing::debug!("Message from '{}' was not published: {}", handle, e);
                    }
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", handle);
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                _ => {}
            }
        }
    });

    // Spawn a task to push relayed frames to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    let result = state.disconnect_client_usecase.execute(&handle).await;
    log_disconnect(&handle, &result);
}

/// Logs the outcome of a disconnect and returns the level it was logged at
fn log_disconnect(
    handle: &ClientHandle,
    result: &Result<Option<ConnectionCount>, DisconnectError>,
) -> Level {
    match result {
        Ok(count) => {
            tracing::info!(
                "Client '{}' disconnected (count: {:?})",
                handle,
                count.map(|c| c.value())
            );
            Level::INFO
        }
        // Already reclaimed by the shutdown reconciliation
        Err(DisconnectError::NotConnected(_)) => {
            tracing::debug!("Client '{}' was already removed", handle);
            Level::DEBUG
        }
        Err(e) => {
            tracing::warn!("Failed to disconnect client '{}': {}", handle, e);
            Level::WARN
        }
    }
}
