//! Server execution logic.

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use hiroba_shared::time::{Clock, SystemClock};
use thiserror::Error;
use tokio::{
    net::TcpListener,
    sync::{Mutex, watch},
};
use tower_http::trace::TraceLayer;

use crate::{
    domain::{
        BroadcastBus, ConnectionRepository, CounterStore, DEFAULT_MAX_MESSAGE_CHARS,
        ErrorReporter, InstanceId, MessagePusher, Room, RoomChannels, RoomId, StoreError,
    },
    infrastructure::{
        message_pusher::WebSocketMessagePusher, reporter::TracingErrorReporter,
        repository::InMemoryConnectionRepository, retry::RetryPolicy,
    },
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, PublishMessageUseCase, RelayUseCase,
        ReconcileShutdownUseCase,
    },
};

use super::{
    handler::{debug_connections, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
    subscriber::BusRelay,
};

/// Startup and serving errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("counter store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("server error: {0}")]
    Serve(String),
}

/// Per-instance relay settings
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Room whose counter key and topics this instance uses
    pub room: RoomId,
    /// Identity reported in relayed messages and the health check
    pub instance: InstanceId,
    /// Longest accepted message, in characters
    pub max_message_length: usize,
    /// Bound on shutdown reconciliation and on draining connections
    pub shutdown_grace: Duration,
    /// Retry policy for bus subscriptions
    pub retry: RetryPolicy,
}

impl RelayConfig {
    pub fn new(room: RoomId, instance: InstanceId) -> Self {
        Self {
            room,
            instance,
            max_message_length: DEFAULT_MAX_MESSAGE_CHARS,
            shutdown_grace: Duration::from_millis(500),
            retry: RetryPolicy::default(),
        }
    }
}

/// WebSocket chat relay server
///
/// Owns the local connection registry of one instance and wires it to the
/// shared counter store and broadcast bus.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(config, counter_store, bus);
/// server.run("0.0.0.0".to_string(), 3000).await?;
/// ```
pub struct Server {
    config: RelayConfig,
    channels: RoomChannels,
    counter_store: Arc<dyn CounterStore>,
    bus: Arc<dyn BroadcastBus>,
    reporter: Arc<dyn ErrorReporter>,
    /// ローカル接続レジストリ
    repository: Arc<dyn ConnectionRepository>,
    connect_client_usecase: Arc<ConnectClientUseCase>,
    disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    publish_message_usecase: Arc<PublishMessageUseCase>,
    relay_usecase: Arc<RelayUseCase>,
    reconcile_shutdown_usecase: Arc<ReconcileShutdownUseCase>,
}

impl Server {
    /// Create a server that logs failures with `tracing` and uses the system clock
    pub fn new(
        config: RelayConfig,
        counter_store: Arc<dyn CounterStore>,
        bus: Arc<dyn BroadcastBus>,
    ) -> Self {
        let reporter = Arc::new(TracingErrorReporter::new(config.instance.clone()));
        Self::with_parts(config, counter_store, bus, reporter, Arc::new(SystemClock))
    }

    /// Create a server with an explicit error reporter and clock
    pub fn with_parts(
        config: RelayConfig,
        counter_store: Arc<dyn CounterStore>,
        bus: Arc<dyn BroadcastBus>,
        reporter: Arc<dyn ErrorReporter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let channels = RoomChannels::for_room(config.room.clone());

        // 1. Repository (local connection registry)
        let room = Arc::new(Mutex::new(Room::new(config.room.clone())));
        let repository: Arc<dyn ConnectionRepository> =
            Arc::new(InMemoryConnectionRepository::new(room));

        // 2. MessagePusher (WebSocket implementation)
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new(
            Arc::new(Mutex::new(HashMap::new())),
        ));

        // 3. UseCases
        let connect_client_usecase = Arc::new(ConnectClientUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            counter_store.clone(),
            bus.clone(),
            channels.clone(),
            clock.clone(),
            reporter.clone(),
        ));
        let disconnect_client_usecase = Arc::new(DisconnectClientUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            counter_store.clone(),
            bus.clone(),
            channels.clone(),
            reporter.clone(),
        ));
        let publish_message_usecase = Arc::new(PublishMessageUseCase::new(
            bus.clone(),
            channels.clone(),
            reporter.clone(),
        ));
        let relay_usecase = Arc::new(RelayUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            clock,
            config.instance.clone(),
            reporter.clone(),
        ));
        let reconcile_shutdown_usecase = Arc::new(ReconcileShutdownUseCase::new(
            repository.clone(),
            message_pusher,
            counter_store.clone(),
            bus.clone(),
            channels.clone(),
            reporter.clone(),
        ));

        Self {
            config,
            channels,
            counter_store,
            bus,
            reporter,
            repository,
            connect_client_usecase,
            disconnect_client_usecase,
            publish_message_usecase,
            relay_usecase,
            reconcile_shutdown_usecase,
        }
    }

    /// Make sure the shared counter exists, initializing it to 0 if absent
    ///
    /// # Errors
    ///
    /// Returns `ServerError::StoreUnavailable` when the store cannot be reached.
    pub async fn prepare(&self) -> Result<(), ServerError> {
        let created = self
            .counter_store
            .ensure_initialized(&self.channels.counter_key)
            .await?;
        if created {
            tracing::info!(key = %self.channels.counter_key, "Initialized shared connection count");
        }
        Ok(())
    }

    /// Run the relay server until Ctrl+C or SIGTERM
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "0.0.0.0")
    /// * `port` - The port number to bind to (e.g., 3000)
    ///
    /// # Errors
    ///
    /// Returns an error if the counter store is unreachable, if the server fails
    /// to bind to the specified address, or if serving fails.
    pub async fn run(self, host: String, port: u16) -> Result<(), ServerError> {
        self.prepare().await?;

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: bind_addr.clone(),
                reason: e.to_string(),
            })?;
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// On shutdown: stop accepting connections, reconcile the shared counter for
    /// the clients still connected here, then wait for connections to drain.
    /// Both steps are bounded by the configured grace period.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        // Bus → Local: subscriptions are in place before the first client is accepted
        let bus_relay = Arc::new(BusRelay::new(
            self.bus.clone(),
            self.relay_usecase.clone(),
            self.channels.clone(),
            self.config.retry.clone(),
            self.reporter.clone(),
        ));
        let relay_tasks = bus_relay.start().await;

        let app_state = Arc::new(AppState {
            connect_client_usecase: self.connect_client_usecase.clone(),
            disconnect_client_usecase: self.disconnect_client_usecase.clone(),
            publish_message_usecase: self.publish_message_usecase.clone(),
            repository: self.repository.clone(),
            instance: self.config.instance.clone(),
            port: local_addr.port(),
            max_message_length: self.config.max_message_length,
        });

        // Define handlers
        let app = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/healthcheck", get(health_check))
            .route("/debug/connections", get(debug_connections))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state);

        tracing::info!(
            instance = %self.config.instance,
            room = self.config.room.as_str(),
            "Chat relay listening on {}",
            local_addr
        );

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let mut server_task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.wait_for(|stop| *stop).await;
                })
                .await
        });

        tokio::select! {
            _ = shutdown => {}
            result = &mut server_task => {
                relay_tasks.iter().for_each(|task| task.abort());
                return match result {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(ServerError::Serve(e.to_string())),
                    Err(e) => Err(ServerError::Serve(e.to_string())),
                };
            }
        }

        // 1. Stop accepting new connections
        let _ = stop_tx.send(true);
        tracing::info!("No longer accepting connections");

        // 2. Reconcile the shared counter for clients still connected here
        let grace = self.config.shutdown_grace;
        match self.reconcile_shutdown_usecase.execute_within(grace).await {
            Ok(outcome) => tracing::info!(
                drained = outcome.drained,
                subtracted = outcome.subtracted,
                previous = ?outcome.previous,
                current = ?outcome.current,
                "Shared connection count reconciled"
            ),
            Err(e) => tracing::warn!("Exiting without reconciliation: {}", e),
        }
        relay_tasks.iter().for_each(|task| task.abort());

        // 3. Wait for connections to drain
        let result = match tokio::time::timeout(grace, &mut server_task).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(ServerError::Serve(e.to_string())),
            Ok(Err(e)) => Err(ServerError::Serve(e.to_string())),
            Err(_) => {
                tracing::warn!("Connections did not drain within {:?}", grace);
                server_task.abort();
                Ok(())
            }
        };

        tracing::info!("Server shutdown complete");
        result
    }
}
