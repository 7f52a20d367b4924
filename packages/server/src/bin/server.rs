//! Multi-instance WebSocket chat relay server.
//!
//! Every instance relays messages and the shared connection count through Redis,
//! so clients connected to different instances share one room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --port 3001 --redis-url redis://127.0.0.1:6379
//! cargo run --bin hiroba-server -- --backend memory
//! ```

use std::{sync::Arc, time::Duration};

use clap::{Parser, ValueEnum};
use hiroba_server::{
    domain::{BroadcastBus, CounterStore, InstanceId, RoomId},
    infrastructure::{
        broadcast_bus::{InMemoryBroadcastBus, RedisBroadcastBus},
        counter_store::{InMemoryCounterStore, RedisCounterStore},
        retry::RetryPolicy,
    },
    ui::{RelayConfig, Server},
};
use hiroba_shared::logger::setup_logger;

/// Where the shared counter and the broadcast bus live
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Redis, shared by every instance
    Redis,
    /// In-process, for a single standalone instance
    Memory,
}

#[derive(Parser, Debug)]
#[command(name = "hiroba-server")]
#[command(about = "Multi-instance WebSocket chat relay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Redis connection URL
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    redis_url: String,

    /// Backend for the shared counter and the bus
    #[arg(long, env = "HIROBA_BACKEND", value_enum, default_value = "redis")]
    backend: Backend,

    /// Room name; selects the counter key and the topics
    #[arg(long, env = "HIROBA_ROOM", default_value = "chat")]
    room: String,

    /// Instance identity (defaults to `{host}:{port}`)
    #[arg(long, env = "HIROBA_INSTANCE_ID")]
    instance_id: Option<String>,

    /// Longest accepted message, in characters
    #[arg(long, default_value = "280")]
    max_message_length: usize,

    /// Time allowed for shutdown reconciliation and connection drain
    #[arg(long, default_value = "500")]
    shutdown_grace_ms: u64,

    /// Retries for idempotent store calls and bus subscriptions
    #[arg(long, default_value = "2")]
    retry_max: u32,
}

impl Args {
    fn relay_config(&self) -> Result<RelayConfig, String> {
        let room = RoomId::new(self.room.clone()).map_err(|e| e.to_string())?;
        let instance = self
            .instance_id
            .clone()
            .unwrap_or_else(|| format!("{}:{}", self.host, self.port));
        let instance = InstanceId::new(instance).map_err(|e| e.to_string())?;

        let mut config = RelayConfig::new(room, instance);
        config.max_message_length = self.max_message_length;
        config.shutdown_grace = Duration::from_millis(self.shutdown_grace_ms);
        config.retry = RetryPolicy::new(self.retry_max);
        Ok(config)
    }
}

async fn connect_backend(
    args: &Args,
    retry: &RetryPolicy,
) -> Result<(Arc<dyn CounterStore>, Arc<dyn BroadcastBus>), String> {
    match args.backend {
        Backend::Memory => Ok((
            Arc::new(InMemoryCounterStore::new()),
            Arc::new(InMemoryBroadcastBus::new()),
        )),
        Backend::Redis => {
            let client = redis::Client::open(args.redis_url.as_str()).map_err(|e| e.to_string())?;
            let counter_store = RedisCounterStore::connect(client.clone(), retry.clone())
                .await
                .map_err(|e| e.to_string())?;
            let bus = RedisBroadcastBus::connect(client)
                .await
                .map_err(|e| e.to_string())?;
            Ok((Arc::new(counter_store), Arc::new(bus)))
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let config = match args.relay_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Startup is not retried: an unreachable store is fatal
    let (counter_store, bus) = match connect_backend(&args, &config.retry).await {
        Ok(backend) => backend,
        Err(e) => {
            tracing::error!("Failed to connect to {:?} backend: {}", args.backend, e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        instance = %config.instance,
        room = config.room.as_str(),
        "Using {:?} backend",
        args.backend
    );

    let server = Server::new(config, counter_store, bus);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
