//! Domain layer for the chat relay.
//!
//! Value objects, entities and the ports (traits) the use cases depend on.
//! Concrete adapters live in the infrastructure layer.

pub mod broadcast_bus;
pub mod counter_store;
pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod reporter;
pub mod repository;
pub mod value_object;

pub use broadcast_bus::{BroadcastBus, BusSubscription};
#[cfg(test)]
pub use broadcast_bus::MockBroadcastBus;
pub use counter_store::CounterStore;
#[cfg(test)]
pub use counter_store::MockCounterStore;
pub use entity::{ChatMessage, Connection, Room};
pub use error::{
    BusError, MessagePushError, RepositoryError, RoomError, StoreError, ValueObjectError,
};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use reporter::{ErrorReporter, FailureKind};
pub use repository::ConnectionRepository;
pub use value_object::{
    ClientHandle, ConnectionCount, CounterKey, DEFAULT_MAX_MESSAGE_CHARS, InstanceId, MessageId,
    MessageText, RoomChannels, RoomId, Timestamp, Topic,
};
