//! Shared fixtures for use case tests.

use std::{collections::HashMap, error::Error, sync::Arc};

use tokio::sync::Mutex;

use crate::{
    domain::{ErrorReporter, FailureKind, InstanceId, Room, RoomChannels, RoomId},
    infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryConnectionRepository,
    },
};

/// Collects reported failures instead of logging them.
#[derive(Default)]
pub struct RecordingReporter {
    reports: std::sync::Mutex<Vec<(FailureKind, String)>>,
}

impl RecordingReporter {
    pub fn kinds(&self) -> Vec<FailureKind> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .map(|(kind, _)| *kind)
            .collect()
    }

    pub fn operations(&self) -> Vec<String> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .map(|(_, operation)| operation.clone())
            .collect()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, kind: FailureKind, operation: &str, _error: &dyn Error) {
        self.reports
            .lock()
            .unwrap()
            .push((kind, operation.to_string()));
    }
}

pub fn test_channels() -> RoomChannels {
    RoomChannels::for_room(RoomId::new("chat".to_string()).unwrap())
}

pub fn test_instance() -> InstanceId {
    InstanceId::new("node-1".to_string()).unwrap()
}

pub fn create_test_repository() -> Arc<InMemoryConnectionRepository> {
    let room = Arc::new(Mutex::new(Room::new(test_channels().room)));
    Arc::new(InMemoryConnectionRepository::new(room))
}

pub fn create_test_message_pusher() -> Arc<WebSocketMessagePusher> {
    let clients = Arc::new(Mutex::new(HashMap::new()));
    Arc::new(WebSocketMessagePusher::new(clients))
}
