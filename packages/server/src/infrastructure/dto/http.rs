//! HTTP response DTOs.

use serde::{Deserialize, Serialize};

/// `GET /healthcheck`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthDto {
    pub status: String,
    pub instance: String,
    pub port: u16,
}

/// `GET /debug/connections`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionsDto {
    pub room: String,
    pub instance: String,
    pub local_connections: usize,
    /// Connections whose increment reached the shared counter
    pub counted_connections: usize,
}
