use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::driver::Channel;

/// Request to notify a driver about a route. `channels` is a caller override
/// and takes precedence over the driver's own preference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub route_id: Uuid,
    pub driver_id: Uuid,
    #[serde(default)]
    pub channels: Option<Vec<Channel>>,
    #[serde(default)]
    pub multi_channel: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DispatchStatus {
    Sent,
    Partial,
    Failed,
}

/// One delivery attempt over a single channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelAttempt {
    pub channel: Channel,
    pub success: bool,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub status: DispatchStatus,
    pub attempts: Vec<ChannelAttempt>,
}
