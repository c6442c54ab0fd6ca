use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub route_name: String,
    pub route_date: NaiveDate,
    pub vehicle_id: Uuid,
    /// Booking ids in visit order.
    pub stop_sequence: Vec<Uuid>,
    pub total_stops: usize,
    pub total_distance_km: f64,
    pub total_duration_minutes: i64,
    pub status: RouteStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateRouteInput {
    pub route_name: String,
    pub route_date: NaiveDate,
    pub vehicle_id: Uuid,
    pub stop_sequence: Vec<Uuid>,
    pub total_distance_km: f64,
    pub total_duration_minutes: i64,
    pub status: RouteStatus,
}
