use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Available,
    InService,
    Maintenance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub name: String,
    /// Service identifiers this vehicle is equipped to serve.
    pub service_types: Vec<Uuid>,
    pub status: VehicleStatus,
}
