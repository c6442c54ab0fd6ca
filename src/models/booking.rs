use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub service_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub service_latitude: Option<f64>,
    pub service_longitude: Option<f64>,
    pub status: BookingStatus,
    pub scheduled_date: NaiveDate,
}

impl Booking {
    /// A booking is routable only when both coordinates are present.
    pub fn coordinates(&self) -> Option<GeoPoint> {
        match (self.service_latitude, self.service_longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BookingFilters {
    pub scheduled_date: NaiveDate,
    pub status: Option<BookingStatus>,
    pub service_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct BookingUpdate {
    pub id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
}
