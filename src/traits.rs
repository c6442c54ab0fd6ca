//! Collaborator seams for the planning and dispatch engines.
//!
//! The CRUD services, routing provider and channel transports live outside
//! this crate; the engines only talk to them through these traits.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{RoutesError, SendError, StoreError};
use crate::external::google_routes::{ComputeRoutesInput, ComputeRoutesResponse};
use crate::models::booking::{Booking, BookingFilters, BookingUpdate};
use crate::models::driver::{Channel, Driver};
use crate::models::route::{CreateRouteInput, Route};
use crate::models::vehicle::{Vehicle, VehicleStatus};

#[async_trait]
pub trait BookingStore {
    async fn get_bookings(&self, filters: &BookingFilters) -> Result<Vec<Booking>, StoreError>;

    async fn update_booking(&self, update: &BookingUpdate) -> Result<(), StoreError>;
}

#[async_trait]
pub trait VehicleStore {
    async fn vehicles_by_service_type(
        &self,
        service_id: Uuid,
        status: VehicleStatus,
    ) -> Result<Vec<Vehicle>, StoreError>;
}

#[async_trait]
pub trait RouteStore {
    async fn create_route(&self, input: &CreateRouteInput) -> Result<Route, StoreError>;
}

/// External route-optimization collaborator. Implemented by the Google
/// Routes client; tests substitute scripted responses.
#[async_trait]
pub trait RouteOptimizer {
    async fn compute_routes(
        &self,
        input: &ComputeRoutesInput,
    ) -> Result<ComputeRoutesResponse, RoutesError>;
}

/// Channel transport collaborator. Returns the provider message id on
/// success.
#[async_trait]
pub trait ChannelSender {
    async fn send(
        &self,
        channel: Channel,
        driver: &Driver,
        message: &str,
    ) -> Result<String, SendError>;
}
