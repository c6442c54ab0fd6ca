//! In-memory collaborator implementations backed by `DashMap`.
//!
//! Handles are cheap clones sharing the same maps, so a caller can keep one
//! to inspect state after handing the store to a planner.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::booking::{Booking, BookingFilters, BookingUpdate};
use crate::models::route::{CreateRouteInput, Route};
use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::traits::{BookingStore, RouteStore, VehicleStore};

#[derive(Clone, Default)]
pub struct MemoryBookingStore {
    bookings: Arc<DashMap<Uuid, Booking>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bookings(bookings: impl IntoIterator<Item = Booking>) -> Self {
        let store = Self::new();
        for booking in bookings {
            store.insert(booking);
        }
        store
    }

    pub fn insert(&self, booking: Booking) {
        self.bookings.insert(booking.id, booking);
    }

    pub fn get(&self, id: Uuid) -> Option<Booking> {
        self.bookings.get(&id).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn get_bookings(&self, filters: &BookingFilters) -> Result<Vec<Booking>, StoreError> {
        let mut matches: Vec<Booking> = self
            .bookings
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|booking| booking.scheduled_date == filters.scheduled_date)
            .filter(|booking| {
                filters
                    .status
                    .is_none_or(|status| booking.status == status)
            })
            .filter(|booking| {
                filters
                    .service_id
                    .is_none_or(|service_id| booking.service_id == service_id)
            })
            .collect();

        // DashMap iteration order is arbitrary; keep results stable.
        matches.sort_by_key(|booking| booking.id);
        Ok(matches)
    }

    async fn update_booking(&self, update: &BookingUpdate) -> Result<(), StoreError> {
        let mut booking = self
            .bookings
            .get_mut(&update.id)
            .ok_or_else(|| StoreError(format!("booking {} not found", update.id)))?;

        if let Some(vehicle_id) = update.vehicle_id {
            booking.vehicle_id = Some(vehicle_id);
        }
        if let Some(status) = update.status {
            booking.status = status;
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryVehicleStore {
    vehicles: Arc<DashMap<Uuid, Vehicle>>,
}

impl MemoryVehicleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vehicles(vehicles: impl IntoIterator<Item = Vehicle>) -> Self {
        let store = Self::new();
        for vehicle in vehicles {
            store.insert(vehicle);
        }
        store
    }

    pub fn insert(&self, vehicle: Vehicle) {
        self.vehicles.insert(vehicle.id, vehicle);
    }
}

#[async_trait]
impl VehicleStore for MemoryVehicleStore {
    async fn vehicles_by_service_type(
        &self,
        service_id: Uuid,
        status: VehicleStatus,
    ) -> Result<Vec<Vehicle>, StoreError> {
        let mut matches: Vec<Vehicle> = self
            .vehicles
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|vehicle| vehicle.status == status)
            .filter(|vehicle| vehicle.service_types.contains(&service_id))
            .collect();

        matches.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(matches)
    }
}

#[derive(Clone, Default)]
pub struct MemoryRouteStore {
    routes: Arc<DashMap<Uuid, Route>>,
}

impl MemoryRouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<Route> {
        let mut routes: Vec<Route> = self.routes.iter().map(|entry| entry.value().clone()).collect();
        routes.sort_by_key(|route| route.created_at);
        routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[async_trait]
impl RouteStore for MemoryRouteStore {
    async fn create_route(&self, input: &CreateRouteInput) -> Result<Route, StoreError> {
        let route = Route {
            id: Uuid::new_v4(),
            route_name: input.route_name.clone(),
            route_date: input.route_date,
            vehicle_id: input.vehicle_id,
            stop_sequence: input.stop_sequence.clone(),
            total_stops: input.stop_sequence.len(),
            total_distance_km: input.total_distance_km,
            total_duration_minutes: input.total_duration_minutes,
            status: input.status,
            created_at: Utc::now(),
        };

        self.routes.insert(route.id, route.clone());
        Ok(route)
    }
}
