//! Route planning: batches unassigned bookings into vehicle-sized stop
//! lists, optimizes each batch through the routing collaborator and persists
//! the results.
//!
//! Only the initial booking fetch can fail the whole run. Everything found
//! mid-plan (a group without vehicles, a batch the optimizer rejects)
//! degrades to a warning plus unassigned bookings so one bad batch never
//! blocks the rest.

use std::collections::VecDeque;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::PlanError;
use crate::external::google_routes::{
    ComputeRoutesInput, ComputedRoute, RoutingPreference, TravelMode, Waypoint,
    parse_duration_seconds,
};
use crate::models::booking::{Booking, BookingFilters, BookingStatus, BookingUpdate, GeoPoint};
use crate::models::route::{CreateRouteInput, Route, RouteStatus};
use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::traits::{BookingStore, RouteOptimizer, RouteStore, VehicleStore};

pub const DEFAULT_MAX_STOPS_PER_ROUTE: usize = 15;

#[derive(Debug, Clone)]
pub struct PlanRoutesInput {
    pub route_date: NaiveDate,
    pub service_id: Option<Uuid>,
    pub max_stops_per_route: Option<usize>,
    pub departure_location: Option<GeoPoint>,
    pub return_to_start: bool,
    pub routing_preference: Option<RoutingPreference>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlanSummary {
    pub total_bookings: usize,
    pub assigned_bookings: usize,
    pub routes_created: usize,
}

/// Best-effort planning result: created routes plus everything that could
/// not be assigned and why.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub routes: Vec<Route>,
    pub unassigned_bookings: Vec<Booking>,
    pub warnings: Vec<String>,
    pub summary: PlanSummary,
}

pub struct RoutePlanner<B, V, R, O> {
    bookings: B,
    vehicles: V,
    routes: R,
    optimizer: O,
}

impl<B, V, R, O> RoutePlanner<B, V, R, O>
where
    B: BookingStore,
    V: VehicleStore,
    R: RouteStore,
    O: RouteOptimizer,
{
    pub fn new(bookings: B, vehicles: V, routes: R, optimizer: O) -> Self {
        Self {
            bookings,
            vehicles,
            routes,
            optimizer,
        }
    }

    pub async fn plan_routes(&self, input: &PlanRoutesInput) -> Result<PlanOutcome, PlanError> {
        let max_stops = input
            .max_stops_per_route
            .unwrap_or(DEFAULT_MAX_STOPS_PER_ROUTE)
            .max(1);

        info!(
            route_date = %input.route_date,
            service_id = ?input.service_id,
            max_stops,
            "starting route planning"
        );

        let filters = BookingFilters {
            scheduled_date: input.route_date,
            status: Some(BookingStatus::Confirmed),
            service_id: input.service_id,
        };
        let all_bookings = self.bookings.get_bookings(&filters).await?;
        let total_bookings = all_bookings.len();

        if all_bookings.is_empty() {
            return Ok(PlanOutcome {
                routes: Vec::new(),
                unassigned_bookings: Vec::new(),
                warnings: vec!["No confirmed bookings found for the specified date".to_string()],
                summary: PlanSummary {
                    total_bookings: 0,
                    assigned_bookings: 0,
                    routes_created: 0,
                },
            });
        }

        let mut warnings: Vec<String> = Vec::new();
        let mut unassigned: Vec<Booking> = Vec::new();
        let mut eligible: Vec<Booking> = Vec::new();

        for booking in all_bookings {
            if booking.vehicle_id.is_some() {
                // already routed in an earlier run
                continue;
            }
            if booking.coordinates().is_none() {
                unassigned.push(booking);
            } else {
                eligible.push(booking);
            }
        }

        if !unassigned.is_empty() {
            warnings.push(format!(
                "{} booking(s) missing coordinates",
                unassigned.len()
            ));
        }

        let mut created_routes: Vec<Route> = Vec::new();
        let mut route_index = 1usize;

        for (service_id, group) in group_by_service(eligible) {
            let vehicles = match self
                .vehicles
                .vehicles_by_service_type(service_id, VehicleStatus::Available)
                .await
            {
                Ok(vehicles) => vehicles,
                Err(err) => {
                    warn!(service_id = %service_id, error = %err, "vehicle fetch failed");
                    warnings.push(format!(
                        "Failed to fetch vehicles for service {service_id}: {err}"
                    ));
                    unassigned.extend(group);
                    continue;
                }
            };

            if vehicles.is_empty() {
                warnings.push(format!("No available vehicles for service {service_id}"));
                unassigned.extend(group);
                continue;
            }

            // The pool is owned by this run; assigning a batch consumes the
            // vehicle so no vehicle serves two batches.
            let mut pool: VecDeque<Vehicle> = vehicles.into();
            let mut batches: VecDeque<Vec<Booking>> = chunk_bookings(group, max_stops).into();

            while let Some(batch) = batches.pop_front() {
                let Some(vehicle) = pool.pop_front() else {
                    let mut leftover = batch;
                    while let Some(rest) = batches.pop_front() {
                        leftover.extend(rest);
                    }
                    warnings.push(format!(
                        "Ran out of vehicles for service {service_id}: {} booking(s) left unassigned",
                        leftover.len()
                    ));
                    unassigned.extend(leftover);
                    break;
                };

                match self
                    .plan_batch(input, &batch, &vehicle, route_index, &mut warnings)
                    .await
                {
                    Some(route) => {
                        route_index += 1;
                        created_routes.push(route);
                    }
                    None => unassigned.extend(batch),
                }
            }
        }

        let summary = PlanSummary {
            total_bookings,
            assigned_bookings: created_routes.iter().map(|route| route.total_stops).sum(),
            routes_created: created_routes.len(),
        };

        info!(
            total_bookings = summary.total_bookings,
            assigned_bookings = summary.assigned_bookings,
            routes_created = summary.routes_created,
            warnings = warnings.len(),
            "route planning completed"
        );

        Ok(PlanOutcome {
            routes: created_routes,
            unassigned_bookings: unassigned,
            warnings,
            summary,
        })
    }

    async fn plan_batch(
        &self,
        input: &PlanRoutesInput,
        batch: &[Booking],
        vehicle: &Vehicle,
        route_index: usize,
        warnings: &mut Vec<String>,
    ) -> Option<Route> {
        if batch.is_empty() {
            return None;
        }

        let request = build_route_request(input, batch);
        let response = match self.optimizer.compute_routes(&request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(vehicle_id = %vehicle.id, error = %err, "batch optimization failed");
                warnings.push(format!("Failed to optimize route for batch: {err}"));
                return None;
            }
        };

        let Some(optimal) = response.routes.first() else {
            warnings.push("Failed to optimize route for batch: no routes returned".to_string());
            return None;
        };

        let stop_sequence = order_stop_sequence(
            batch,
            optimal,
            input.departure_location.is_some(),
            input.return_to_start,
        );

        let distance_meters = optimal.distance_meters.unwrap_or(0);
        let duration_seconds = optimal
            .duration
            .as_deref()
            .and_then(parse_duration_seconds)
            .unwrap_or(0);

        let create = CreateRouteInput {
            route_name: format!("Route {route_index} - {}", input.route_date),
            route_date: input.route_date,
            vehicle_id: vehicle.id,
            stop_sequence,
            total_distance_km: distance_meters as f64 / 1000.0,
            total_duration_minutes: (duration_seconds as f64 / 60.0).round() as i64,
            status: RouteStatus::Planned,
        };

        let route = match self.routes.create_route(&create).await {
            Ok(route) => route,
            Err(err) => {
                warn!(vehicle_id = %vehicle.id, error = %err, "route persistence failed");
                warnings.push(format!("Failed to create route: {err}"));
                return None;
            }
        };

        for booking_id in &route.stop_sequence {
            let update = BookingUpdate {
                id: *booking_id,
                vehicle_id: Some(vehicle.id),
                status: Some(BookingStatus::Scheduled),
            };
            if let Err(err) = self.bookings.update_booking(&update).await {
                warnings.push(format!("Failed to update booking {booking_id}: {err}"));
            }
        }

        info!(
            route_id = %route.id,
            vehicle_id = %vehicle.id,
            stops = route.total_stops,
            "route created"
        );
        Some(route)
    }
}

/// Groups bookings by service id, first-seen order, preserving fetch order
/// within each group.
fn group_by_service(bookings: Vec<Booking>) -> Vec<(Uuid, Vec<Booking>)> {
    let mut groups: Vec<(Uuid, Vec<Booking>)> = Vec::new();
    for booking in bookings {
        match groups
            .iter_mut()
            .find(|(service_id, _)| *service_id == booking.service_id)
        {
            Some((_, members)) => members.push(booking),
            None => groups.push((booking.service_id, vec![booking])),
        }
    }
    groups
}

/// Consecutive batches of at most `size` stops; no reordering before
/// batching, geographic optimization happens inside the routing call.
fn chunk_bookings(bookings: Vec<Booking>, size: usize) -> Vec<Vec<Booking>> {
    bookings.chunks(size).map(<[Booking]>::to_vec).collect()
}

fn stop_waypoint(booking: &Booking) -> Waypoint {
    match booking.coordinates() {
        Some(point) => Waypoint::from_geo(point).with_stopover(),
        // unreachable for batched bookings; an empty waypoint fails
        // validation downstream instead of panicking here
        None => Waypoint::default(),
    }
}

fn build_route_request(input: &PlanRoutesInput, batch: &[Booking]) -> ComputeRoutesInput {
    let origin = match input.departure_location {
        Some(point) => Waypoint::from_geo(point),
        None => batch.first().map(stop_waypoint).unwrap_or_default(),
    };

    let destination = if input.return_to_start {
        origin.clone()
    } else {
        batch.last().map(stop_waypoint).unwrap_or_default()
    };

    let start_idx = if input.departure_location.is_some() {
        0
    } else {
        1
    };
    let end_idx = if input.return_to_start {
        batch.len()
    } else {
        batch.len().saturating_sub(1)
    };
    let intermediates = if start_idx < end_idx {
        batch[start_idx..end_idx].iter().map(stop_waypoint).collect()
    } else {
        Vec::new()
    };

    ComputeRoutesInput {
        origin,
        destination,
        intermediates,
        travel_mode: Some(TravelMode::Drive),
        routing_preference: input.routing_preference,
        optimize_waypoint_order: Some(true),
        compute_alternative_routes: Some(false),
        ..ComputeRoutesInput::default()
    }
}

/// Maps the optimizer's intermediate permutation back onto batch positions.
/// The permutation indexes intermediates only, so origin and destination
/// stops are re-inserted around it.
fn order_stop_sequence(
    batch: &[Booking],
    route: &ComputedRoute,
    has_departure: bool,
    return_to_start: bool,
) -> Vec<Uuid> {
    let optimized = route
        .optimized_intermediate_waypoint_index
        .as_deref()
        .unwrap_or(&[]);

    if optimized.is_empty() {
        return batch.iter().map(|booking| booking.id).collect();
    }

    let offset = if has_departure { 0 } else { 1 };
    let mut sequence: Vec<Uuid> = Vec::with_capacity(batch.len());

    if !has_departure {
        if let Some(first) = batch.first() {
            sequence.push(first.id);
        }
    }

    for &intermediate_idx in optimized {
        if let Some(booking) = batch.get(intermediate_idx + offset) {
            if !sequence.contains(&booking.id) {
                sequence.push(booking.id);
            }
        }
    }

    if !return_to_start {
        if let Some(last) = batch.last() {
            if !sequence.contains(&last.id) {
                sequence.push(last.id);
            }
        }
    }

    // Anything the permutation missed keeps its original position at the end.
    for booking in batch {
        if !sequence.contains(&booking.id) {
            sequence.push(booking.id);
        }
    }

    sequence
}
