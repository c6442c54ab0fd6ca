use std::time::Duration;

use tracing_subscriber::EnvFilter;

use fleet_dispatch::config::Config;
use fleet_dispatch::engine::planner::{PlanRoutesInput, RoutePlanner};
use fleet_dispatch::error::AppError;
use fleet_dispatch::external::google_routes::{GoogleRoutesClient, RoutesConfig};
use fleet_dispatch::models::booking::Booking;
use fleet_dispatch::models::vehicle::Vehicle;
use fleet_dispatch::stores::{MemoryBookingStore, MemoryRouteStore, MemoryVehicleStore};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(route_date), Some(bookings_path), Some(vehicles_path)) =
        (args.next(), args.next(), args.next())
    else {
        return Err(AppError::Internal(
            "usage: fleet-dispatch <route-date> <bookings.json> <vehicles.json>".to_string(),
        ));
    };

    let route_date = route_date
        .parse::<chrono::NaiveDate>()
        .map_err(|err| AppError::Internal(format!("invalid route date: {err}")))?;

    let bookings: Vec<Booking> = read_json(&bookings_path)?;
    let vehicles: Vec<Vehicle> = read_json(&vehicles_path)?;
    tracing::info!(
        bookings = bookings.len(),
        vehicles = vehicles.len(),
        "loaded planning data"
    );

    let booking_store = MemoryBookingStore::with_bookings(bookings);
    let vehicle_store = MemoryVehicleStore::with_vehicles(vehicles);
    let route_store = MemoryRouteStore::new();

    let optimizer = GoogleRoutesClient::new(RoutesConfig {
        api_key: config.google_api_key.clone(),
        base_url: config.routes_api_base_url.clone(),
        timeout: Duration::from_millis(config.request_timeout_ms),
        max_retries: config.max_retries,
        retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
    })
    .map_err(|err| AppError::Internal(format!("failed to build routing client: {err}")))?;

    let planner = RoutePlanner::new(booking_store, vehicle_store, route_store, optimizer);

    let input = PlanRoutesInput {
        route_date,
        service_id: None,
        max_stops_per_route: Some(config.max_stops_per_route),
        departure_location: None,
        return_to_start: false,
        routing_preference: None,
    };

    let outcome = planner
        .plan_routes(&input)
        .await
        .map_err(|err| AppError::Internal(err.to_string()))?;

    let rendered = serde_json::to_string_pretty(&outcome)
        .map_err(|err| AppError::Internal(format!("failed to render outcome: {err}")))?;
    println!("{rendered}");

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, AppError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| AppError::Internal(format!("failed to read {path}: {err}")))?;
    serde_json::from_str(&raw)
        .map_err(|err| AppError::Internal(format!("failed to parse {path}: {err}")))
}
