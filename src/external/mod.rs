pub mod google_routes;
pub mod retry;
