pub mod booking;
pub mod dispatch;
pub mod driver;
pub mod route;
pub mod vehicle;
