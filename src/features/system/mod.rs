//! Service description and liveness endpoints.

pub mod dtos;
pub mod handlers;
pub mod routes;

pub use routes::routes;
