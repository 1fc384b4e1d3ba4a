//! Catalog logic on top of the gateway: cache-first reads, cross-theater
//! aggregation, distances and seat statistics

pub mod aggregate;
pub mod distance;
pub mod seats;
pub mod service;

pub use aggregate::{aggregate, AggregateError, AggregateRequest, MovieAggregate, MovieCatalog, SessionAtTheater};
pub use distance::{haversine_km, theater_distance_km};
pub use seats::SeatCount;
pub use service::{CatalogService, SessionSource};
