//! Travel matrices keyed by location id.

mod travel;

pub use travel::TravelMatrix;
