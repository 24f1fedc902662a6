//! Shared fixtures for integration tests.
//!
//! Each test binary compiles its own copy, so not every helper is used
//! everywhere.
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use weekroute::matrix::TravelMatrix;
use weekroute::models::{Customer, ProblemInstance, Vehicle};

/// Monday 08:00 of a fixed reference week.
pub fn monday_8am() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 2)
        .expect("valid date")
        .and_hms_opt(8, 0, 0)
        .expect("valid time")
}

/// A timestamp on the reference Monday.
pub fn monday_at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 2)
        .expect("valid date")
        .and_hms_opt(h, m, 0)
        .expect("valid time")
}

/// Builds a validated instance from symmetric matrix entries.
pub fn problem(
    customers: Vec<Customer>,
    vehicles: Vec<Vehicle>,
    km_pairs: &[(&str, &str, f64)],
    minute_pairs: &[(&str, &str, f64)],
) -> ProblemInstance {
    let mut km = TravelMatrix::new();
    for &(a, b, d) in km_pairs {
        km.insert_symmetric(a, b, d);
    }
    let mut minutes = TravelMatrix::new();
    for &(a, b, t) in minute_pairs {
        minutes.insert_symmetric(a, b, t);
    }
    ProblemInstance::new(customers, vehicles, km, minutes, "depot").expect("valid inputs")
}
