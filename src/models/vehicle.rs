//! Vehicle type with capacity, fleet restrictions, and cost parameters.

use chrono::NaiveTime;
use std::collections::BTreeSet;

use crate::error::InputError;

use super::customer::parse_clock;

/// A delivery vehicle.
///
/// Fleet restrictions work in two layers: a customer in the forbidden set is
/// never serviceable; if the allowed set is non-empty, only its members are.
///
/// # Examples
///
/// ```
/// use weekroute::models::Vehicle;
///
/// let v = Vehicle::new("V1", "Box truck", 10.0)
///     .with_forbidden_customer("S9");
/// assert!(v.can_serve("S1"));
/// assert!(!v.can_serve("S9"));
/// assert!(v.can_fit(8.0, 0.0));
/// assert!(!v.can_fit(8.0, 4.0));
/// ```
#[derive(Debug, Clone)]
pub struct Vehicle {
    id: String,
    name: String,
    capacity_cbm: f64,
    allowed_customers: BTreeSet<String>,
    forbidden_customers: BTreeSet<String>,
    max_route_duration_hours: f64,
    start_time: NaiveTime,
    fixed_cost: f64,
    cost_per_km: f64,
    vehicle_type: String,
    driver_name: String,
}

impl Vehicle {
    /// Creates a vehicle with the defaults: 12-hour duration cap, 08:00
    /// shift start, fixed cost 1000, cost 2 per km.
    pub fn new(id: impl Into<String>, name: impl Into<String>, capacity_cbm: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capacity_cbm,
            allowed_customers: BTreeSet::new(),
            forbidden_customers: BTreeSet::new(),
            max_route_duration_hours: 12.0,
            start_time: NaiveTime::from_hms_opt(8, 0, 0).expect("08:00 is a valid clock time"),
            fixed_cost: 1000.0,
            cost_per_km: 2.0,
            vehicle_type: "Standard".to_string(),
            driver_name: String::new(),
        }
    }

    /// Restricts this vehicle to a specific customer (repeatable).
    ///
    /// Once any customer is allowed, only allowed customers are serviceable.
    pub fn with_allowed_customer(mut self, id: impl Into<String>) -> Self {
        self.allowed_customers.insert(id.into());
        self
    }

    /// Forbids this vehicle from serving a specific customer (repeatable).
    pub fn with_forbidden_customer(mut self, id: impl Into<String>) -> Self {
        self.forbidden_customers.insert(id.into());
        self
    }

    /// Sets the maximum route duration in hours.
    pub fn with_max_duration_hours(mut self, hours: f64) -> Self {
        self.max_route_duration_hours = hours;
        self
    }

    /// Sets the nominal start-of-shift clock time.
    pub fn with_start_time(mut self, start: NaiveTime) -> Self {
        self.start_time = start;
        self
    }

    /// Sets the start-of-shift from an "HH:MM" string.
    pub fn with_start_time_str(mut self, start: &str) -> Result<Self, InputError> {
        self.start_time = parse_clock(start)?;
        Ok(self)
    }

    /// Sets the fixed cost per use.
    pub fn with_fixed_cost(mut self, cost: f64) -> Self {
        self.fixed_cost = cost;
        self
    }

    /// Sets the variable cost per km.
    pub fn with_cost_per_km(mut self, cost: f64) -> Self {
        self.cost_per_km = cost;
        self
    }

    /// Sets the vehicle type tag.
    pub fn with_type(mut self, vehicle_type: impl Into<String>) -> Self {
        self.vehicle_type = vehicle_type.into();
        self
    }

    /// Sets the driver name.
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver_name = driver.into();
        self
    }

    /// Vehicle id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Load capacity in cubic meters.
    pub fn capacity_cbm(&self) -> f64 {
        self.capacity_cbm
    }

    /// Maximum route duration in hours.
    pub fn max_route_duration_hours(&self) -> f64 {
        self.max_route_duration_hours
    }

    /// Nominal start-of-shift clock time.
    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    /// Fixed cost per use.
    pub fn fixed_cost(&self) -> f64 {
        self.fixed_cost
    }

    /// Variable cost per km.
    pub fn cost_per_km(&self) -> f64 {
        self.cost_per_km
    }

    /// Vehicle type tag.
    pub fn vehicle_type(&self) -> &str {
        &self.vehicle_type
    }

    /// Driver name.
    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    /// Returns `true` if fleet restrictions allow serving the customer.
    pub fn can_serve(&self, customer_id: &str) -> bool {
        if self.forbidden_customers.contains(customer_id) {
            return false;
        }
        if !self.allowed_customers.is_empty() {
            return self.allowed_customers.contains(customer_id);
        }
        true
    }

    /// Returns `true` if the demand fits on top of the current load.
    pub fn can_fit(&self, demand_cbm: f64, current_load_cbm: f64) -> bool {
        current_load_cbm + demand_cbm <= self.capacity_cbm
    }

    /// Capacity left after the current load.
    pub fn remaining_capacity(&self, current_load_cbm: f64) -> f64 {
        (self.capacity_cbm - current_load_cbm).max(0.0)
    }
}
