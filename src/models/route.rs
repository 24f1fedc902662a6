//! Route and stop types.

use std::sync::Arc;

use chrono::NaiveDateTime;

use super::{Customer, Vehicle, Weekday};

/// A single scheduled stop within a route.
///
/// Timestamps and loads are written back by the feasibility kernel's
/// scheduling pass; freshly inserted stops carry `None` until validated.
#[derive(Debug, Clone)]
pub struct RouteStop {
    /// The customer being visited.
    pub customer: Arc<Customer>,
    /// Scheduled arrival, including any wait for the window to open.
    pub arrival: Option<NaiveDateTime>,
    /// Scheduled departure (arrival + service time).
    pub departure: Option<NaiveDateTime>,
    /// Load on board before this delivery.
    pub load_before_cbm: f64,
    /// Load on board after this delivery.
    pub load_after_cbm: f64,
    /// Zero-based position within the route.
    pub sequence: usize,
}

impl RouteStop {
    fn new(customer: Arc<Customer>, sequence: usize) -> Self {
        Self {
            customer,
            arrival: None,
            departure: None,
            load_before_cbm: 0.0,
            load_after_cbm: 0.0,
            sequence,
        }
    }
}

/// An ordered sequence of stops served by one vehicle on one day.
///
/// Routes start and end at the depot (not stored as stops). Distance,
/// duration, and timestamps are computed by the feasibility kernel.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use weekroute::models::{Customer, Route, Vehicle, Weekday};
///
/// let vehicle = Arc::new(Vehicle::new("V1", "Truck", 10.0));
/// let mut route = Route::new(vehicle, Some(Weekday::Mon));
/// route.add_stop(Arc::new(Customer::new("S1", "Store", 0.0, 0.0, 4.0)));
/// assert_eq!(route.len(), 1);
/// assert_eq!(route.total_load_cbm(), 4.0);
/// assert_eq!(route.customer_ids(), vec!["S1".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct Route {
    vehicle: Arc<Vehicle>,
    stops: Vec<RouteStop>,
    day: Option<Weekday>,
    total_distance_km: f64,
    total_duration_minutes: f64,
    total_load_cbm: f64,
    depot_departure: Option<NaiveDateTime>,
    depot_return: Option<NaiveDateTime>,
}

impl Route {
    /// Creates an empty route for the given vehicle and day.
    pub fn new(vehicle: Arc<Vehicle>, day: Option<Weekday>) -> Self {
        Self {
            vehicle,
            stops: Vec::new(),
            day,
            total_distance_km: 0.0,
            total_duration_minutes: 0.0,
            total_load_cbm: 0.0,
            depot_departure: None,
            depot_return: None,
        }
    }

    /// Sets the depot departure timestamp.
    pub fn with_departure(mut self, departure: NaiveDateTime) -> Self {
        self.depot_departure = Some(departure);
        self
    }

    /// Appends a stop at the end of the route.
    pub fn add_stop(&mut self, customer: Arc<Customer>) {
        self.total_load_cbm += customer.demand_cbm();
        let seq = self.stops.len();
        self.stops.push(RouteStop::new(customer, seq));
    }

    /// Inserts a stop at the given position, resequencing the rest.
    ///
    /// Positions at or past the end append.
    pub fn insert_stop(&mut self, position: usize, customer: Arc<Customer>) {
        self.total_load_cbm += customer.demand_cbm();
        let position = position.min(self.stops.len());
        self.stops.insert(position, RouteStop::new(customer, position));
        self.resequence();
    }

    /// Removes the stop visiting the given customer.
    ///
    /// Returns `true` if a stop was removed.
    pub fn remove_stop(&mut self, customer_id: &str) -> bool {
        if let Some(pos) = self
            .stops
            .iter()
            .position(|s| s.customer.id() == customer_id)
        {
            self.total_load_cbm -= self.stops[pos].customer.demand_cbm();
            self.stops.remove(pos);
            self.resequence();
            true
        } else {
            false
        }
    }

    /// Removes and returns the stop at the given position.
    pub fn remove_stop_at(&mut self, position: usize) -> Arc<Customer> {
        let stop = self.stops.remove(position);
        self.total_load_cbm -= stop.customer.demand_cbm();
        self.resequence();
        stop.customer
    }

    fn resequence(&mut self) {
        for (i, s) in self.stops.iter_mut().enumerate() {
            s.sequence = i;
        }
    }

    /// The vehicle serving this route.
    pub fn vehicle(&self) -> &Arc<Vehicle> {
        &self.vehicle
    }

    /// The weekday tag, if any.
    pub fn day(&self) -> Option<Weekday> {
        self.day
    }

    /// The ordered stops.
    pub fn stops(&self) -> &[RouteStop] {
        &self.stops
    }

    /// Mutable access to the stops (used by the scheduling pass).
    pub fn stops_mut(&mut self) -> &mut [RouteStop] {
        &mut self.stops
    }

    /// Number of stops.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Returns `true` if the route has no stops.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Customer ids in visit order.
    pub fn customer_ids(&self) -> Vec<String> {
        self.stops
            .iter()
            .map(|s| s.customer.id().to_string())
            .collect()
    }

    /// Total route distance in km (set by the kernel).
    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_km
    }

    /// Total route duration in minutes, depot to depot (set by the kernel).
    pub fn total_duration_minutes(&self) -> f64 {
        self.total_duration_minutes
    }

    /// Total load in cubic meters.
    pub fn total_load_cbm(&self) -> f64 {
        self.total_load_cbm
    }

    /// Depot departure timestamp.
    pub fn depot_departure(&self) -> Option<NaiveDateTime> {
        self.depot_departure
    }

    /// Depot return timestamp (set by the kernel).
    pub fn depot_return(&self) -> Option<NaiveDateTime> {
        self.depot_return
    }

    /// Capacity utilization in percent.
    pub fn utilization(&self) -> f64 {
        if self.vehicle.capacity_cbm() == 0.0 {
            return 0.0;
        }
        self.total_load_cbm / self.vehicle.capacity_cbm() * 100.0
    }

    /// Route cost: `fixed_cost + cost_per_km × total_distance_km`.
    pub fn cost(&self) -> f64 {
        self.vehicle.fixed_cost() + self.vehicle.cost_per_km() * self.total_distance_km
    }

    /// Sets the total distance (kernel use).
    pub fn set_total_distance_km(&mut self, km: f64) {
        self.total_distance_km = km;
    }

    /// Sets the total duration (kernel use).
    pub fn set_total_duration_minutes(&mut self, minutes: f64) {
        self.total_duration_minutes = minutes;
    }

    /// Sets the total load (kernel use).
    pub fn set_total_load_cbm(&mut self, cbm: f64) {
        self.total_load_cbm = cbm;
    }

    /// Sets the depot departure timestamp.
    pub fn set_depot_departure(&mut self, t: NaiveDateTime) {
        self.depot_departure = Some(t);
    }

    /// Sets the depot return timestamp (kernel use).
    pub fn set_depot_return(&mut self, t: Option<NaiveDateTime>) {
        self.depot_return = t;
    }
}
