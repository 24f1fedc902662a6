//! Problem instance and the single-day solver interface.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::error::InputError;
use crate::matrix::TravelMatrix;

use super::{Customer, Solution, Vehicle, Weekday};

/// Travel-time estimate in minutes used when the time matrix omits an edge.
///
/// Distance-matrix entries are mandatory and validated at construction;
/// time-matrix entries may be absent, in which case the scheduling pass
/// substitutes this constant.
pub const DEFAULT_TRAVEL_MINUTES: f64 = 5.0;

/// A validated, read-only view of one routing problem.
///
/// Solvers share the instance; the routes and solutions they produce are
/// exclusively owned by the producing solver until returned. Construction
/// is the only fallible entry point: input-shape errors surface here,
/// before any solve begins.
///
/// # Examples
///
/// ```
/// use weekroute::matrix::TravelMatrix;
/// use weekroute::models::{Customer, ProblemInstance, TimeWindow, Vehicle};
///
/// let customers = vec![Customer::new("S1", "Store", 0.0, 0.0, 5.0)
///     .with_window(TimeWindow::parse("08:00", "17:00").unwrap())];
/// let vehicles = vec![Vehicle::new("V1", "Truck", 10.0)];
/// let mut km = TravelMatrix::new();
/// km.insert_symmetric("depot", "S1", 10.0);
/// let mut minutes = TravelMatrix::new();
/// minutes.insert_symmetric("depot", "S1", 15.0);
///
/// let problem = ProblemInstance::new(customers, vehicles, km, minutes, "depot").unwrap();
/// assert_eq!(problem.distance("depot", "S1"), 10.0);
/// ```
#[derive(Debug, Clone)]
pub struct ProblemInstance {
    customers: Vec<Arc<Customer>>,
    vehicles: Vec<Arc<Vehicle>>,
    distances: Arc<TravelMatrix>,
    travel_times: Arc<TravelMatrix>,
    depot_id: String,
}

impl ProblemInstance {
    /// Validates the inputs and builds an instance.
    ///
    /// Rejects negative demand, non-positive capacity, overlapping
    /// excluded/preferred day sets, and any missing distance-matrix entry
    /// over `{depot} ∪ customer ids`. Travel-time entries may be absent
    /// ([`DEFAULT_TRAVEL_MINUTES`] applies during scheduling).
    pub fn new(
        customers: Vec<Customer>,
        vehicles: Vec<Vehicle>,
        distances: TravelMatrix,
        travel_times: TravelMatrix,
        depot_id: impl Into<String>,
    ) -> Result<Self, InputError> {
        let depot_id = depot_id.into();

        for c in &customers {
            if c.demand_cbm() < 0.0 {
                return Err(InputError::NegativeDemand {
                    id: c.id().to_string(),
                    demand_cbm: c.demand_cbm(),
                });
            }
            if let Some(day) = c
                .excluded_days()
                .iter()
                .find(|d| c.preferred_days().contains(d))
            {
                return Err(InputError::ConflictingDayPreference {
                    id: c.id().to_string(),
                    day: *day,
                });
            }
        }

        for v in &vehicles {
            if v.capacity_cbm() <= 0.0 {
                return Err(InputError::NonPositiveCapacity {
                    id: v.id().to_string(),
                    capacity_cbm: v.capacity_cbm(),
                });
            }
        }

        let mut ids: Vec<&str> = Vec::with_capacity(customers.len() + 1);
        ids.push(&depot_id);
        ids.extend(customers.iter().map(|c| c.id()));
        for &from in &ids {
            for &to in &ids {
                if from != to && !distances.contains(from, to) {
                    return Err(InputError::MissingDistance {
                        from: from.to_string(),
                        to: to.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            customers: customers.into_iter().map(Arc::new).collect(),
            vehicles: vehicles.into_iter().map(Arc::new).collect(),
            distances: Arc::new(distances),
            travel_times: Arc::new(travel_times),
            depot_id,
        })
    }

    /// Returns a view of this instance restricted to the given customers.
    ///
    /// Matrices and fleet are shared; used by the weekly planner to hand
    /// each day's assignment to a single-day solver.
    pub fn with_customers(&self, customers: Vec<Arc<Customer>>) -> Self {
        Self {
            customers,
            vehicles: self.vehicles.clone(),
            distances: Arc::clone(&self.distances),
            travel_times: Arc::clone(&self.travel_times),
            depot_id: self.depot_id.clone(),
        }
    }

    /// The customers of this instance.
    pub fn customers(&self) -> &[Arc<Customer>] {
        &self.customers
    }

    /// The fleet of this instance.
    pub fn vehicles(&self) -> &[Arc<Vehicle>] {
        &self.vehicles
    }

    /// The depot id.
    pub fn depot_id(&self) -> &str {
        &self.depot_id
    }

    /// Looks up a customer by id.
    pub fn customer(&self, id: &str) -> Option<&Arc<Customer>> {
        self.customers.iter().find(|c| c.id() == id)
    }

    /// The distance matrix (km).
    pub fn distances(&self) -> &TravelMatrix {
        &self.distances
    }

    /// Distance in km between two locations.
    ///
    /// # Panics
    ///
    /// Panics if the entry is absent, which construction rules out for
    /// declared ids.
    pub fn distance(&self, from: &str, to: &str) -> f64 {
        self.distances.at(from, to)
    }

    /// Travel time in minutes between two locations.
    ///
    /// Falls back to [`DEFAULT_TRAVEL_MINUTES`] when the edge is absent.
    pub fn travel_time(&self, from: &str, to: &str) -> f64 {
        self.travel_times
            .get(from, to)
            .unwrap_or(DEFAULT_TRAVEL_MINUTES)
    }

    /// Finds the first vehicle that can serve the customer and fit its
    /// demand on an empty route.
    pub fn first_compatible_vehicle(&self, customer: &Customer) -> Option<&Arc<Vehicle>> {
        self.vehicles
            .iter()
            .find(|v| v.can_serve(customer.id()) && v.can_fit(customer.demand_cbm(), 0.0))
    }
}

/// A pure single-day VRP solver.
///
/// Implementations take a shared read-only view of the problem and own the
/// solution they produce; no state is shared between invocations. The
/// weekly planner may call implementations from multiple threads.
pub trait SingleDaySolver: Send + Sync {
    /// Solves the routing problem for one day.
    ///
    /// `shift_start` is the depot departure timestamp. Customers that
    /// cannot be served are reported in the solution's unserved list; the
    /// solver never aborts mid-solve.
    fn solve_day(
        &self,
        problem: &ProblemInstance,
        day: Weekday,
        shift_start: NaiveDateTime,
    ) -> Solution;
}
