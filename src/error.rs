//! Input-shape errors raised before any solve begins.

use chrono::NaiveTime;
use thiserror::Error;

use crate::models::Weekday;

/// Malformed problem input.
///
/// The solvers themselves never abort mid-solve: infeasibility is folded
/// into the returned [`Solution`](crate::models::Solution) as violations or
/// unserved customers. Only input-shape problems are surfaced to the caller,
/// and always before solving starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// A time window whose earliest bound lies after its latest bound.
    #[error("invalid time window: earliest {earliest} is after latest {latest}")]
    InvalidTimeWindow {
        /// Window open.
        earliest: NaiveTime,
        /// Window close.
        latest: NaiveTime,
    },

    /// A customer declared with negative demand.
    #[error("customer {id} has negative demand {demand_cbm} CBM")]
    NegativeDemand {
        /// Customer id.
        id: String,
        /// The offending demand.
        demand_cbm: f64,
    },

    /// A vehicle declared with zero or negative capacity.
    #[error("vehicle {id} has non-positive capacity {capacity_cbm} CBM")]
    NonPositiveCapacity {
        /// Vehicle id.
        id: String,
        /// The offending capacity.
        capacity_cbm: f64,
    },

    /// A weekday tag outside the closed vocabulary Mon..Fri.
    #[error("unknown weekday {0:?}: expected one of Mon, Tue, Wed, Thu, Fri")]
    UnknownWeekday(String),

    /// A customer listing the same day as both excluded and preferred.
    #[error("customer {id}: day {day} is both excluded and preferred")]
    ConflictingDayPreference {
        /// Customer id.
        id: String,
        /// The day present in both sets.
        day: Weekday,
    },

    /// A distance-matrix entry missing for a declared pair of ids.
    ///
    /// Travel-time entries may be absent (the scheduler substitutes a
    /// documented 5-minute estimate); distances must be complete.
    #[error("distance matrix is missing entry {from} -> {to}")]
    MissingDistance {
        /// Origin id.
        from: String,
        /// Destination id.
        to: String,
    },

    /// A clock time that could not be parsed as "HH:MM".
    #[error("invalid clock time {0:?}: expected HH:MM")]
    InvalidClockTime(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = InputError::UnknownWeekday("Sat".to_string());
        assert!(e.to_string().contains("Sat"));
        assert!(e.to_string().contains("Mon, Tue, Wed, Thu, Fri"));

        let e = InputError::MissingDistance {
            from: "depot".to_string(),
            to: "S1".to_string(),
        };
        assert_eq!(e.to_string(), "distance matrix is missing entry depot -> S1");
    }

    #[test]
    fn test_negative_demand_message() {
        let e = InputError::NegativeDemand {
            id: "S9".to_string(),
            demand_cbm: -2.5,
        };
        assert!(e.to_string().contains("S9"));
        assert!(e.to_string().contains("-2.5"));
    }
}
