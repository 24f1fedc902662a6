//! Customer, time window, and blackout interval types.

use chrono::NaiveTime;
use std::collections::BTreeSet;

use crate::error::InputError;

use super::Weekday;

/// Parses a wall-clock "HH:MM" string.
pub(crate) fn parse_clock(s: &str) -> Result<NaiveTime, InputError> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| InputError::InvalidClockTime(s.to_string()))
}

/// An allowed delivery window within a day.
///
/// A window may be tagged with a weekday; a customer with several windows
/// selects, for a given day, the window tagged with that day, falling back
/// to the untagged default.
///
/// # Examples
///
/// ```
/// use weekroute::models::TimeWindow;
/// use chrono::NaiveTime;
///
/// let tw = TimeWindow::parse("08:00", "17:00").unwrap();
/// assert!(tw.contains(NaiveTime::from_hms_opt(12, 30, 0).unwrap()));
/// assert_eq!(tw.duration_minutes(), 540);
/// assert!(tw.day().is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    earliest: NaiveTime,
    latest: NaiveTime,
    day: Option<Weekday>,
}

impl TimeWindow {
    /// Creates a window from clock bounds.
    ///
    /// Rejects windows whose earliest bound lies after the latest bound.
    pub fn new(earliest: NaiveTime, latest: NaiveTime) -> Result<Self, InputError> {
        if earliest > latest {
            return Err(InputError::InvalidTimeWindow { earliest, latest });
        }
        Ok(Self {
            earliest,
            latest,
            day: None,
        })
    }

    /// Creates a window from "HH:MM" strings.
    pub fn parse(earliest: &str, latest: &str) -> Result<Self, InputError> {
        Self::new(parse_clock(earliest)?, parse_clock(latest)?)
    }

    /// Tags this window with a specific weekday.
    pub fn on_day(mut self, day: Weekday) -> Self {
        self.day = Some(day);
        self
    }

    /// Window open.
    pub fn earliest(&self) -> NaiveTime {
        self.earliest
    }

    /// Window close.
    pub fn latest(&self) -> NaiveTime {
        self.latest
    }

    /// The weekday this window applies to, or `None` for all days.
    pub fn day(&self) -> Option<Weekday> {
        self.day
    }

    /// Returns `true` if the given clock time falls within this window.
    pub fn contains(&self, t: NaiveTime) -> bool {
        self.earliest <= t && t <= self.latest
    }

    /// Window length in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.latest - self.earliest).num_minutes()
    }
}

/// A blackout period during which arrivals are infeasible.
///
/// Blackouts are orthogonal to time windows: they may overlap windows, each
/// other, or neither. The bounds are inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct ForbiddenInterval {
    start: NaiveTime,
    end: NaiveTime,
    reason: String,
}

impl ForbiddenInterval {
    /// Creates a blackout interval with a reason label.
    pub fn new(start: NaiveTime, end: NaiveTime, reason: impl Into<String>) -> Self {
        Self {
            start,
            end,
            reason: reason.into(),
        }
    }

    /// Creates a blackout interval from "HH:MM" strings.
    pub fn parse(start: &str, end: &str, reason: impl Into<String>) -> Result<Self, InputError> {
        Ok(Self::new(parse_clock(start)?, parse_clock(end)?, reason))
    }

    /// Blackout start.
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    /// Blackout end.
    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Human-readable reason for the blackout.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns `true` if an arrival at the given clock time is forbidden.
    pub fn conflicts_with(&self, t: NaiveTime) -> bool {
        self.start <= t && t <= self.end
    }

    /// Returns `true` if this blackout intersects the given window.
    pub fn overlaps_window(&self, window: &TimeWindow) -> bool {
        !(self.end < window.earliest() || self.start > window.latest())
    }
}

/// A delivery location with demand and scheduling constraints.
///
/// Customers are immutable for the duration of a solve. The weekly planner
/// may produce per-day demand snapshots via
/// [`with_demand`](Customer::with_demand), which are treated as new logical
/// customers.
///
/// # Examples
///
/// ```
/// use weekroute::models::{Customer, TimeWindow, Weekday};
///
/// let c = Customer::new("S1", "Main St Store", 52.1, 4.3, 5.0)
///     .with_window(TimeWindow::parse("08:00", "17:00").unwrap())
///     .with_excluded_day(Weekday::Mon)
///     .with_service_minutes(45);
/// assert!(!c.is_day_allowed(Weekday::Mon));
/// assert!(c.is_day_allowed(Weekday::Tue));
/// assert!(c.window_for_day(Some(Weekday::Tue)).is_some());
/// ```
#[derive(Debug, Clone)]
pub struct Customer {
    id: String,
    name: String,
    latitude: f64,
    longitude: f64,
    demand_cbm: f64,
    windows: Vec<TimeWindow>,
    blackouts: Vec<ForbiddenInterval>,
    excluded_days: BTreeSet<Weekday>,
    preferred_days: BTreeSet<Weekday>,
    service_minutes: u32,
    priority: i32,
    notes: String,
}

impl Customer {
    /// Creates a customer with default service time (60 minutes) and
    /// priority (1).
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        demand_cbm: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude,
            longitude,
            demand_cbm,
            windows: Vec::new(),
            blackouts: Vec::new(),
            excluded_days: BTreeSet::new(),
            preferred_days: BTreeSet::new(),
            service_minutes: 60,
            priority: 1,
            notes: String::new(),
        }
    }

    /// Adds a delivery window.
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.windows.push(window);
        self
    }

    /// Adds a blackout interval.
    pub fn with_blackout(mut self, interval: ForbiddenInterval) -> Self {
        self.blackouts.push(interval);
        self
    }

    /// Excludes a weekday from service.
    pub fn with_excluded_day(mut self, day: Weekday) -> Self {
        self.excluded_days.insert(day);
        self
    }

    /// Marks a weekday as preferred.
    pub fn with_preferred_day(mut self, day: Weekday) -> Self {
        self.preferred_days.insert(day);
        self
    }

    /// Sets the unloading time at this customer.
    pub fn with_service_minutes(mut self, minutes: u32) -> Self {
        self.service_minutes = minutes;
        self
    }

    /// Sets the planning priority (higher = more important).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Attaches free-text notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Returns a snapshot of this customer with an overridden demand.
    ///
    /// Used when weekly demand is split into per-day figures; the snapshot
    /// is a new logical customer.
    pub fn with_demand(&self, demand_cbm: f64) -> Self {
        let mut c = self.clone();
        c.demand_cbm = demand_cbm;
        c
    }

    /// Customer id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Demand in cubic meters.
    pub fn demand_cbm(&self) -> f64 {
        self.demand_cbm
    }

    /// Delivery windows.
    pub fn windows(&self) -> &[TimeWindow] {
        &self.windows
    }

    /// Blackout intervals.
    pub fn blackouts(&self) -> &[ForbiddenInterval] {
        &self.blackouts
    }

    /// Weekdays on which service is forbidden.
    pub fn excluded_days(&self) -> &BTreeSet<Weekday> {
        &self.excluded_days
    }

    /// Preferred service weekdays.
    pub fn preferred_days(&self) -> &BTreeSet<Weekday> {
        &self.preferred_days
    }

    /// Unloading time in minutes.
    pub fn service_minutes(&self) -> u32 {
        self.service_minutes
    }

    /// Planning priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Free-text notes.
    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Returns `true` if service is allowed on the given day.
    pub fn is_day_allowed(&self, day: Weekday) -> bool {
        !self.excluded_days.contains(&day)
    }

    /// Returns the window applicable on the given day.
    ///
    /// A day-tagged window wins over the untagged default. With no day
    /// (an untagged route), only the untagged default applies.
    pub fn window_for_day(&self, day: Option<Weekday>) -> Option<&TimeWindow> {
        if let Some(day) = day {
            if let Some(tagged) = self.windows.iter().find(|w| w.day() == Some(day)) {
                return Some(tagged);
            }
        }
        self.windows.iter().find(|w| w.day().is_none())
    }

    /// Returns the blackout conflicting with an arrival at `t`, if any.
    pub fn blackout_at(&self, t: NaiveTime) -> Option<&ForbiddenInterval> {
        self.blackouts.iter().find(|b| b.conflicts_with(t))
    }
}
