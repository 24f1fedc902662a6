//! Closed-world weekday vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// A service weekday.
///
/// The vocabulary is exactly Mon..Fri; weekends are not part of the planning
/// horizon. Any other tag is rejected at input validation.
///
/// # Examples
///
/// ```
/// use weekroute::models::Weekday;
///
/// let day: Weekday = "Wed".parse().unwrap();
/// assert_eq!(day, Weekday::Wed);
/// assert_eq!(day.as_str(), "Wed");
/// assert!("Sat".parse::<Weekday>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    /// Monday.
    Mon,
    /// Tuesday.
    Tue,
    /// Wednesday.
    Wed,
    /// Thursday.
    Thu,
    /// Friday.
    Fri,
}

impl Weekday {
    /// All weekdays in Mon..Fri order.
    pub const ALL: [Weekday; 5] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ];

    /// The three-letter tag for this day.
    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
        }
    }

    /// Zero-based offset from Monday, used to advance the week-start
    /// timestamp one calendar day per weekday.
    pub fn offset_from_monday(&self) -> u64 {
        match self {
            Weekday::Mon => 0,
            Weekday::Tue => 1,
            Weekday::Wed => 2,
            Weekday::Thu => 3,
            Weekday::Fri => 4,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Mon" => Ok(Weekday::Mon),
            "Tue" => Ok(Weekday::Tue),
            "Wed" => Ok(Weekday::Wed),
            "Thu" => Ok(Weekday::Thu),
            "Fri" => Ok(Weekday::Fri),
            other => Err(InputError::UnknownWeekday(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for day in Weekday::ALL {
            let parsed: Weekday = day.as_str().parse().expect("valid tag");
            assert_eq!(parsed, day);
        }
    }

    #[test]
    fn test_rejects_weekend() {
        assert!(matches!(
            "Sat".parse::<Weekday>(),
            Err(InputError::UnknownWeekday(_))
        ));
        assert!("Sun".parse::<Weekday>().is_err());
        assert!("Monday".parse::<Weekday>().is_err());
        assert!("mon".parse::<Weekday>().is_err());
    }

    #[test]
    fn test_ordering_follows_week() {
        assert!(Weekday::Mon < Weekday::Tue);
        assert!(Weekday::Thu < Weekday::Fri);
        assert_eq!(Weekday::Wed.offset_from_monday(), 2);
    }

    #[test]
    fn test_serde_tag() {
        let json = serde_json::to_string(&Weekday::Thu).expect("serializes");
        assert_eq!(json, "\"Thu\"");
    }
}
