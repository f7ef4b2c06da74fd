//! Value types shared by the inventory, calculator, ledger and pack modules

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::{PlannerError, Result};

const MINUTES_PER_HOUR: f64 = 60.0;
const MINUTES_PER_DAY: f64 = 24.0 * MINUTES_PER_HOUR;

static DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)\s*d)?\s*(?:(\d+)\s*h)?\s*(?:(\d+)\s*m)?\s*(?:(\d+)\s*s)?$")
        .expect("duration pattern is a valid regex")
});

/// Elapsed time as entered in game: days, hours, minutes and seconds.
///
/// Components are not normalised, so `0h 90m` and `1h 30m` are distinct
/// values with the same `total_minutes`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Duration {
    days: u32,
    hours: u32,
    minutes: u32,
    seconds: u32,
}

impl Duration {
    pub const ZERO: Duration = Duration::new(0, 0, 0, 0);

    pub const fn new(days: u32, hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            days,
            hours,
            minutes,
            seconds,
        }
    }

    pub const fn from_minutes(minutes: u32) -> Self {
        Self::new(0, 0, minutes, 0)
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn total_minutes(&self) -> f64 {
        f64::from(self.days) * MINUTES_PER_DAY
            + f64::from(self.hours) * MINUTES_PER_HOUR
            + f64::from(self.minutes)
            + f64::from(self.seconds) / 60.0
    }

    fn total_seconds(&self) -> u64 {
        u64::from(self.days) * 86_400
            + u64::from(self.hours) * 3_600
            + u64::from(self.minutes) * 60
            + u64::from(self.seconds)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total_seconds();
        let parts = [
            (total / 86_400, "d"),
            ((total % 86_400) / 3_600, "h"),
            ((total % 3_600) / 60, "m"),
            (total % 60, "s"),
        ];

        let mut written = false;
        for (value, unit) in parts {
            if value == 0 {
                continue;
            }
            if written {
                write!(f, " ")?;
            }
            write!(f, "{}{}", value, unit)?;
            written = true;
        }
        if !written {
            write!(f, "0m")?;
        }
        Ok(())
    }
}

impl FromStr for Duration {
    type Err = PlannerError;

    /// Parse `"1d 4h 57m 30s"`-style text. Units must appear in that order and
    /// each at most once; a bare number is read as minutes.
    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        if text.is_empty() {
            return Err(PlannerError::invalid("duration", "duration is empty"));
        }

        if let Ok(minutes) = text.parse::<u32>() {
            return Ok(Duration::from_minutes(minutes));
        }

        let caps = DURATION_PATTERN.captures(text).ok_or_else(|| {
            PlannerError::invalid(
                "duration",
                format!("cannot parse '{}' as a duration like '4h 57m'", text),
            )
        })?;

        let mut values = [0u32; 4];
        let mut any = false;
        for (slot, value) in values.iter_mut().enumerate() {
            if let Some(m) = caps.get(slot + 1) {
                *value = m.as_str().parse().map_err(|_| {
                    PlannerError::invalid("duration", format!("'{}' is out of range", m.as_str()))
                })?;
                any = true;
            }
        }
        if !any {
            return Err(PlannerError::invalid(
                "duration",
                format!("cannot parse '{}' as a duration like '4h 57m'", text),
            ));
        }

        Ok(Duration::new(values[0], values[1], values[2], values[3]))
    }
}

/// Inventory pools of speed-up minutes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SpeedupCategory {
    General,
    Construction,
    Training,
    Research,
}

impl SpeedupCategory {
    pub const ALL: [SpeedupCategory; 4] = [
        SpeedupCategory::General,
        SpeedupCategory::Construction,
        SpeedupCategory::Training,
        SpeedupCategory::Research,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            SpeedupCategory::General => 0,
            SpeedupCategory::Construction => 1,
            SpeedupCategory::Training => 2,
            SpeedupCategory::Research => 3,
        }
    }
}

/// Activities tracked in the Hall of Chiefs ledger.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Activity {
    Construction,
    Research,
    Training,
}

impl Activity {
    pub const ALL: [Activity; 3] = [Activity::Construction, Activity::Research, Activity::Training];

    /// The inventory pool reserved for this activity.
    pub fn speedup_category(self) -> SpeedupCategory {
        match self {
            Activity::Construction => SpeedupCategory::Construction,
            Activity::Research => SpeedupCategory::Research,
            Activity::Training => SpeedupCategory::Training,
        }
    }

    /// Whether points come from power (construction, research) rather than troops.
    pub fn is_power_based(self) -> bool {
        !matches!(self, Activity::Training)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackId(pub u64);

impl fmt::Display for PackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_minutes_combines_components() {
        assert_eq!(Duration::new(0, 1, 0, 0).total_minutes(), 60.0);
        assert_eq!(Duration::new(1, 2, 3, 30).total_minutes(), 1440.0 + 120.0 + 3.0 + 0.5);
        assert_eq!(Duration::ZERO.total_minutes(), 0.0);
    }

    #[test]
    fn parses_compact_durations() {
        assert_eq!("4h 57m".parse::<Duration>().unwrap(), Duration::new(0, 4, 57, 0));
        assert_eq!("1d2h".parse::<Duration>().unwrap(), Duration::new(1, 2, 0, 0));
        assert_eq!("90s".parse::<Duration>().unwrap(), Duration::new(0, 0, 0, 90));
        assert_eq!("45".parse::<Duration>().unwrap(), Duration::from_minutes(45));
    }

    #[test]
    fn full_form_parses_repeatedly() {
        assert!(DURATION_PATTERN.is_match("1d 4h 57m 30s"));
        for _ in 0..3 {
            assert_eq!(
                " 1d 4h 57m 30s ".parse::<Duration>().unwrap(),
                Duration::new(1, 4, 57, 30)
            );
        }
    }

    #[test]
    fn rejects_malformed_durations() {
        assert!("".parse::<Duration>().is_err());
        assert!("h".parse::<Duration>().is_err());
        assert!("5m 2h".parse::<Duration>().is_err());
        assert!("-3m".parse::<Duration>().is_err());
        assert!("3x".parse::<Duration>().is_err());
    }

    #[test]
    fn display_normalises_components() {
        assert_eq!(Duration::new(0, 0, 90, 0).to_string(), "1h 30m");
        assert_eq!(Duration::new(1, 2, 30, 15).to_string(), "1d 2h 30m 15s");
        assert_eq!(Duration::ZERO.to_string(), "0m");
    }

    #[test]
    fn categories_parse_case_insensitively() {
        assert_eq!("General".parse::<SpeedupCategory>().unwrap(), SpeedupCategory::General);
        assert_eq!("research".parse::<Activity>().unwrap(), Activity::Research);
        assert_eq!(SpeedupCategory::Training.to_string(), "training");
        assert!("gold".parse::<SpeedupCategory>().is_err());
    }

    #[test]
    fn activities_map_to_their_pool() {
        for activity in Activity::ALL {
            assert_ne!(activity.speedup_category(), SpeedupCategory::General);
        }
        assert!(Activity::Research.is_power_based());
        assert!(!Activity::Training.is_power_based());
    }
}
