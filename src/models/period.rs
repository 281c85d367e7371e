//! Survey periods
//!
//! Extracts are quarterly. A period is either a known quarter or
//! `Unknown` for files whose name could not be mapped.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

static QUARTER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-?Q([1-4])$").expect("quarter pattern is a valid regex")
});

/// Label used for rows whose source period is not known
pub const UNKNOWN_PERIOD_LABEL: &str = "unknown";

/// A survey period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    /// Quarterly period (e.g., 2024-Q1)
    Quarter {
        /// Calendar year
        year: i32,
        /// Quarter (1-4)
        quarter: u8,
    },
    /// Source period could not be determined; sorts after every quarter
    Unknown,
}

impl Period {
    /// Create a quarterly period, or `None` if the quarter is out of range
    #[must_use]
    pub fn quarter(year: i32, quarter: u8) -> Option<Self> {
        (1..=4)
            .contains(&quarter)
            .then_some(Self::Quarter { year, quarter })
    }

    /// Whether the period is known
    #[must_use]
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Quarter { .. })
    }

    /// Label stamped into the period column
    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quarter { year, quarter } => write!(f, "{year}-Q{quarter}"),
            Self::Unknown => write!(f, "{UNKNOWN_PERIOD_LABEL}"),
        }
    }
}

impl FromStr for Period {
    type Err = String;

    /// Parse `YYYY-Qn`, `YYYYQn` or the unknown label
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(UNKNOWN_PERIOD_LABEL) {
            return Ok(Self::Unknown);
        }
        let caps = QUARTER_PATTERN
            .captures(trimmed)
            .ok_or_else(|| format!("Invalid period format: {s}"))?;
        let year = caps[1].parse::<i32>().map_err(|e| e.to_string())?;
        let quarter = caps[2].parse::<u8>().map_err(|e| e.to_string())?;
        Self::quarter(year, quarter).ok_or_else(|| format!("Invalid quarter: {quarter}"))
    }
}
