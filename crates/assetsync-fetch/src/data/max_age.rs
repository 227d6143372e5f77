use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ParseMaxAgeError;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

/// How long a local copy stays fresh before another network check.
///
/// Parsed from expressions such as `"1 week"`, `"4 weeks"` or `"12h"`: a
/// whole number followed by a unit, whitespace optional, case ignored.
///
/// | unit    | accepted spellings                      |
/// |---------|-----------------------------------------|
/// | seconds | `s`, `sec`, `secs`, `second`, `seconds` |
/// | minutes | `m`, `min`, `mins`, `minute`, `minutes` |
/// | hours   | `h`, `hr`, `hrs`, `hour`, `hours`       |
/// | days    | `d`, `day`, `days`                      |
/// | weeks   | `w`, `wk`, `wks`, `week`, `weeks`       |
///
/// An empty expression means [`MaxAge::Always`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use assetsync_fetch::MaxAge;
///
/// assert_eq!("1 week".parse::<MaxAge>(), Ok(MaxAge::Every(Duration::from_secs(7 * 86_400))));
/// assert_eq!("".parse::<MaxAge>(), Ok(MaxAge::Always));
/// assert_eq!(MaxAge::parse("whenever"), MaxAge::Always);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxAge {
    /// Every call is eligible for a network check.
    #[default]
    Always,
    /// A check is only made once the local copy is at least this old.
    Every(Duration),
}

impl MaxAge {
    /// Lenient parse used at the fetch boundary.
    ///
    /// Anything [`FromStr`] rejects falls back to [`MaxAge::Always`] with a
    /// warning, so a typo costs bandwidth instead of freezing an asset.
    pub fn parse(expr: &str) -> Self {
        match expr.parse() {
            Ok(max_age) => max_age,
            Err(e) => {
                tracing::warn!(expr, error = %e, "unusable max age, treating as always eligible");
                Self::Always
            }
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Always => None,
            Self::Every(window) => Some(*window),
        }
    }
}

fn unit_seconds(unit: &str) -> Option<u64> {
    let seconds = match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR,
        "d" | "day" | "days" => DAY,
        "w" | "wk" | "wks" | "week" | "weeks" => WEEK,
        _ => return None,
    };
    Some(seconds)
}

impl FromStr for MaxAge {
    type Err = ParseMaxAgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::Always);
        }

        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (amount, unit) = s.split_at(split);
        if amount.is_empty() {
            return Err(ParseMaxAgeError::MissingAmount(s.to_string()));
        }
        let amount: u64 = amount
            .parse()
            .map_err(|_| ParseMaxAgeError::Overflow(s.to_string()))?;

        let unit = unit.trim().to_ascii_lowercase();
        let per_unit =
            unit_seconds(&unit).ok_or_else(|| ParseMaxAgeError::UnknownUnit(unit.clone()))?;
        if amount == 0 {
            return Err(ParseMaxAgeError::Zero);
        }

        let seconds = amount
            .checked_mul(per_unit)
            .ok_or_else(|| ParseMaxAgeError::Overflow(s.to_string()))?;
        Ok(Self::Every(Duration::from_secs(seconds)))
    }
}

impl fmt::Display for MaxAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => Ok(()),
            Self::Every(window) => {
                let secs = window.as_secs();
                for (size, unit) in [(WEEK, "week"), (DAY, "day"), (HOUR, "hour"), (MINUTE, "minute")] {
                    if secs >= size && secs % size == 0 {
                        let n = secs / size;
                        return write!(f, "{n} {unit}{}", if n == 1 { "" } else { "s" });
                    }
                }
                write!(f, "{secs} second{}", if secs == 1 { "" } else { "s" })
            }
        }
    }
}
