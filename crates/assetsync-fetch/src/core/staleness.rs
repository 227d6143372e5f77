use chrono::{DateTime, Utc};

use crate::data::{AssetRecord, MaxAge};

/// Whether a network check is warranted for an asset right now.
///
/// `record` should be `None` when the local file is missing: an absent copy
/// is always due, whatever the bookkeeping says. A reference time in the
/// future (the clock was reset) is treated as due as well, so a device that
/// boots with a wrong clock does not stall its assets.
///
/// # Examples
///
/// ```
/// use assetsync_fetch::{is_due, AssetRecord, MaxAge};
/// use chrono::{TimeDelta, Utc};
///
/// let now = Utc::now();
/// let record = AssetRecord { last_checked: Some(now - TimeDelta::days(2)), ..Default::default() };
///
/// assert!(!is_due(&MaxAge::parse("1 week"), Some(&record), now));
/// assert!(is_due(&MaxAge::parse("1 day"), Some(&record), now));
/// assert!(is_due(&MaxAge::Always, Some(&record), now));
/// ```
pub fn is_due(max_age: &MaxAge, record: Option<&AssetRecord>, now: DateTime<Utc>) -> bool {
    let Some(window) = max_age.duration() else {
        return true;
    };
    let Some(reference) = record.and_then(AssetRecord::last_seen) else {
        return true;
    };

    match (now - reference).to_std() {
        Ok(elapsed) => elapsed >= window,
        Err(_) => true,
    }
}
