use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted bookkeeping for one local asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Last time the server was asked about this asset and answered.
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,

    /// Last time new content was placed.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl AssetRecord {
    /// Most recent successful contact, the reference point for staleness.
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_checked.max(self.last_updated)
    }

    pub fn has_validator(&self) -> bool {
        self.etag.is_some() || self.last_modified.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_last_seen_prefers_latest() {
        let now = Utc::now();
        let record = AssetRecord {
            last_checked: Some(now),
            last_updated: Some(now - TimeDelta::days(3)),
            ..Default::default()
        };
        assert_eq!(record.last_seen(), Some(now));

        let updated_only = AssetRecord {
            last_updated: Some(now),
            ..Default::default()
        };
        assert_eq!(updated_only.last_seen(), Some(now));
        assert_eq!(AssetRecord::default().last_seen(), None);
    }

    #[test]
    fn test_serde_skips_missing_validators() {
        let record = AssetRecord::default();
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"last_checked":null,"last_updated":null}"#);

        let parsed: AssetRecord = serde_json::from_str(r#"{"etag":"\"v1\""}"#).unwrap();
        assert_eq!(parsed.etag.as_deref(), Some("\"v1\""));
        assert!(parsed.has_validator());
    }
}
