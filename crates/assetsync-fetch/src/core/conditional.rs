use crate::data::AssetRecord;
use crate::error::{Error, Result};

pub const USER_AGENT: &str = "User-Agent";
pub const IF_NONE_MATCH: &str = "If-None-Match";
pub const IF_MODIFIED_SINCE: &str = "If-Modified-Since";

/// How a response status is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// `304`: keep the local copy.
    NotModified,
    /// `2xx`: a body with new content follows.
    Content,
    /// Anything else, including `3xx` the client did not follow.
    Rejected(u16),
}

pub fn classify_status(status: u16) -> ResponseKind {
    match status {
        304 => ResponseKind::NotModified,
        200..=299 => ResponseKind::Content,
        other => ResponseKind::Rejected(other),
    }
}

/// Headers for one GET.
///
/// Validators from `record` are only sent when the local file exists; a
/// `304` for a file we no longer have would leave nothing to serve.
pub fn request_headers(
    user_agent: &str,
    record: Option<&AssetRecord>,
    local_exists: bool,
) -> Vec<(String, String)> {
    let mut headers = vec![(USER_AGENT.to_string(), user_agent.to_string())];

    if let Some(record) = record.filter(|_| local_exists) {
        if let Some(etag) = &record.etag {
            headers.push((IF_NONE_MATCH.to_string(), etag.clone()));
        }
        if let Some(last_modified) = &record.last_modified {
            headers.push((IF_MODIFIED_SINCE.to_string(), last_modified.clone()));
        }
    }

    headers
}

pub fn check_size(limit: Option<u64>, received: u64) -> Result<()> {
    match limit {
        Some(limit) if received > limit => Err(Error::PayloadTooLarge { received, limit }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> AssetRecord {
        AssetRecord {
            etag: Some("\"abc123\"".to_string()),
            last_modified: Some("Wed, 21 Oct 2015 07:28:00 GMT".to_string()),
            ..Default::default()
        }
    }

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(200), ResponseKind::Content);
        assert_eq!(classify_status(203), ResponseKind::Content);
        assert_eq!(classify_status(304), ResponseKind::NotModified);
        assert_eq!(classify_status(301), ResponseKind::Rejected(301));
        assert_eq!(classify_status(404), ResponseKind::Rejected(404));
        assert_eq!(classify_status(503), ResponseKind::Rejected(503));
    }

    #[test]
    fn test_headers_with_validators() {
        let record = record();
        let headers = request_headers("radio/1.0", Some(&record), true);
        assert_eq!(header(&headers, USER_AGENT), Some("radio/1.0"));
        assert_eq!(header(&headers, IF_NONE_MATCH), Some("\"abc123\""));
        assert_eq!(
            header(&headers, IF_MODIFIED_SINCE),
            Some("Wed, 21 Oct 2015 07:28:00 GMT")
        );
    }

    #[test]
    fn test_no_validators_without_local_file() {
        let record = record();
        let headers = request_headers("radio/1.0", Some(&record), false);
        assert_eq!(headers.len(), 1);
        assert_eq!(header(&headers, IF_NONE_MATCH), None);
    }

    #[test]
    fn test_no_validators_without_record() {
        let headers = request_headers("radio/1.0", None, true);
        assert_eq!(headers, vec![(USER_AGENT.to_string(), "radio/1.0".to_string())]);
    }

    #[test]
    fn test_check_size() {
        assert!(check_size(None, u64::MAX).is_ok());
        assert!(check_size(Some(1024), 1024).is_ok());
        assert!(matches!(
            check_size(Some(1024), 1025),
            Err(Error::PayloadTooLarge { received: 1025, limit: 1024 })
        ));
    }
}
