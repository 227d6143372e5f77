//! The ordered list of files a mirror directory must contain.

use crate::error::{Error, Result};

pub const GZIP_SUFFIX: &str = ".gz";

/// `<name>.gz`
pub fn compressed_name(name: &str) -> String {
    format!("{name}{GZIP_SUFFIX}")
}

/// Required bare file names, in fetch order.
///
/// The last entry is by convention the main page, so a device that loses
/// power mid-refresh is left without an entry point rather than with one
/// that references missing files. Nothing here enforces that.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Manifest {
    entries: Vec<String>,
}

impl Manifest {
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(Into::into)
            .map(|entry: String| {
                if is_bare_name(&entry) {
                    Ok(entry)
                } else {
                    Err(Error::ManifestEntry(entry))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a file called `name` belongs in the mirror, either as an entry
    /// or as its compressed form.
    pub fn allows(&self, name: &str) -> bool {
        self.iter().any(|entry| {
            name == entry
                || name
                    .strip_suffix(GZIP_SUFFIX)
                    .is_some_and(|stem| stem == entry)
        })
    }
}

fn is_bare_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_plain_and_compressed() {
        let manifest = Manifest::new(["a", "b", "c.json"]).unwrap();
        assert!(manifest.allows("a"));
        assert!(manifest.allows("a.gz"));
        assert!(manifest.allows("c.json.gz"));
        assert!(!manifest.allows("stray.txt"));
        assert!(!manifest.allows("a.gz.gz"));
        assert!(!manifest.allows(".gz"));
    }

    #[test]
    fn test_rejects_paths() {
        assert!(matches!(
            Manifest::new(["www/a.js"]),
            Err(Error::ManifestEntry(name)) if name == "www/a.js"
        ));
        assert!(Manifest::new([""]).is_err());
        assert!(Manifest::new([".."]).is_err());
        assert!(Manifest::new(["a\\b"]).is_err());
    }

    #[test]
    fn test_keeps_order() {
        let manifest = Manifest::new(["style.css", "script.js", "player.html"]).unwrap();
        assert_eq!(manifest.iter().last(), Some("player.html"));
        assert_eq!(manifest.len(), 3);
    }

    #[test]
    fn test_compressed_name() {
        assert_eq!(compressed_name("timezones.json"), "timezones.json.gz");
    }
}
