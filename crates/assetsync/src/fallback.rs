//! Compressed-first fetching for assets published in two forms.

use std::path::{Path, PathBuf};

use assetsync_fetch::{AssetDescriptor, ConditionalFetcher, HttpClient, MaxAge, UpdateOutcome};

use crate::manifest::compressed_name;

/// Which published form of an asset an attempt targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Compressed,
    Plain,
}

impl Variant {
    pub fn local_name(self, name: &str) -> String {
        match self {
            Variant::Compressed => compressed_name(name),
            Variant::Plain => name.to_string(),
        }
    }

    pub fn local_path(self, root: &Path, name: &str) -> PathBuf {
        root.join(self.local_name(name))
    }

    /// `base_url` joined with the variant's file name.
    pub fn url(self, base_url: &str, name: &str) -> String {
        let file = self.local_name(name);
        if base_url.is_empty() || base_url.ends_with('/') {
            format!("{base_url}{file}")
        } else {
            format!("{base_url}/{file}")
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Variant::Compressed => "compressed",
            Variant::Plain => "plain",
        })
    }
}

/// Attempt sequence for one asset.
///
/// Starts at the compressed variant; a `Failed` outcome moves on to the plain
/// variant, anything else settles the asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackPlan {
    Pending(Variant),
    Done { variant: Variant, outcome: UpdateOutcome },
}

impl FallbackPlan {
    pub fn new(compressed_first: bool) -> Self {
        if compressed_first {
            FallbackPlan::Pending(Variant::Compressed)
        } else {
            FallbackPlan::Pending(Variant::Plain)
        }
    }

    pub fn next_attempt(&self) -> Option<Variant> {
        match self {
            FallbackPlan::Pending(variant) => Some(*variant),
            FallbackPlan::Done { .. } => None,
        }
    }

    /// Feed back the outcome of the attempt returned by `next_attempt`.
    pub fn record(self, outcome: UpdateOutcome) -> Self {
        match self {
            FallbackPlan::Pending(Variant::Compressed) if outcome.is_failed() => {
                FallbackPlan::Pending(Variant::Plain)
            }
            FallbackPlan::Pending(variant) => FallbackPlan::Done { variant, outcome },
            done @ FallbackPlan::Done { .. } => done,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackResult {
    pub outcome: UpdateOutcome,
    pub variant: Variant,
    pub attempts: u8,
}

/// Where and how to fetch one manifest entry.
#[derive(Debug, Clone, Copy)]
pub struct FallbackRequest<'a> {
    pub root: &'a Path,
    pub base_url: &'a str,
    pub name: &'a str,
    pub max_age: &'a MaxAge,
    pub compressed_first: bool,
    pub verbose: bool,
}

/// Fetch `request.name`, compressed variant first.
///
/// Local copies of both variants are deleted before the first attempt so the
/// mirror never holds two generations of the same asset.
pub async fn fetch_with_fallback<C: HttpClient>(
    fetcher: &ConditionalFetcher<C>,
    request: &FallbackRequest<'_>,
) -> FallbackResult {
    let FallbackRequest {
        root,
        base_url,
        name,
        max_age,
        compressed_first,
        verbose,
    } = *request;

    for variant in [Variant::Compressed, Variant::Plain] {
        let path = variant.local_path(root, name);
        if let Err(e) = assetsync_fs::remove_if_exists(&path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove stale copy");
        }
    }

    let mut plan = FallbackPlan::new(compressed_first);
    let mut attempts = 0;
    let mut last = (Variant::Plain, UpdateOutcome::Failed);

    while let Some(variant) = plan.next_attempt() {
        attempts += 1;
        let asset = AssetDescriptor::new(variant.local_path(root, name), variant.url(base_url, name))
            .max_age(*max_age)
            .verbose(verbose);
        let outcome = fetcher.fetch_asset(&asset).await;
        if outcome.is_failed() && variant == Variant::Compressed {
            tracing::debug!(asset = name, "compressed variant unavailable, trying plain");
        }
        last = (variant, outcome);
        plan = plan.record(outcome);
    }

    let (variant, outcome) = match plan {
        FallbackPlan::Done { variant, outcome } => (variant, outcome),
        FallbackPlan::Pending(_) => last,
    };
    if outcome.is_failed() {
        tracing::warn!(asset = name, attempts, "failed to fetch asset");
    } else {
        tracing::info!(asset = name, %variant, %outcome, "asset fetched");
    }

    FallbackResult {
        outcome,
        variant,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_compressed_moves_to_plain() {
        let plan = FallbackPlan::new(true);
        assert_eq!(plan.next_attempt(), Some(Variant::Compressed));

        let plan = plan.record(UpdateOutcome::Failed);
        assert_eq!(plan.next_attempt(), Some(Variant::Plain));

        let plan = plan.record(UpdateOutcome::Failed);
        assert_eq!(plan.next_attempt(), None);
        assert_eq!(
            plan,
            FallbackPlan::Done {
                variant: Variant::Plain,
                outcome: UpdateOutcome::Failed,
            }
        );
    }

    #[test]
    fn test_any_other_outcome_settles() {
        for outcome in [
            UpdateOutcome::Updated,
            UpdateOutcome::NotModified,
            UpdateOutcome::MaxAgeNotReached,
        ] {
            let plan = FallbackPlan::new(true).record(outcome);
            assert_eq!(plan.next_attempt(), None);
            assert_eq!(
                plan,
                FallbackPlan::Done {
                    variant: Variant::Compressed,
                    outcome,
                }
            );
        }
    }

    #[test]
    fn test_plain_only() {
        let plan = FallbackPlan::new(false);
        assert_eq!(plan.next_attempt(), Some(Variant::Plain));
        assert_eq!(plan.record(UpdateOutcome::Failed).next_attempt(), None);
    }

    #[test]
    fn test_variant_urls() {
        assert_eq!(
            Variant::Compressed.url("http://host/www/", "script.js"),
            "http://host/www/script.js.gz"
        );
        assert_eq!(Variant::Plain.url("http://host/www", "script.js"), "http://host/www/script.js");
        assert_eq!(Variant::Plain.local_name("script.js"), "script.js");
    }
}
