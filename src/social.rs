//! Grouping of outbound links by social platform.
//!
//! A link belongs to a platform when any of that platform's domains occurs
//! anywhere in its href. This is a substring test, not a host comparison:
//! `https://notfacebook.com.evil.example/` lands in the facebook bucket.

use crate::models::Link;
use std::collections::{BTreeMap, BTreeSet};

/// Platform name and the domain fragments that identify it.
pub const SOCIAL_DOMAINS: &[(&str, &[&str])] = &[
    ("facebook", &["facebook.com", "fb.me"]),
    ("twitter", &["twitter.com", "x.com"]),
    ("instagram", &["instagram.com"]),
    ("linkedin", &["linkedin.com"]),
    ("youtube", &["youtube.com", "youtu.be"]),
    ("github", &["github.com"]),
];

/// Bucket `links` by platform.
///
/// Platforms with no matching link are left out of the result. A single
/// href may appear under several platforms.
pub fn classify_social(links: &[Link]) -> BTreeMap<String, BTreeSet<String>> {
    let mut buckets = BTreeMap::new();
    for (platform, domains) in SOCIAL_DOMAINS {
        let hrefs: BTreeSet<String> = links
            .iter()
            .filter(|link| domains.iter().any(|d| link.href.contains(d)))
            .map(|link| link.href.clone())
            .collect();
        if !hrefs.is_empty() {
            buckets.insert((*platform).to_string(), hrefs);
        }
    }
    buckets
}
