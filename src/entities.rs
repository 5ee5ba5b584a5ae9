//! Pattern-based recognition of email addresses and phone numbers.
//!
//! Both patterns are intentionally permissive: they favour recall over
//! precision, so strings such as `x@y.z.` or `2024-01-01 12` are reported.
//! Results are always unique and sorted, never in match order.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9.-]+").unwrap());

// optional '+', a digit, 7+ of [digits, whitespace, ( ) - .], then a closing digit
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?\d[\d\s().-]{7,}\d").unwrap());

/// Find every email-like string in `text`.
pub fn find_emails(text: &str) -> BTreeSet<String> {
    scan(&EMAIL_RE, text)
}

/// Find every phone-like string in `text`.
pub fn find_phones(text: &str) -> BTreeSet<String> {
    scan(&PHONE_RE, text)
}

fn scan(re: &Regex, text: &str) -> BTreeSet<String> {
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}
