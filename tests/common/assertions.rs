//! Common assertion helpers for command output validation

#![allow(dead_code)]

use predicates::prelude::*;

/// Matches the summary printed when some patches in a batch failed
pub fn batch_failed(failed: usize, total: usize) -> impl Predicate<str> {
    predicates::str::contains(format!("{failed} of {total} patches failed"))
}

/// Matches a per-patch success line for `file`
pub fn patched(file: &str) -> impl Predicate<str> {
    predicates::str::contains(format!("{file} patched"))
}

pub fn forbidden_pattern(label: &str) -> impl Predicate<str> {
    predicates::str::contains("Forbidden pattern detected").and(predicates::str::contains(label.to_string()))
}
