//! Pure aggregation and filtering over parsed log entries.
//!
//! Nothing in here mutates its input or holds state between calls, so any of
//! these functions may run concurrently over the same entry slice.

use crate::models::{FilterSpec, LogEntry};
use crate::parser;
use crate::Error;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, Timelike};
use itertools::Itertools;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};

/// User-agent fragments that mark a request as crawler traffic. A substring
/// heuristic, not a registry; misclassifications in both directions are
/// expected and acceptable.
const BOT_MARKERS: [&str; 10] = [
    "bot",
    "crawler",
    "spider",
    "slurp",
    "bingpreview",
    "facebookexternalhit",
    "ahrefs",
    "semrush",
    "yandex",
    "duckduckbot",
];

pub fn is_bot(user_agent: &str) -> bool {
    let ua = user_agent.to_lowercase();
    BOT_MARKERS.iter().any(|marker| ua.contains(marker))
        || (ua.contains("google") && ua.contains("snippet"))
}

/// Parse a shell-supplied date-range bound, written in the log's own
/// datetime layout. Rejected before any filtering happens; the core never
/// substitutes a guessed value.
pub fn parse_bound(input: &str) -> Result<DateTime<FixedOffset>, Error> {
    let input = input.trim();
    DateTime::parse_from_str(input, parser::DATETIME_FORMAT)
        .map_err(|_| Error::InvalidBound(input.to_owned()))
}

fn matches(entry: &LogEntry, spec: &FilterSpec) -> bool {
    if let Some(from) = spec.from {
        if entry.timestamp < from {
            return false;
        }
    }
    if let Some(to) = spec.to {
        if entry.timestamp > to {
            return false;
        }
    }
    if let Some(method) = &spec.method {
        if !entry.method.eq_ignore_ascii_case(method) {
            return false;
        }
    }
    if let Some(family) = spec.status_family {
        if entry.status_code / 100 != family {
            return false;
        }
    }
    if let Some(needle) = &spec.path_contains {
        if !entry.path.to_lowercase().contains(&needle.to_lowercase()) {
            return false;
        }
    }
    if spec.exclude_bots && is_bot(&entry.user_agent) {
        return false;
    }
    true
}

/// Keep the entries satisfying every component set on `spec`, preserving
/// relative order. An empty spec returns the input unchanged.
pub fn filter(entries: &[LogEntry], spec: &FilterSpec) -> Vec<LogEntry> {
    entries
        .iter()
        .filter(|entry| matches(entry, spec))
        .cloned()
        .collect()
}

pub fn total_hits(entries: &[LogEntry]) -> usize {
    entries.len()
}

pub fn unique_visitors(entries: &[LogEntry]) -> usize {
    entries
        .iter()
        .map(|entry| entry.client_address.as_str())
        .collect::<HashSet<_>>()
        .len()
}

pub fn total_bytes(entries: &[LogEntry]) -> u64 {
    entries.iter().map(|entry| entry.bytes_sent).sum()
}

// Counting preserves first-seen order in `order`; the descending sort is
// stable, so entries with equal counts keep that order.
fn top_by<'a>(
    entries: &'a [LogEntry],
    k: usize,
    mut field: impl FnMut(&'a LogEntry) -> Option<&'a str>,
) -> Vec<(String, u64)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for entry in entries {
        let Some(key) = field(entry) else { continue };
        match counts.entry(key) {
            Entry::Occupied(mut occupied) => *occupied.get_mut() += 1,
            Entry::Vacant(vacant) => {
                order.push(key);
                vacant.insert(1);
            }
        }
    }
    order
        .into_iter()
        .map(|key| (key.to_owned(), counts[key]))
        .sorted_by(|a, b| b.1.cmp(&a.1))
        .take(k)
        .collect()
}

/// The `k` most requested paths, most frequent first.
pub fn top_paths(entries: &[LogEntry], k: usize) -> Vec<(String, u64)> {
    top_by(entries, k, |entry| Some(&entry.path))
}

/// The `k` most common referers; the `-` placeholder and empty referers are
/// not counted.
pub fn top_referers(entries: &[LogEntry], k: usize) -> Vec<(String, u64)> {
    top_by(entries, k, |entry| {
        let referer = entry.referer.as_str();
        (referer != "-" && !referer.trim().is_empty()).then_some(referer)
    })
}

/// The `k` most common user agents, `-` and empty included as-is.
pub fn top_user_agents(entries: &[LogEntry], k: usize) -> Vec<(String, u64)> {
    top_by(entries, k, |entry| Some(&entry.user_agent))
}

/// Hit count per exact status code, ascending by code.
pub fn status_buckets(entries: &[LogEntry]) -> BTreeMap<u16, u64> {
    let mut buckets = BTreeMap::new();
    for entry in entries {
        *buckets.entry(entry.status_code).or_insert(0) += 1;
    }
    buckets
}

/// Hit count per status family (404 counts under 400), ascending.
pub fn status_families(entries: &[LogEntry]) -> BTreeMap<u16, u64> {
    let mut families = BTreeMap::new();
    for entry in entries {
        *families.entry(entry.status_code / 100 * 100).or_insert(0) += 1;
    }
    families
}

/// Hit count per calendar date in the host's local zone, ascending.
pub fn hits_per_day(entries: &[LogEntry]) -> BTreeMap<NaiveDate, u64> {
    let mut days = BTreeMap::new();
    for entry in entries {
        let day = entry.timestamp.with_timezone(&Local).date_naive();
        *days.entry(day).or_insert(0) += 1;
    }
    days
}

/// Hit count per hour of day in the host's local zone. Always all 24 hours,
/// zero-filled, even for an empty input.
pub fn hits_per_hour(entries: &[LogEntry]) -> [u64; 24] {
    let mut hours = [0u64; 24];
    for entry in entries {
        let hour = entry.timestamp.with_timezone(&Local).hour() as usize;
        hours[hour] += 1;
    }
    hours
}
