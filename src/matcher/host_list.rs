//! Host list provisioning and lookup.
//!
//! # Responsibilities
//! - Convert entries to ASCII and reject case-insensitive duplicates
//! - Partition large lists: fuzzy entries first, exact entries sorted after
//! - Answer membership for a request host (binary search, then linear scan)
//!
//! # Design Decisions
//! - Provisioned once, read-only afterwards (shared without locks)
//! - Fuzzy/exact boundary and a lowercase exact index are computed once
//! - Malformed input never errors at lookup time, it simply does not match

use std::collections::HashMap;

use idna::AsciiDenyList;

use crate::matcher::error::{ProvisionError, ProvisionResult};
use crate::replacer::Replacer;

/// Lists with more entries than this are partitioned for fast lookup.
pub const LARGE_LIST_THRESHOLD: usize = 100;

/// Returns true if the pattern needs linear evaluation (wildcard or placeholder).
pub fn is_fuzzy(pattern: &str) -> bool {
    pattern.contains(['*', '{'])
}

/// A provisioned, immutable list of host patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostList {
    /// Entries in lookup order.
    entries: Vec<String>,
    /// Index of the first exact entry (large lists only).
    boundary: usize,
    /// Sorted lowercase copies of the exact entries (large lists only).
    exact_index: Vec<String>,
}

impl HostList {
    /// Normalize, validate and (for large lists) partition the raw entries.
    pub fn provision(hosts: Vec<String>) -> ProvisionResult<Self> {
        let mut entries = hosts;
        let mut seen: HashMap<String, usize> = HashMap::with_capacity(entries.len());

        for (index, host) in entries.iter_mut().enumerate() {
            let ascii = to_ascii(host)?;
            let normalized = ascii.to_ascii_lowercase();
            if let Some(&first) = seen.get(&normalized) {
                return Err(ProvisionError::DuplicateHost {
                    first,
                    index,
                    host: host.clone(),
                });
            }
            seen.insert(normalized, index);
            *host = ascii;
        }

        if entries.len() <= LARGE_LIST_THRESHOLD {
            return Ok(Self {
                entries,
                boundary: 0,
                exact_index: Vec::new(),
            });
        }

        // Fuzzy entries first, then byte-wise ascending within each class.
        entries.sort_by(|a, b| is_fuzzy(b).cmp(&is_fuzzy(a)).then_with(|| a.cmp(b)));

        let boundary = entries.partition_point(|h| is_fuzzy(h));
        let mut exact_index: Vec<String> = entries[boundary..]
            .iter()
            .map(|h| h.to_ascii_lowercase())
            .collect();
        exact_index.sort_unstable();

        Ok(Self {
            entries,
            boundary,
            exact_index,
        })
    }

    /// Entries in lookup order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the list is partitioned and the binary-search fast path applies.
    pub fn is_large(&self) -> bool {
        self.entries.len() > LARGE_LIST_THRESHOLD
    }

    /// Number of fuzzy entries.
    pub fn fuzzy_count(&self) -> usize {
        if self.is_large() {
            self.boundary
        } else {
            self.entries.iter().filter(|h| is_fuzzy(h)).count()
        }
    }

    /// Returns true if `host` matches any entry.
    ///
    /// `host` must already be stripped of its port and IPv6 brackets.
    pub fn contains(&self, host: &str, repl: &dyn Replacer) -> bool {
        let candidates = if self.is_large() {
            if self
                .exact_index
                .binary_search(&host.to_ascii_lowercase())
                .is_ok()
            {
                return true;
            }
            // Exact entries were ruled out above; only the fuzzy prefix can still match.
            &self.entries[..self.boundary]
        } else {
            &self.entries[..]
        };

        candidates.iter().any(|pattern| {
            let pattern = repl.replace_all(pattern);
            if pattern.contains('*') {
                wildcard_matches(&pattern, host)
            } else {
                eq_fold(&pattern, host)
            }
        })
    }
}

/// Segment-wise comparison where `*` matches exactly one label.
pub fn wildcard_matches(pattern: &str, host: &str) -> bool {
    if pattern.split('.').count() != host.split('.').count() {
        return false;
    }
    pattern
        .split('.')
        .zip(host.split('.'))
        .all(|(p, h)| p == "*" || eq_fold(p, h))
}

fn eq_fold(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        a.eq_ignore_ascii_case(b)
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

/// ASCII entries are kept verbatim so placeholders and case survive;
/// anything else goes through UTS-46 processing with the URL deny list.
fn to_ascii(host: &str) -> ProvisionResult<String> {
    if host.is_ascii() {
        return Ok(host.to_string());
    }
    idna::domain_to_ascii_cow(host.as_bytes(), AsciiDenyList::URL)
        .map(|ascii| ascii.into_owned())
        .map_err(|e| ProvisionError::Encoding {
            host: host.to_string(),
            reason: e.to_string(),
        })
}
