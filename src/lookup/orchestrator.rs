//! Batch query orchestration.
//!
//! Flow: drop blank lines → for each IP, in order: fetch → normalize → push.
//! Lookups run strictly one after another so output order matches input order and one
//! failure never affects its neighbours. Running them in parallel would change both.

use super::normalize::normalize;
use super::providers::{GeoLookup, ProviderProfile};
use super::types::{QueryResult, SessionError};
use std::collections::HashSet;

/// Runs one sequential lookup per IP.
pub struct QueryOrchestrator<'a> {
    lookup: &'a dyn GeoLookup,
    profile: &'a ProviderProfile,
}

impl<'a> QueryOrchestrator<'a> {
    pub fn new(lookup: &'a dyn GeoLookup, profile: &'a ProviderProfile) -> Self {
        Self { lookup, profile }
    }

    /// Query every non-blank line. No retries: each IP is attempted exactly once.
    pub fn run_query<S: AsRef<str>>(&self, lines: &[S]) -> Result<Vec<QueryResult>, SessionError> {
        let ips = non_blank(lines);
        if ips.is_empty() {
            return Err(SessionError::EmptyInput);
        }

        log::info!("Querying {} IP(s) via {}", ips.len(), self.profile.name);

        let mut results = Vec::with_capacity(ips.len());
        for ip in ips {
            let ip = ip.trim();
            let result = normalize(self.lookup.fetch(ip), ip, self.profile);
            match result.lookup_error() {
                Some(err) => log::warn!("{}", err),
                None => log::debug!("{}", result.display_line()),
            }
            results.push(result);
        }

        let failed = results.iter().filter(|r| !r.is_success()).count();
        log::info!("Query finished: {} ok, {} failed", results.len() - failed, failed);
        Ok(results)
    }
}

/// Lines with at least one non-whitespace character, untouched otherwise.
pub fn non_blank<S: AsRef<str>>(lines: &[S]) -> Vec<&str> {
    lines
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|l| !l.trim().is_empty())
        .collect()
}

/// Split raw input text into lines, dropping blank ones.
pub fn input_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Remove exact-string duplicates, keeping the first occurrence of each line.
///
/// Returns the unique lines and how many were removed. No IP normalization:
/// "1.2.3.4" and "1.2.3.04" are different lines.
pub fn dedupe<S: AsRef<str>>(lines: &[S]) -> (Vec<String>, usize) {
    let mut seen = HashSet::with_capacity(lines.len());
    let unique: Vec<String> = lines
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|l| seen.insert(*l))
        .map(str::to_string)
        .collect();
    let removed = lines.len() - unique.len();
    (unique, removed)
}
