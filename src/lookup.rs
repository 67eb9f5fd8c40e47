//! Lookup responses: the JSON line emitted for every classified target.

use std::net::Ipv6Addr;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::monitor::Monitor;
use crate::radix::Label;
use crate::store::AliasStore;

/// How a lookup ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LookupStatus {
    /// The target sits inside a known alias prefix.
    #[serde(rename = "success")]
    Success,
    /// No alias covers the target.
    #[serde(rename = "no-match")]
    NoMatch,
    /// Reserved catch-all; the engine itself never raises on lookup.
    #[serde(rename = "unknown-error")]
    UnknownError,
}

/// The result of a lookup on a single target.
#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    /// The target as echoed back to the caller.
    pub ip: String,
    /// Outcome class.
    pub status: LookupStatus,
    /// The engine's label.
    pub result: Label,
    /// RFC3339 time the lookup ran.
    pub timestamp: String,
    /// Error text, present only for non-success statuses.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Run one lookup against the store, record it with the monitor, and
/// build the response line.
pub fn run_lookup(
    store: &AliasStore,
    monitor: &Monitor,
    target: Ipv6Addr,
    expanded: bool,
) -> LookupResponse {
    let now = Utc::now();
    let label = store.lookup(&target.octets());
    let (status, error) = if label.aliased {
        monitor.record_success();
        (LookupStatus::Success, String::new())
    } else {
        monitor.record_failure();
        (LookupStatus::NoMatch, "no alias prefix covers the target".to_owned())
    };
    LookupResponse {
        ip: format_addr(target, expanded),
        status,
        result: label,
        timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        error,
    }
}

/// Render an address compressed, or as eight full hextets.
pub fn format_addr(addr: Ipv6Addr, expanded: bool) -> String {
    if expanded {
        let segments = addr.segments();
        let mut out = String::with_capacity(39);
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                out.push(':');
            }
            out.push_str(&format!("{segment:04x}"));
        }
        out
    } else {
        addr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radix::RadixTrie;

    #[test]
    fn response_serializes_with_status_strings() {
        let mut trie = RadixTrie::new();
        trie.insert(&"2001:db8::/32".parse().unwrap());
        let store = AliasStore::new(trie);
        let monitor = Monitor::new();

        let hit = run_lookup(&store, &monitor, "2001:db8::1".parse().unwrap(), false);
        let line = serde_json::to_string(&hit).unwrap();
        assert!(line.contains("\"status\":\"success\""));
        assert!(line.contains("\"aliased\":true"));
        assert!(line.contains("\"metadata\":\"2001:db8::/32\""));
        assert!(!line.contains("\"error\""));

        let miss = run_lookup(&store, &monitor, "2001:db9::1".parse().unwrap(), false);
        let line = serde_json::to_string(&miss).unwrap();
        assert!(line.contains("\"status\":\"no-match\""));
        assert!(line.contains("\"error\""));
        assert!(!line.contains("\"metadata\""));

        assert_eq!(monitor.successes(), 1);
        assert_eq!(monitor.failures(), 1);
    }

    #[test]
    fn expanded_rendering_spells_out_every_hextet() {
        let addr: Ipv6Addr = "2001:db8::1".parse().unwrap();
        assert_eq!(format_addr(addr, false), "2001:db8::1");
        assert_eq!(
            format_addr(addr, true),
            "2001:0db8:0000:0000:0000:0000:0000:0001"
        );
    }
}
