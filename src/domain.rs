//! Internal vs. external classification of navigation targets.
//!
//! Pure and total: no I/O, no state. Any host that cannot be parsed is
//! classified [`Classification::External`] (fail closed).

use url::Host;

/// Where a candidate host sits relative to the trust host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Internal,
    External,
}

/// Classifies `candidate_host` against `trust_host`.
///
/// - Exact mode: internal iff both hosts are equal (case-insensitive).
/// - Subdomain mode: internal iff one host is a label suffix of the other, so
///   `app.example.com` and `example.com` match each other in both directions
///   while `evilexample.com` never matches `example.com`.
///
/// IP literals only ever match exactly.
pub fn classify(candidate_host: &str, trust_host: &str, match_subdomains: bool) -> Classification {
    let (Some(candidate), Some(trust)) = (normalize(candidate_host), normalize(trust_host)) else {
        return Classification::External;
    };

    let internal = match (&candidate, &trust) {
        (Host::Domain(c), Host::Domain(t)) if match_subdomains => {
            is_label_suffix(c, t) || is_label_suffix(t, c)
        }
        _ => candidate == trust,
    };

    if internal {
        Classification::Internal
    } else {
        Classification::External
    }
}

/// Parses `raw`, dropping the root label of a fully qualified name
/// (`example.com.` is `example.com`).
fn normalize(raw: &str) -> Option<Host> {
    let raw = raw.trim();
    let raw = raw.strip_suffix('.').unwrap_or(raw);
    if raw.is_empty() {
        return None;
    }
    Host::parse(raw).ok()
}

/// `true` if `host` equals `suffix` or ends with `.` + `suffix`.
fn is_label_suffix(host: &str, suffix: &str) -> bool {
    match host.strip_suffix(suffix) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('.'),
        None => false,
    }
}
