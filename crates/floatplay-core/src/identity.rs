//! Canonical identity for candidates.
//!
//! Two candidates are the *same* media for all lifecycle purposes when
//! their canonical keys compare equal, even across re-scans or session
//! parameter churn. The key combines:
//!
//! - the source locator canonicalized for known platforms (volatile
//!   query parameters stripped, content-id parameters kept), and
//! - the display title with known suffix noise removed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Candidate;

// ─── Known Platforms ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Platform {
    YouTube,
    Vimeo,
    Twitch,
    Dailymotion,
}

impl Platform {
    pub const ALL: [Self; 4] = [
        Self::YouTube,
        Self::Vimeo,
        Self::Twitch,
        Self::Dailymotion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::YouTube => "youtube",
            Self::Vimeo => "vimeo",
            Self::Twitch => "twitch",
            Self::Dailymotion => "dailymotion",
        }
    }

    /// Host suffixes identifying the platform.
    fn host_tokens(self) -> &'static [&'static str] {
        match self {
            Self::YouTube => &["youtube.com", "youtu.be", "youtube-nocookie.com"],
            Self::Vimeo => &["vimeo.com"],
            Self::Twitch => &["twitch.tv"],
            Self::Dailymotion => &["dailymotion.com", "dai.ly"],
        }
    }

    /// Query parameters that carry content identity (everything else is
    /// session/tracking churn and gets stripped).
    fn content_params(self) -> &'static [&'static str] {
        match self {
            Self::YouTube => &["v"],
            Self::Vimeo => &[],
            Self::Twitch => &["video"],
            Self::Dailymotion => &["video"],
        }
    }

    /// Path prefixes of the platform's primary player pages.
    fn primary_paths(self) -> &'static [&'static str] {
        match self {
            Self::YouTube => &["/watch", "/embed/", "/shorts/"],
            Self::Vimeo => &["/video/", "/"],
            Self::Twitch => &["/videos/", "/"],
            Self::Dailymotion => &["/video/", "/embed/video/"],
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identify the platform a locator belongs to, by host suffix.
pub fn known_platform(locator: &str) -> Option<Platform> {
    let host = host_of(locator)?;
    for platform in Platform::ALL {
        for token in platform.host_tokens() {
            if host == *token || host.ends_with(&format!(".{token}")) {
                return Some(platform);
            }
        }
    }
    None
}

/// Whether the locator points at a known platform's primary player page.
pub fn is_primary_player(locator: &str) -> bool {
    let Some(platform) = known_platform(locator) else {
        return false;
    };
    let path = path_of(locator);
    platform.primary_paths().iter().any(|prefix| {
        if *prefix == "/" {
            // Bare channel/video path: non-empty path below the root.
            path.len() > 1
        } else {
            path.starts_with(prefix)
        }
    })
}

// ─── Locator Canonicalization ─────────────────────────────────────

/// Tracking parameters dropped from locators on any host.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "si",
    "feature",
    "ref",
    "ref_src",
    "t",
    "start",
    "pp",
];

/// Canonicalize a source locator so identity comparisons are stable
/// against tracking/session parameter churn.
///
/// Lowercases scheme and host, strips default ports and fragments,
/// trims trailing slashes, and filters the query: known platforms keep
/// only their content-id parameters, unknown hosts drop the tracking
/// set and sort the remainder.
pub fn canonicalize_locator(locator: &str) -> String {
    let trimmed = locator.trim();
    let Some((scheme, rest)) = trimmed.split_once("://") else {
        return trimmed.to_string();
    };
    let scheme = scheme.to_ascii_lowercase();

    // Fragment never participates in identity.
    let rest = rest.split('#').next().unwrap_or(rest);

    let (authority, path_and_query) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };

    let host = strip_default_port(&authority.to_ascii_lowercase(), &scheme);

    let (path, query) = match path_and_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_and_query, None),
    };
    let path = path.trim_end_matches('/');

    let platform = known_platform(trimmed);
    let query = query.map(|q| filter_query(q, platform)).unwrap_or_default();

    if query.is_empty() {
        format!("{scheme}://{host}{path}")
    } else {
        format!("{scheme}://{host}{path}?{query}")
    }
}

fn strip_default_port(host: &str, scheme: &str) -> String {
    let default = match scheme {
        "https" | "wss" => ":443",
        "http" | "ws" => ":80",
        _ => return host.to_string(),
    };
    host.strip_suffix(default).unwrap_or(host).to_string()
}

/// Filter a raw query string down to identity-relevant pairs.
fn filter_query(query: &str, platform: Option<Platform>) -> String {
    let mut kept: Vec<(&str, &str)> = Vec::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let keep = match platform {
            Some(p) => p.content_params().contains(&key),
            None => !TRACKING_PARAMS.contains(&key),
        };
        if keep {
            kept.push((key, value));
        }
    }
    // Stable ordering: parameter order must never affect identity.
    kept.sort();
    kept.iter()
        .map(|(k, v)| {
            if v.is_empty() {
                (*k).to_string()
            } else {
                format!("{k}={v}")
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn host_of(locator: &str) -> Option<String> {
    let rest = locator.trim().split_once("://")?.1;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host = authority.split(':').next().unwrap_or(authority);
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}

fn path_of(locator: &str) -> String {
    let Some((_, rest)) = locator.trim().split_once("://") else {
        return String::new();
    };
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    match rest.find('/') {
        Some(idx) => rest[idx..].to_string(),
        None => "/".to_string(),
    }
}

// ─── Title Normalization ──────────────────────────────────────────

/// Suffix noise appended by known platforms, matched case-insensitively
/// against the end of the title.
const TITLE_SUFFIX_NOISE: &[&str] = &[
    "- youtube",
    "- youtube music",
    "on vimeo",
    "| vimeo",
    "- twitch",
    "- dailymotion",
];

/// Normalize a display title: trim, collapse whitespace, drop a leading
/// notification counter like `(3) `, strip known platform suffixes, and
/// case-fold.
pub fn normalize_title(title: &str) -> String {
    let collapsed = title.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut lowered = collapsed.to_lowercase();

    // Leading "(N) " notification counter.
    if lowered.starts_with('(') {
        if let Some(close) = lowered.find(") ") {
            if lowered[1..close].chars().all(|c| c.is_ascii_digit()) && close > 1 {
                lowered = lowered[close + 2..].to_string();
            }
        }
    }

    loop {
        let before = lowered.len();
        for suffix in TITLE_SUFFIX_NOISE {
            if let Some(stripped) = lowered.strip_suffix(suffix) {
                lowered = stripped.trim_end().to_string();
            }
        }
        if lowered.len() == before {
            break;
        }
    }

    lowered.trim().to_string()
}

// ─── Canonical Key ────────────────────────────────────────────────

/// Fixed-width canonical identity: paired stable hashes of the
/// canonicalized locator and the normalized title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalKey {
    pub source: u64,
    pub title: u64,
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}-{:016x}", self.source, self.title)
    }
}

/// FNV-1a, 64-bit. Stable across runs and platforms, which DefaultHasher
/// does not guarantee.
fn fnv1a64(input: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for byte in input.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Derive the canonical key for a candidate.
pub fn normalize(candidate: &Candidate) -> CanonicalKey {
    CanonicalKey {
        source: fnv1a64(&canonicalize_locator(&candidate.locator)),
        title: fnv1a64(&normalize_title(&candidate.title)),
    }
}

// ─── Tests ────────────────────────────────────────────────────────
