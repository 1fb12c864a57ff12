//! Content negotiation against the `Accept` request header.
//!
//! # Responsibilities
//! - Parse an `Accept` header into media ranges with quality values
//! - Decide whether a produced type is acceptable at all
//! - Score a produced type so the most specific route can be selected
//!
//! # Design Decisions
//! - A missing or blank header means `*/*`
//! - Ranges with `q=0` never match
//! - Score is `(q, exactness)`: quality first, then how many of type and
//!   subtype are literally equal, so `*/*` prefers a `*/*` route and
//!   `application/json` prefers an `application/json` route
//! - Malformed ranges are skipped rather than rejected

use std::cmp::Ordering;

/// The produced type used when a route or filter does not declare one.
pub const ANY: &str = "*/*";

/// A single `type/subtype;q=..` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    kind: String,
    subtype: String,
    quality: f32,
}

impl MediaRange {
    /// Parse one media range. Returns `None` for malformed input.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(';');
        let essence = parts.next()?.trim();
        let (kind, subtype) = essence.split_once('/')?;
        let (kind, subtype) = (kind.trim(), subtype.trim());
        if kind.is_empty() || subtype.is_empty() {
            return None;
        }

        let mut quality = 1.0;
        for param in parts {
            if let Some((key, value)) = param.split_once('=') {
                if key.trim().eq_ignore_ascii_case("q") {
                    quality = value.trim().parse::<f32>().ok()?.clamp(0.0, 1.0);
                }
            }
        }

        Some(Self {
            kind: kind.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            quality,
        })
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    fn compatible(&self, other: &MediaRange) -> bool {
        component_matches(&self.kind, &other.kind) && component_matches(&self.subtype, &other.subtype)
    }

    fn exactness(&self, other: &MediaRange) -> u8 {
        u8::from(self.kind == other.kind) + u8::from(self.subtype == other.subtype)
    }
}

fn component_matches(a: &str, b: &str) -> bool {
    a == "*" || b == "*" || a == b
}

/// A parsed `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptHeader {
    ranges: Vec<MediaRange>,
}

/// How well a produced type fits a header. Higher is better.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fitness {
    quality: f32,
    exactness: u8,
}

impl PartialOrd for Fitness {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.quality.partial_cmp(&other.quality)? {
            Ordering::Equal => Some(self.exactness.cmp(&other.exactness)),
            ord => Some(ord),
        }
    }
}

impl AcceptHeader {
    /// Parse a header value. `None` or an empty value means `*/*`.
    pub fn parse(header: Option<&str>) -> Self {
        let ranges: Vec<MediaRange> = header
            .unwrap_or_default()
            .split(',')
            .filter_map(MediaRange::parse)
            .collect();

        if ranges.is_empty() {
            return Self::any();
        }
        Self { ranges }
    }

    /// The header a client sends when it accepts anything.
    pub fn any() -> Self {
        Self {
            ranges: vec![MediaRange {
                kind: "*".to_string(),
                subtype: "*".to_string(),
                quality: 1.0,
            }],
        }
    }

    pub fn ranges(&self) -> &[MediaRange] {
        &self.ranges
    }

    /// Best fitness of `produced` against this header, or `None` if unacceptable.
    pub fn fitness(&self, produced: &str) -> Option<Fitness> {
        let produced = MediaRange::parse(produced)?;
        self.ranges
            .iter()
            .filter(|range| range.quality > 0.0 && range.compatible(&produced))
            .map(|range| Fitness {
                quality: range.quality,
                exactness: range.exactness(&produced),
            })
            .fold(None, |best: Option<Fitness>, candidate| match best {
                Some(b) if b >= candidate => Some(b),
                _ => Some(candidate),
            })
    }

    /// True if `produced` is acceptable at all.
    pub fn accepts(&self, produced: &str) -> bool {
        self.fitness(produced).is_some()
    }
}
