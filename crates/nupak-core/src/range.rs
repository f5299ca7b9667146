//! Version range constraints: matching, intersection, parsing, rendering.
//!
//! Every range decomposes into an optional lower and an optional upper edge.
//! Intersection keeps the tighter edge on each side and recomposes the result
//! into the canonical variant, so the algebra is closed: the outcome is
//! always a [`VersionRange`] or explicitly unsatisfiable.

use std::cmp::Ordering;
use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use crate::version::SemVer;

/// Whether a range edge includes its version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bound {
    Including,
    Excluding,
}

/// A constraint on acceptable versions of a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionRange {
    NoRestriction,
    Specific(SemVer),
    Minimum(SemVer),
    GreaterThan(SemVer),
    Maximum(SemVer),
    LessThan(SemVer),
    Range(Bound, SemVer, SemVer, Bound),
}

/// A version range string that could not be parsed.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
#[error("invalid version range '{text}': {reason}")]
#[diagnostic(code(nupak::range::parse))]
pub struct RangeParseError {
    pub text: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
struct Edge {
    version: SemVer,
    bound: Bound,
}

impl Edge {
    fn new(version: &SemVer, bound: Bound) -> Self {
        Self {
            version: version.clone(),
            bound,
        }
    }
}

impl VersionRange {
    /// Check if a version satisfies this range.
    pub fn contains(&self, version: &SemVer) -> bool {
        match self {
            VersionRange::NoRestriction => true,
            VersionRange::Specific(v) => version == v,
            VersionRange::Minimum(v) => version >= v,
            VersionRange::GreaterThan(v) => version > v,
            VersionRange::Maximum(v) => version <= v,
            VersionRange::LessThan(v) => version < v,
            VersionRange::Range(lower, from, to, upper) => {
                let above = match lower {
                    Bound::Including => version >= from,
                    Bound::Excluding => version > from,
                };
                let below = match upper {
                    Bound::Including => version <= to,
                    Bound::Excluding => version < to,
                };
                above && below
            }
        }
    }

    /// The tightest range matched by both `self` and `other`.
    ///
    /// Returns `None` when no version can satisfy both.
    pub fn intersect(&self, other: &VersionRange) -> Option<VersionRange> {
        let (a_lower, a_upper) = self.edges();
        let (b_lower, b_upper) = other.edges();
        let lower = tighter(a_lower, b_lower, Ordering::Greater);
        let upper = tighter(a_upper, b_upper, Ordering::Less);
        recompose(lower, upper)
    }

    /// The canonical spelling of this range, or `None` if it matches nothing.
    ///
    /// `Range(Including, v, v, Including)` becomes `Specific(v)`, and a range
    /// whose lower edge sits above its upper edge is empty.
    pub fn canonical(&self) -> Option<VersionRange> {
        let (lower, upper) = self.edges();
        recompose(lower, upper)
    }

    fn edges(&self) -> (Option<Edge>, Option<Edge>) {
        use Bound::*;
        match self {
            VersionRange::NoRestriction => (None, None),
            VersionRange::Specific(v) => (Some(Edge::new(v, Including)), Some(Edge::new(v, Including))),
            VersionRange::Minimum(v) => (Some(Edge::new(v, Including)), None),
            VersionRange::GreaterThan(v) => (Some(Edge::new(v, Excluding)), None),
            VersionRange::Maximum(v) => (None, Some(Edge::new(v, Including))),
            VersionRange::LessThan(v) => (None, Some(Edge::new(v, Excluding))),
            VersionRange::Range(lower, from, to, upper) => {
                (Some(Edge::new(from, *lower)), Some(Edge::new(to, *upper)))
            }
        }
    }

    /// Parse a range in lock file rendering or operator form.
    ///
    /// Accepts an empty string (no restriction), a bare version (exact),
    /// `= v`, `>= v`, `> v`, `<= v`, `< v`, `~> v` (pessimistic), and a
    /// lower constraint followed by an upper one separated by a comma.
    pub fn parse(text: &str) -> Result<Self, RangeParseError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(VersionRange::NoRestriction);
        }
        let fail = |reason: String| RangeParseError {
            text: text.to_string(),
            reason,
        };

        if let Some((low, high)) = trimmed.split_once(',') {
            let (lower, from) = match parse_single(low).map_err(&fail)? {
                VersionRange::Minimum(v) => (Bound::Including, v),
                VersionRange::GreaterThan(v) => (Bound::Excluding, v),
                _ => return Err(fail("first part of a range must be '>=' or '>'".to_string())),
            };
            let (to, upper) = match parse_single(high).map_err(&fail)? {
                VersionRange::Maximum(v) => (v, Bound::Including),
                VersionRange::LessThan(v) => (v, Bound::Excluding),
                _ => return Err(fail("second part of a range must be '<=' or '<'".to_string())),
            };
            return Ok(VersionRange::Range(lower, from, to, upper));
        }

        parse_single(trimmed).map_err(fail)
    }
}

fn parse_single(text: &str) -> Result<VersionRange, String> {
    let text = text.trim();
    let version = |rest: &str| SemVer::parse(rest.trim()).map_err(|e| e.reason);

    // Two-character operators first so `>=` is not read as `>`.
    if let Some(rest) = text.strip_prefix("~>") {
        let floor = version(rest)?;
        let ceiling = floor.pessimistic_ceiling();
        return Ok(VersionRange::Range(
            Bound::Including,
            floor,
            ceiling,
            Bound::Excluding,
        ));
    }
    if let Some(rest) = text.strip_prefix(">=") {
        return Ok(VersionRange::Minimum(version(rest)?));
    }
    if let Some(rest) = text.strip_prefix("<=") {
        return Ok(VersionRange::Maximum(version(rest)?));
    }
    if let Some(rest) = text.strip_prefix('>') {
        return Ok(VersionRange::GreaterThan(version(rest)?));
    }
    if let Some(rest) = text.strip_prefix('<') {
        return Ok(VersionRange::LessThan(version(rest)?));
    }
    if let Some(rest) = text.strip_prefix('=') {
        return Ok(VersionRange::Specific(version(rest)?));
    }
    Ok(VersionRange::Specific(version(text)?))
}

/// Pick the more restrictive of two edges. `prefer` is the ordering of the
/// winning version relative to the other (greater for lower edges, less for
/// upper edges). On equal versions an excluding edge wins.
fn tighter(a: Option<Edge>, b: Option<Edge>, prefer: Ordering) -> Option<Edge> {
    match (a, b) {
        (None, edge) | (edge, None) => edge,
        (Some(a), Some(b)) => match a.version.cmp(&b.version) {
            Ordering::Equal => {
                if b.bound == Bound::Excluding {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            ord if ord == prefer => Some(a),
            _ => Some(b),
        },
    }
}

fn recompose(lower: Option<Edge>, upper: Option<Edge>) -> Option<VersionRange> {
    use Bound::*;
    let range = match (lower, upper) {
        (None, None) => VersionRange::NoRestriction,
        (Some(l), None) => match l.bound {
            Including => VersionRange::Minimum(l.version),
            Excluding => VersionRange::GreaterThan(l.version),
        },
        (None, Some(u)) => match u.bound {
            Including => VersionRange::Maximum(u.version),
            Excluding => VersionRange::LessThan(u.version),
        },
        (Some(l), Some(u)) => match l.version.cmp(&u.version) {
            Ordering::Greater => return None,
            Ordering::Equal => {
                if l.bound == Including && u.bound == Including {
                    VersionRange::Specific(l.version)
                } else {
                    return None;
                }
            }
            Ordering::Less => VersionRange::Range(l.bound, l.version, u.version, u.bound),
        },
    };
    Some(range)
}

/// Canonical lock file rendering. `NoRestriction` renders as an empty
/// string; callers omit the parentheses for it.
impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionRange::NoRestriction => Ok(()),
            VersionRange::Specific(v) => write!(f, "{v}"),
            VersionRange::Minimum(v) => write!(f, ">= {v}"),
            VersionRange::GreaterThan(v) => write!(f, "> {v}"),
            VersionRange::Maximum(v) => write!(f, "<= {v}"),
            VersionRange::LessThan(v) => write!(f, "< {v}"),
            VersionRange::Range(lower, from, to, upper) => {
                let low = match lower {
                    Bound::Including => ">=",
                    Bound::Excluding => ">",
                };
                let high = match upper {
                    Bound::Including => "<=",
                    Bound::Excluding => "<",
                };
                write!(f, "{low} {from}, {high} {to}")
            }
        }
    }
}

impl std::str::FromStr for VersionRange {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
