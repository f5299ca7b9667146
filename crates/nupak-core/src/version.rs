//! Semantic version parsing and precedence.
//!
//! Registry versions are looser than strict SemVer 2.0:
//! - One to four numeric parts (`0.23`, `3.2.1`, `1.0.0.4`); missing parts
//!   compare as zero
//! - An optional `-prerelease` tail whose identifiers compare dot-wise,
//!   numbers numerically and below text, text case-insensitively
//! - An optional `+metadata` tail that never affects precedence
//! - A release sorts after every pre-release of the same numbers

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use thiserror::Error;

/// Maximum number of dot-separated numeric parts.
const MAX_NUMERIC_PARTS: usize = 4;

/// A version string that could not be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid version '{text}': {reason}")]
pub struct VersionParseError {
    pub text: String,
    pub reason: String,
}

/// A parsed package version.
///
/// Equality and ordering follow precedence, so `1.0` equals `1.0.0`; the
/// original spelling is kept for display.
#[derive(Debug, Clone)]
pub struct SemVer {
    original: String,
    numbers: [u64; MAX_NUMERIC_PARTS],
    parts: usize,
    pre_release: Vec<Identifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Identifier {
    Numeric(u64),
    Text(String),
}

impl SemVer {
    pub fn parse(text: &str) -> Result<Self, VersionParseError> {
        let original = text.trim();
        let fail = |reason: &str| VersionParseError {
            text: text.to_string(),
            reason: reason.to_string(),
        };
        if original.is_empty() {
            return Err(fail("empty version"));
        }

        let without_meta = match original.split_once('+') {
            Some((head, meta)) => {
                if meta.is_empty() {
                    return Err(fail("empty build metadata"));
                }
                head
            }
            None => original,
        };
        let (numeric, pre) = match without_meta.split_once('-') {
            Some((head, pre)) => (head, Some(pre)),
            None => (without_meta, None),
        };

        let mut numbers = [0u64; MAX_NUMERIC_PARTS];
        let mut parts = 0;
        for token in numeric.split('.') {
            if parts == MAX_NUMERIC_PARTS {
                return Err(fail("too many numeric parts"));
            }
            if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
                return Err(fail(&format!("'{token}' is not a number")));
            }
            numbers[parts] = token
                .parse::<u64>()
                .map_err(|_| fail(&format!("'{token}' is out of range")))?;
            parts += 1;
        }

        let mut pre_release = Vec::new();
        if let Some(pre) = pre {
            for token in pre.split('.') {
                if token.is_empty() {
                    return Err(fail("empty pre-release identifier"));
                }
                if !token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                    return Err(fail(&format!("invalid pre-release identifier '{token}'")));
                }
                pre_release.push(classify(token));
            }
        }

        Ok(Self {
            original: original.to_string(),
            numbers,
            parts,
            pre_release,
        })
    }

    /// The exclusive upper bound of a pessimistic (`~>`) constraint.
    ///
    /// `3.2.1` becomes `3.3`, `0.23` becomes `1`, and a single-part `2`
    /// becomes `3`.
    pub fn pessimistic_ceiling(&self) -> SemVer {
        let keep = self.parts.saturating_sub(1).max(1);
        let mut numbers: Vec<u64> = self.numbers[..keep].to_vec();
        if let Some(last) = numbers.last_mut() {
            *last += 1;
        }
        let text = numbers
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(".");
        let mut padded = [0u64; MAX_NUMERIC_PARTS];
        padded[..numbers.len()].copy_from_slice(&numbers);
        SemVer {
            original: text,
            numbers: padded,
            parts: numbers.len(),
            pre_release: Vec::new(),
        }
    }
}

fn classify(token: &str) -> Identifier {
    match token.parse::<u64>() {
        Ok(n) if token.chars().all(|c| c.is_ascii_digit()) => Identifier::Numeric(n),
        _ => Identifier::Text(token.to_ascii_lowercase()),
    }
}

fn compare_identifiers(a: &Identifier, b: &Identifier) -> Ordering {
    match (a, b) {
        (Identifier::Numeric(a), Identifier::Numeric(b)) => a.cmp(b),
        (Identifier::Numeric(_), Identifier::Text(_)) => Ordering::Less,
        (Identifier::Text(_), Identifier::Numeric(_)) => Ordering::Greater,
        (Identifier::Text(a), Identifier::Text(b)) => a.cmp(b),
    }
}

fn compare_pre_release(a: &[Identifier], b: &[Identifier]) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    for (x, y) in a.iter().zip(b) {
        let ord = compare_identifiers(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

impl Ord for SemVer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numbers
            .cmp(&other.numbers)
            .then_with(|| compare_pre_release(&self.pre_release, &other.pre_release))
    }
}

impl PartialOrd for SemVer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SemVer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemVer {}

impl Hash for SemVer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.numbers.hash(state);
        for id in &self.pre_release {
            match id {
                Identifier::Numeric(n) => n.hash(state),
                Identifier::Text(s) => s.hash(state),
            }
        }
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl std::str::FromStr for SemVer {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
