//! Semantic version parsing and target comparison
//!
//! Versions look like `major[.minor[.patch]][-prerelease][+build]`. Comparison
//! is always made *against a target*: only the numeric components the target
//! spells out are compared, so a target of `3` equals `3.7.0`.

use std::cmp::Ordering;

/// Parsed semantic version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticVersion {
    numbers: Vec<u64>,
    prerelease: Vec<String>,
    build: Vec<String>,
}

impl SemanticVersion {
    const MAX_NUMERIC_PARTS: usize = 3;

    /// Parse a version string, returning `None` when it is malformed.
    pub fn parse(input: &str) -> Option<Self> {
        if input.is_empty() || input.chars().any(char::is_whitespace) {
            return None;
        }

        let (rest, build) = match input.split_once('+') {
            Some((rest, build)) => (rest, identifiers(build)?),
            None => (input, Vec::new()),
        };
        let (core, prerelease) = match rest.split_once('-') {
            Some((core, prerelease)) => (core, identifiers(prerelease)?),
            None => (rest, Vec::new()),
        };

        let numbers = core
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    None
                } else {
                    part.parse::<u64>().ok()
                }
            })
            .collect::<Option<Vec<_>>>()?;
        if numbers.len() > Self::MAX_NUMERIC_PARTS {
            return None;
        }

        Some(Self {
            numbers,
            prerelease,
            build,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }

    pub fn build(&self) -> &[String] {
        &self.build
    }

    /// Order `self` (the user's version) relative to `target`.
    ///
    /// Numeric components missing from the target are wildcards; components
    /// missing from `self` make it the lesser version. A prerelease orders
    /// before the same numeric version without one. Build metadata is ignored.
    pub fn compare_to_target(&self, target: &SemanticVersion) -> Ordering {
        for (index, wanted) in target.numbers.iter().enumerate() {
            let Some(actual) = self.numbers.get(index) else {
                return Ordering::Less;
            };
            match actual.cmp(wanted) {
                Ordering::Equal => {}
                other => return other,
            }
        }

        match (self.is_prerelease(), target.is_prerelease()) {
            (false, false) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (true, true) => compare_prerelease(&self.prerelease, &target.prerelease),
        }
    }
}

fn identifiers(section: &str) -> Option<Vec<String>> {
    section
        .split('.')
        .map(|identifier| {
            let valid = !identifier.is_empty()
                && identifier
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-');
            valid.then(|| identifier.to_string())
        })
        .collect()
}

fn compare_prerelease(left: &[String], right: &[String]) -> Ordering {
    for (a, b) in left.iter().zip(right) {
        let ordering = match (a.parse::<u64>(), b.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => a.cmp(b),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    left.len().cmp(&right.len())
}
