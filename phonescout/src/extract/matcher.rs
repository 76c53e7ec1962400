use once_cell::sync::Lazy;
use regex::{CaptureMatches, Captures, Regex};
use serde::Serialize;
use std::fmt;

use super::chunker::RawBlock;

/// Prefix, then code (3), A (3), B (2), C (2), with any non-digit run allowed
/// between them. ASCII digits only so the canonical form stays ASCII.
///
/// Filler never crosses `\n`: blocks are cut on line terminators, so a match
/// confined to one line is found the same way whatever the block size. A
/// number broken over a line break is therefore not reported.
const PHONE_PATTERN: &str = concat!(
    r"(?:\+7|8)[^0-9\n]*",
    r"(?P<code>[0-9]{3})[^0-9\n]*",
    r"(?P<a>[0-9]{3})[^0-9\n]*",
    r"(?P<b>[0-9]{2})[^0-9\n]*",
    r"(?P<c>[0-9]{2})",
);

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(PHONE_PATTERN).expect("Invalid phone number pattern"));

/// A phone number in the normalized `+7(CODE)AAA-BB-CC` form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalNumber(String);

impl CanonicalNumber {
    fn from_captures(caps: &Captures<'_>) -> Self {
        Self(format!(
            "+7({}){}-{}-{}",
            &caps["code"], &caps["a"], &caps["b"], &caps["c"]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for CanonicalNumber {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Applies the phone number grammar to text fragments
#[derive(Debug, Clone, Copy)]
pub struct PhoneMatcher {
    regex: &'static Regex,
}

impl PhoneMatcher {
    /// Creates a matcher backed by the shared compiled pattern
    pub fn new() -> Self {
        Self { regex: &PHONE_RE }
    }

    /// Lazily yields normalized numbers in order of match start.
    ///
    /// Matches never overlap; scanning resumes after the end of each match.
    pub fn extract<'t>(&self, text: &'t str) -> Extractions<'t> {
        Extractions {
            inner: self.regex.captures_iter(text),
        }
    }

    /// Collects every number found in a block
    pub fn extract_block(&self, block: &RawBlock) -> Vec<CanonicalNumber> {
        self.extract(block.text()).collect()
    }

    /// Byte spans of the raw matches, before normalization
    pub fn find_spans(&self, text: &str) -> Vec<(usize, usize)> {
        self.regex
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect()
    }

    pub fn count(&self, text: &str) -> usize {
        self.regex.find_iter(text).count()
    }
}

impl Default for PhoneMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`PhoneMatcher::extract`]
pub struct Extractions<'t> {
    inner: CaptureMatches<'static, 't>,
}

impl Iterator for Extractions<'_> {
    type Item = CanonicalNumber;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|caps| CanonicalNumber::from_captures(&caps))
    }
}
