use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::extract::matcher::CanonicalNumber;
use crate::metrics::MetricsSnapshot;

/// Unique numbers in order of first appearance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    numbers: Vec<CanonicalNumber>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CanonicalNumber> {
        self.numbers.iter()
    }

    pub fn as_slice(&self) -> &[CanonicalNumber] {
        &self.numbers
    }

    pub fn into_vec(self) -> Vec<CanonicalNumber> {
        self.numbers
    }
}

impl IntoIterator for ResultSet {
    type Item = CanonicalNumber;
    type IntoIter = std::vec::IntoIter<CanonicalNumber>;

    fn into_iter(self) -> Self::IntoIter {
        self.numbers.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a CanonicalNumber;
    type IntoIter = std::slice::Iter<'a, CanonicalNumber>;

    fn into_iter(self) -> Self::IntoIter {
        self.numbers.iter()
    }
}

/// Folds ordered per-block match lists into a [`ResultSet`].
///
/// Must be fed blocks in file order; the first occurrence of a number fixes
/// its position and later repeats are dropped.
#[derive(Debug, Default)]
pub struct Aggregator {
    seen: HashSet<CanonicalNumber>,
    numbers: Vec<CanonicalNumber>,
    raw_matches: u64,
    batches: u64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one block's matches, in their in-block order
    pub fn absorb(&mut self, batch: Vec<CanonicalNumber>) {
        self.batches += 1;
        self.raw_matches += batch.len() as u64;
        for number in batch {
            if !self.seen.contains(&number) {
                self.seen.insert(number.clone());
                self.numbers.push(number);
            }
        }
    }

    /// Matches seen so far, repeats included
    pub fn raw_matches(&self) -> u64 {
        self.raw_matches
    }

    pub fn batches(&self) -> u64 {
        self.batches
    }

    pub fn unique(&self) -> usize {
        self.numbers.len()
    }

    pub fn finish(self) -> ResultSet {
        ResultSet {
            numbers: self.numbers,
        }
    }
}

/// Everything a completed run produced
#[derive(Debug, Clone, Serialize)]
pub struct ExtractOutput {
    /// Unique numbers in first-seen order
    pub numbers: ResultSet,
    /// Pipeline counters at completion
    pub stats: MetricsSnapshot,
    /// Wall-clock time of the extraction
    #[serde(skip)]
    pub elapsed: Duration,
}
