// Numan Thabit 2025
//! Per-panel query reference ids (`A`, `B`, `C`, ...).

use std::fmt;

use serde::{Deserialize, Serialize};

const ALPHABET_LEN: usize = 26;

/// Identifier tying a query target to its panel. Unique only within one panel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefId(String);

impl RefId {
    /// Reference id for a zero-based allocation index.
    ///
    /// Indices past `Z` continue as `AA`, `AB`, ... `AZ`, `BA`, matching the ids
    /// Grafana itself hands out when a panel gets more than 26 queries.
    pub fn from_index(mut index: usize) -> Self {
        let mut letters = Vec::with_capacity(2);
        loop {
            letters.push(b'A' + (index % ALPHABET_LEN) as u8);
            if index < ALPHABET_LEN {
                break;
            }
            index = index / ALPHABET_LEN - 1;
        }
        Self(letters.iter().rev().map(|&b| b as char).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RefId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl PartialEq<&str> for RefId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Hands out reference ids in strictly increasing order.
///
/// Every panel builder owns one, so ids restart at `A` per panel without any
/// shared counter. Call [`RefIdAllocator::reset`] to reuse an instance.
#[derive(Debug, Clone, Default)]
pub struct RefIdAllocator {
    counter: usize,
}

impl RefIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }

    /// Id for the current counter value; advances the counter.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> RefId {
        let id = RefId::from_index(self.counter);
        self.counter += 1;
        id
    }
}

impl Iterator for RefIdAllocator {
    type Item = RefId;

    fn next(&mut self) -> Option<RefId> {
        Some(RefIdAllocator::next(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_letters_in_order() {
        let mut refs = RefIdAllocator::new();
        let ids: Vec<String> = (0..5).map(|_| refs.next().to_string()).collect();
        assert_eq!(ids, ["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn reset_restarts_at_a() {
        let mut refs = RefIdAllocator::new();
        for _ in 0..17 {
            refs.next();
        }
        refs.reset();
        assert_eq!(refs.next(), "A");
        assert_eq!(refs.next(), "B");
    }

    #[test]
    fn full_alphabet_has_no_repeats() {
        let mut refs = RefIdAllocator::new();
        let ids: Vec<RefId> = (0..26).map(|_| refs.next()).collect();
        assert_eq!(ids.first().map(RefId::as_str), Some("A"));
        assert_eq!(ids.last().map(RefId::as_str), Some("Z"));
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), 26);
    }

    #[test]
    fn rolls_over_past_z() {
        assert_eq!(RefId::from_index(25), "Z");
        assert_eq!(RefId::from_index(26), "AA");
        assert_eq!(RefId::from_index(27), "AB");
        assert_eq!(RefId::from_index(51), "AZ");
        assert_eq!(RefId::from_index(52), "BA");
        assert_eq!(RefId::from_index(701), "ZZ");
        assert_eq!(RefId::from_index(702), "AAA");
    }

    #[test]
    fn separate_allocators_do_not_interfere() {
        let mut first = RefIdAllocator::new();
        let mut second = RefIdAllocator::new();
        first.next();
        first.next();
        assert_eq!(second.next(), "A");
        assert_eq!(first.next(), "C");
    }

    #[test]
    fn iterator_is_never_exhausted() {
        let ids: Vec<String> = RefIdAllocator::new()
            .take(28)
            .map(|id| id.to_string())
            .collect();
        assert_eq!(ids.len(), 28);
        assert_eq!(ids[26], "AA");
        assert_eq!(ids[27], "AB");
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&RefId::from_index(2)).unwrap();
        assert_eq!(json, "\"C\"");
    }
}
