//! Near-duplicate grouping.
//!
//! Similarity is the longest-matching-block ratio (Ratcliff/Obershelp, the
//! measure behind `difflib.SequenceMatcher.ratio`) over canonical keys,
//! computed on Unicode scalar values.

use std::collections::HashMap;

use crate::quote::Quote;

pub(crate) const DEFAULT_THRESHOLD: f64 = 0.85;

/// Second sequences at least this long ignore "popular" characters when
/// seeding matches.
const AUTOJUNK_MIN_LEN: usize = 200;

const PROGRESS_EVERY: usize = 100;

#[derive(Debug, Clone, serde::Serialize)]
pub(crate) struct SimilarQuote {
    pub(crate) quote: Quote,
    pub(crate) similarity: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub(crate) struct SimilarityGroup {
    pub(crate) main: Quote,
    pub(crate) similar: Vec<SimilarQuote>,
}

pub(crate) fn validate_threshold(threshold: f64) -> anyhow::Result<f64> {
    if threshold > 0.0 && threshold <= 1.0 {
        Ok(threshold)
    } else {
        anyhow::bail!("similarity threshold must be in (0, 1], got {threshold}")
    }
}

#[cfg(test)]
pub(crate) fn ratio(a: &str, b: &str) -> f64 {
    let a = Sequence::new(a);
    let b = Sequence::new(b);
    a.ratio(&b)
}

/// Greedy claim scan. Each unclaimed quote opens a group and claims every
/// later unclaimed quote that reaches `threshold`. Claimed quotes never start
/// or join another group, so the result depends on input order and is not
/// transitive.
pub(crate) fn find_similar_quotes(quotes: &[Quote], threshold: f64) -> Vec<SimilarityGroup> {
    debug_assert!(threshold > 0.0 && threshold <= 1.0);

    let sequences: Vec<Sequence> = quotes
        .iter()
        .map(|quote| Sequence::new(&quote.canonical_key()))
        .collect();
    let mut claimed = vec![false; quotes.len()];
    let mut groups = Vec::new();

    for i in 0..quotes.len() {
        if i % PROGRESS_EVERY == 0 {
            tracing::info!(
                progress = i,
                total = quotes.len(),
                num_groups = groups.len(),
                "Similarity scan progress"
            );
        }

        if claimed[i] {
            continue;
        }

        let mut similar = Vec::new();
        for j in (i + 1)..quotes.len() {
            if claimed[j] {
                continue;
            }

            if let Some(similarity) = sequences[i].ratio_at_least(&sequences[j], threshold) {
                similar.push(SimilarQuote {
                    quote: quotes[j].clone(),
                    similarity,
                });
                claimed[j] = true;
            }
        }

        if !similar.is_empty() {
            claimed[i] = true;
            groups.push(SimilarityGroup {
                main: quotes[i].clone(),
                similar,
            });
        }
    }

    tracing::debug!(
        num_quotes = quotes.len(),
        num_groups = groups.len(),
        threshold,
        "Scanned for similar quotes"
    );

    groups
}

/// A string prepared for matching, both as the first and as the second
/// sequence of a comparison.
struct Sequence {
    chars: Vec<char>,
    counts: HashMap<char, usize>,
    /// Positions of every non-popular character, ascending.
    b2j: HashMap<char, Vec<usize>>,
}

impl Sequence {
    fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();

        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in chars.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }
        let counts = b2j.iter().map(|(c, js)| (*c, js.len())).collect();

        if chars.len() >= AUTOJUNK_MIN_LEN {
            let limit = chars.len() / 100 + 1;
            b2j.retain(|_, js| js.len() <= limit);
        }

        Self { chars, counts, b2j }
    }

    fn ratio(&self, other: &Sequence) -> f64 {
        score(self.matching_characters(other), self.chars.len() + other.chars.len())
    }

    /// Returns the ratio only when it reaches `threshold`. The length and
    /// multiset bounds are never below the real ratio, so skipping on them
    /// does not change which pairs match.
    fn ratio_at_least(&self, other: &Sequence, threshold: f64) -> Option<f64> {
        let total = self.chars.len() + other.chars.len();

        let length_bound = score(self.chars.len().min(other.chars.len()), total);
        if length_bound < threshold {
            return None;
        }

        let shared: usize = self
            .counts
            .iter()
            .map(|(c, n)| (*n).min(other.counts.get(c).copied().unwrap_or(0)))
            .sum();
        if score(shared, total) < threshold {
            return None;
        }

        let ratio = self.ratio(other);
        (ratio >= threshold).then_some(ratio)
    }

    /// Total size of the matching blocks against `other`, found by taking the
    /// longest match and recursing on both sides of it.
    fn matching_characters(&self, other: &Sequence) -> usize {
        let mut matched = 0;
        let mut queue = vec![(0, self.chars.len(), 0, other.chars.len())];

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.longest_match(other, alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }

            matched += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }

        matched
    }

    /// Longest block `self[i..i+k] == other[j..j+k]` inside the given ranges.
    /// Ties go to the block starting earliest in `self`, then in `other`.
    fn longest_match(
        &self,
        other: &Sequence,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let a = &self.chars;
        let b = &other.chars;
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

        // Length of the match ending at a[i - 1] and b[j], keyed by j.
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
            let mut next_j2len = HashMap::new();
            if let Some(positions) = other.b2j.get(c) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = next_j2len;
        }

        // Popular characters never seed a match but may extend one.
        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }
}

fn score(matches: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        2.0 * matches as f64 / total as f64
    }
}
