// Orden determinista y recorte a top-K.
use std::cmp::Ordering;

use crate::models::{Combination, ScoreVector};

/// Position of a combination in the sequential enumeration: the first-course
/// choice it descends from, then its index within that subtree. Compares the
/// same way as the global generation index, whichever worker produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GenerationOrder {
    pub root: usize,
    pub index: u64,
}

#[derive(Debug, Clone)]
pub struct ScoredCombination<'a> {
    pub order: GenerationOrder,
    pub combination: Combination<'a>,
    pub score: ScoreVector,
}

/// Lower aggregate first, then fewer days on campus, then generation order.
pub fn rank_cmp(a: &ScoredCombination<'_>, b: &ScoredCombination<'_>) -> Ordering {
    a.score
        .aggregate
        .total_cmp(&b.score.aggregate)
        .then(a.score.days_on_campus.cmp(&b.score.days_on_campus))
        .then(a.order.cmp(&b.order))
}

/// Streaming top-K. Memory stays within `2 * top_k` entries.
#[derive(Debug)]
pub struct Ranker<'a> {
    top_k: usize,
    buf: Vec<ScoredCombination<'a>>,
}

impl<'a> Ranker<'a> {
    pub fn new(top_k: usize) -> Self {
        Self { top_k, buf: Vec::with_capacity(top_k.saturating_mul(2).min(4096)) }
    }

    pub fn push(&mut self, entry: ScoredCombination<'a>) {
        if self.top_k == 0 {
            return;
        }
        self.buf.push(entry);
        if self.buf.len() >= self.top_k.saturating_mul(2) {
            self.compact();
        }
    }

    /// Fold another ranker's entries into this one.
    pub fn merge(&mut self, other: Ranker<'a>) {
        for entry in other.buf {
            self.push(entry);
        }
    }

    fn compact(&mut self) {
        self.buf.sort_by(rank_cmp);
        self.buf.truncate(self.top_k);
    }

    /// Best first, at most `top_k` entries.
    pub fn finish(mut self) -> Vec<ScoredCombination<'a>> {
        self.compact();
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(root: usize, index: u64, aggregate: f64, days: u32) -> ScoredCombination<'static> {
        ScoredCombination {
            order: GenerationOrder { root, index },
            combination: Combination::default(),
            score: ScoreVector { aggregate, days_on_campus: days, ..Default::default() },
        }
    }

    fn orders(v: &[ScoredCombination<'_>]) -> Vec<(usize, u64)> {
        v.iter().map(|e| (e.order.root, e.order.index)).collect()
    }

    #[test]
    fn ties_break_on_days_then_generation() {
        let mut r = Ranker::new(10);
        r.push(entry(0, 0, 3.0, 4));
        r.push(entry(0, 1, 3.0, 2));
        r.push(entry(1, 0, 1.0, 5));
        r.push(entry(0, 2, 3.0, 2));
        assert_eq!(orders(&r.finish()), vec![(1, 0), (0, 1), (0, 2), (0, 0)]);
    }

    #[test]
    fn keeps_only_top_k_while_streaming() {
        let mut r = Ranker::new(2);
        for i in 0..50u64 {
            r.push(entry(0, i, (50 - i) as f64, 1));
            assert!(r.buf.len() < 4);
        }
        assert_eq!(orders(&r.finish()), vec![(0, 49), (0, 48)]);
    }

    #[test]
    fn merge_matches_sequential() {
        let all: Vec<_> = (0..20u64).map(|i| entry((i / 5) as usize, i % 5, (i % 3) as f64, 1)).collect();
        let mut seq = Ranker::new(5);
        for e in all.iter().cloned() {
            seq.push(e);
        }
        let (mut a, mut b) = (Ranker::new(5), Ranker::new(5));
        for e in all.iter().cloned() {
            if e.order.root % 2 == 0 { a.push(e) } else { b.push(e) }
        }
        b.merge(a);
        assert_eq!(orders(&seq.finish()), orders(&b.finish()));
    }
}
