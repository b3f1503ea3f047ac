//! Alignment results and ranked pools
//!
//! An [`AlignmentResult`] is one candidate pose with its final similarity.
//! A [`RankedPool`] keeps results ordered by score alone. With
//! [`TiePolicy::CollapseEqual`] two results with numerically identical
//! scores are the same key and the later one is dropped, like a sorted set;
//! [`TiePolicy::KeepAll`] keeps both, earlier insertion first.

use serde::{Deserialize, Serialize};

use gshape_volume::TransformSequence;

/// Similarity split into its components
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimilarityBreakdown {
    /// Combined score reported as the similarity
    pub overall: f64,
    /// Pharmacophore feature term
    pub pharmacophore: f64,
    /// Atom Gaussian shape term
    pub shape: f64,
    /// Fraction of the reference shape volume covered by the fit
    pub coverage: f64,
}

impl SimilarityBreakdown {
    pub const fn zero() -> Self {
        Self {
            overall: 0.0,
            pharmacophore: 0.0,
            shape: 0.0,
            coverage: 0.0,
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.overall, self.pharmacophore, self.shape, self.coverage]
    }

    /// All components are zero: the alignment was rejected outright
    /// (e.g. incompatible exit vectors), not merely poor.
    pub fn is_vetoed(&self) -> bool {
        self.as_array().iter().all(|&c| c == 0.0)
    }
}

/// One candidate alignment of a fit conformer onto a reference conformer
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentResult {
    similarity: f64,
    transform: TransformSequence,
    ref_index: usize,
    fit_index: usize,
    contributions: SimilarityBreakdown,
}

impl AlignmentResult {
    pub fn new(similarity: f64, transform: TransformSequence, ref_index: usize, fit_index: usize) -> Self {
        Self {
            similarity,
            transform,
            ref_index,
            fit_index,
            contributions: SimilarityBreakdown::zero(),
        }
    }

    /// Attach the similarity breakdown
    pub fn with_contributions(mut self, contributions: SimilarityBreakdown) -> Self {
        self.contributions = contributions;
        self
    }

    pub fn similarity(&self) -> f64 {
        self.similarity
    }

    /// Full transform taking the fit's pre-processed frame onto the reference
    pub fn transform(&self) -> &TransformSequence {
        &self.transform
    }

    pub fn ref_index(&self) -> usize {
        self.ref_index
    }

    pub fn fit_index(&self) -> usize {
        self.fit_index
    }

    pub fn contributions(&self) -> &SimilarityBreakdown {
        &self.contributions
    }
}

/// Anything a [`RankedPool`] can order
pub trait Scored {
    fn score(&self) -> f64;
}

impl Scored for AlignmentResult {
    fn score(&self) -> f64 {
        self.similarity
    }
}

/// Handling of candidates whose scores compare equal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiePolicy {
    /// Keep the first candidate with a given score, drop later ones
    #[default]
    CollapseEqual,
    /// Keep every candidate; ties ordered by insertion
    KeepAll,
}

/// Results ordered by descending score
#[derive(Debug, Clone)]
pub struct RankedPool<T> {
    entries: Vec<T>,
    policy: TiePolicy,
}

impl<T> Default for RankedPool<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            policy: TiePolicy::default(),
        }
    }
}

impl<T: Scored> RankedPool<T> {
    pub fn new(policy: TiePolicy) -> Self {
        Self {
            entries: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> TiePolicy {
        self.policy
    }

    /// Insert a candidate. Returns `false` if it was rejected (non-finite
    /// score, or an equal score under [`TiePolicy::CollapseEqual`]).
    pub fn insert(&mut self, item: T) -> bool {
        let score = item.score();
        if !score.is_finite() {
            log::warn!("dropping candidate with non-finite score {score}");
            return false;
        }
        // First index whose score is strictly lower than the new one
        let pos = self.entries.partition_point(|e| e.score() >= score);
        if self.policy == TiePolicy::CollapseEqual && pos > 0 && self.entries[pos - 1].score() == score {
            return false;
        }
        self.entries.insert(pos, item);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest-scoring entry
    pub fn best(&self) -> Option<&T> {
        self.entries.first()
    }

    /// Lowest-scoring entry
    pub fn worst(&self) -> Option<&T> {
        self.entries.last()
    }

    /// Entries from best to worst
    pub fn iter_descending(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries.iter()
    }

    /// Entries from worst to best
    pub fn iter_ascending(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries.iter().rev()
    }

    /// The `n` best entries, best first
    pub fn top(&self, n: usize) -> &[T] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn into_descending_vec(self) -> Vec<T> {
        self.entries
    }

    /// Keep at most the `n` best entries
    pub fn truncate(&mut self, n: usize) {
        self.entries.truncate(n);
    }
}

impl<T: Scored> Extend<T> for RankedPool<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}
