//! Search configuration
//!
//! Budgets and weights are explicit values handed to
//! [`AlignmentEngine::new`](crate::AlignmentEngine::new), so engines with
//! different budgets can run side by side. `Default` gives the classic
//! settings (100 triangle refinements, 20 inertia refinements, exit-vector
//! weight 10, top 20 results).

use serde::{Deserialize, Serialize};

use crate::error::{AlignError, AlignResult};
use crate::refine::RefinerParams;
use crate::result::TiePolicy;
use crate::seed::{InertiaSeedSet, TriangleParams};

/// Configuration of an [`AlignmentEngine`](crate::AlignmentEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    /// Maximum number of triangle seeds passed to refinement
    pub triangle_optimizations: usize,
    /// Maximum number of inertia seeds passed to refinement
    pub pmi_optimizations: usize,
    /// Weight forced onto every reference exit-vector feature
    pub exit_vector_weight: f64,
    /// Number of results returned by top-N queries
    pub best_result_size: usize,
    /// Default pharmacophore weight for the convenience entry points
    pub pp_weight: f64,
    /// Canonical rotations tried per conformer pair
    pub inertia_seeds: InertiaSeedSet,
    /// Repeat inertia seeds translated onto sampled reference atoms
    pub diversify_inertia_seeds: bool,
    /// How candidates with identical scores are treated by ranked pools
    pub tie_policy: TiePolicy,
    /// Dispatch pair and candidate work on the rayon pool
    pub parallel: bool,
    pub triangles: TriangleParams,
    pub refiner: RefinerParams,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            triangle_optimizations: 100,
            pmi_optimizations: 20,
            exit_vector_weight: 10.0,
            best_result_size: 20,
            pp_weight: 0.5,
            inertia_seeds: InertiaSeedSet::AxisPermutations,
            diversify_inertia_seeds: false,
            tie_policy: TiePolicy::CollapseEqual,
            parallel: true,
            triangles: TriangleParams::default(),
            refiner: RefinerParams::default(),
        }
    }
}

impl AlignConfig {
    pub fn with_budgets(mut self, triangle_optimizations: usize, pmi_optimizations: usize) -> Self {
        self.triangle_optimizations = triangle_optimizations;
        self.pmi_optimizations = pmi_optimizations;
        self
    }

    pub fn with_best_result_size(mut self, n: usize) -> Self {
        self.best_result_size = n;
        self
    }

    pub fn with_tie_policy(mut self, policy: TiePolicy) -> Self {
        self.tie_policy = policy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_pp_weight(mut self, pp_weight: f64) -> Self {
        self.pp_weight = pp_weight;
        self
    }

    /// Check ranges; called by the engine constructor
    pub fn validate(&self) -> AlignResult<()> {
        check_pp_weight(self.pp_weight)?;
        if !(self.exit_vector_weight.is_finite() && self.exit_vector_weight > 0.0) {
            return Err(AlignError::InvalidConfig(format!(
                "exit_vector_weight must be positive, got {}",
                self.exit_vector_weight
            )));
        }
        if self.best_result_size == 0 {
            return Err(AlignError::InvalidConfig("best_result_size must be at least 1".into()));
        }
        self.triangles.validate()?;
        self.refiner.validate()?;
        Ok(())
    }
}

pub(crate) fn check_pp_weight(pp_weight: f64) -> AlignResult<()> {
    if (0.0..=1.0).contains(&pp_weight) {
        Ok(())
    } else {
        Err(AlignError::InvalidConfig(format!(
            "pp_weight must be within [0, 1], got {pp_weight}"
        )))
    }
}
