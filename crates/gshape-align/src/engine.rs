//! Candidate search and ranking
//!
//! The engine runs two seeding strategies over every (reference, fit)
//! conformer pair, refines a capped number of the best seeds of each, and
//! merges the refined poses into one ranked pool:
//!
//! 1. Reference exit-vector features are up-weighted (on copies).
//! 2. Triangle seeds of all pairs are pooled by match quality; the best
//!    `triangle_optimizations` are refined with the caller's flags.
//! 3. Canonical-axis seeds of all pairs are scored without optimization,
//!    pooled, and the best `pmi_optimizations` are refined.
//! 4. Both refined sets go into the result pool.
//!
//! A non-fatal collaborator failure in either phase marks its conformer
//! pair failed; a failed pair contributes no results at all.
//!
//! Pair seeding and candidate refinement are independent units and run on
//! the rayon pool when [`AlignConfig::parallel`] is set. Outcomes are
//! collected in input order, so parallel and sequential runs agree.

use rayon::prelude::*;

use gshape_volume::{ShapeEnsemble, ShapeMolecule, ShapeVolume, TransformSequence};

use crate::cancel::CancelToken;
use crate::config::{check_pp_weight, AlignConfig};
use crate::error::{AlignError, AlignResult};
use crate::frame::FrameGuard;
use crate::refine::{OverlapRefiner, PoseRefiner};
use crate::result::{AlignmentResult, RankedPool, Scored, SimilarityBreakdown};
use crate::seed::{PoseSeeder, Seed, StandardSeeder};

/// Flags for one search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Weight of the pharmacophore term in the combined similarity
    pub pp_weight: f64,
    /// Run local optimization on triangle seeds
    pub optimize: bool,
    /// Asymmetric (Tversky) scoring
    pub tversky: bool,
    /// Let feature directions influence triangle match quality
    pub use_directionality: bool,
}

impl SearchOptions {
    /// Optimizing, symmetric, direction-aware search
    pub fn new(pp_weight: f64) -> Self {
        Self {
            pp_weight,
            optimize: true,
            tversky: false,
            use_directionality: true,
        }
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn with_tversky(mut self, tversky: bool) -> Self {
        self.tversky = tversky;
        self
    }

    pub fn with_directionality(mut self, use_directionality: bool) -> Self {
        self.use_directionality = use_directionality;
        self
    }
}

/// Best match between two conformer ensembles
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleAlignment {
    /// All zero when the exit-vector counts of the two molecules differ
    pub breakdown: SimilarityBreakdown,
    pub ref_index: usize,
    pub fit_index: usize,
    /// Transform that was applied to the fit conformer
    pub transform: TransformSequence,
}

/// Seed tagged with the conformer pair it belongs to
#[derive(Debug, Clone)]
struct SeedCandidate {
    ref_index: usize,
    fit_index: usize,
    seed: Seed,
}

impl Scored for SeedCandidate {
    fn score(&self) -> f64 {
        self.seed.score
    }
}

/// Shape alignment search engine
pub struct AlignmentEngine<S = StandardSeeder, R = OverlapRefiner> {
    config: AlignConfig,
    seeder: S,
    refiner: R,
    cancel: CancelToken,
}

impl AlignmentEngine {
    /// Engine with the triangle/canonical-axis seeder and the Gaussian
    /// overlap refiner, both configured from `config`
    pub fn new(config: AlignConfig) -> AlignResult<Self> {
        let seeder = StandardSeeder::from_config(&config);
        let refiner = OverlapRefiner::new(config.refiner);
        Self::with_collaborators(config, seeder, refiner)
    }
}

impl<S: PoseSeeder, R: PoseRefiner> AlignmentEngine<S, R> {
    pub fn with_collaborators(config: AlignConfig, seeder: S, refiner: R) -> AlignResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            seeder,
            refiner,
            cancel: CancelToken::new(),
        })
    }

    /// Checked before every refinement call
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &AlignConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn seeder(&self) -> &S {
        &self.seeder
    }

    pub fn refiner(&self) -> &R {
        &self.refiner
    }

    fn map_units<T, U, F>(&self, items: &[T], f: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> U + Sync + Send,
    {
        if self.config.parallel {
            items.par_iter().map(f).collect()
        } else {
            items.iter().map(f).collect()
        }
    }

    /// Search every reference/fit conformer pair and return all refined
    /// candidates, best first.
    ///
    /// Fails with [`AlignError::EmptyReference`] / [`AlignError::EmptyFit`]
    /// on empty input and with [`AlignError::NoCandidateFound`] when no pair
    /// produced a refined candidate. A pair whose seeding fails is skipped.
    pub fn create_alignment_solutions(
        &self,
        references: &[ShapeVolume],
        fits: &[ShapeVolume],
        options: &SearchOptions,
    ) -> AlignResult<RankedPool<AlignmentResult>> {
        if references.is_empty() {
            return Err(AlignError::EmptyReference);
        }
        if fits.is_empty() {
            return Err(AlignError::EmptyFit);
        }
        check_pp_weight(options.pp_weight)?;
        self.cancel.check()?;

        let references: Vec<ShapeVolume> = references
            .iter()
            .map(|r| {
                let mut r = r.clone();
                r.set_exit_vector_weight(self.config.exit_vector_weight);
                r
            })
            .collect();
        let pairs: Vec<(usize, usize)> = (0..references.len())
            .flat_map(|i| (0..fits.len()).map(move |j| (i, j)))
            .collect();
        let mut failed = vec![false; pairs.len()];

        let triangle_seeds = self.map_units(&pairs, |&(i, j)| -> AlignResult<Vec<SeedCandidate>> {
            let seeds = self
                .seeder
                .triangle_match(&references[i], &fits[j], options.use_directionality)?;
            Ok(seeds
                .into_iter()
                .map(|seed| SeedCandidate {
                    ref_index: i,
                    fit_index: j,
                    seed,
                })
                .collect())
        });
        let triangle_pool = self.pool_seeds(triangle_seeds, &pairs, &mut failed, "triangle")?;
        let triangle_top = triangle_pool.top(self.config.triangle_optimizations);
        let triangle_results =
            self.refine_all(triangle_top, &references, fits, options, options.optimize, &mut failed)?;
        log::debug!(
            "triangle phase: {} seeds pooled, {} refined, {} results",
            triangle_pool.len(),
            triangle_top.len(),
            triangle_results.len()
        );

        let skip = failed.clone();
        let inertia_seeds = self.map_units(&pairs, |&(i, j)| -> AlignResult<Vec<SeedCandidate>> {
            if skip[i * fits.len() + j] {
                return Ok(Vec::new());
            }
            self.score_inertia_seeds(&references, fits, i, j, options)
        });
        let inertia_pool = self.pool_seeds(inertia_seeds, &pairs, &mut failed, "inertia")?;
        let inertia_top = inertia_pool.top(self.config.pmi_optimizations);
        let inertia_results = self.refine_all(inertia_top, &references, fits, options, true, &mut failed)?;
        log::debug!(
            "inertia phase: {} seeds pooled, {} refined, {} results",
            inertia_pool.len(),
            inertia_top.len(),
            inertia_results.len()
        );

        let mut pool = RankedPool::new(self.config.tie_policy);
        pool.extend(
            triangle_results
                .into_iter()
                .chain(inertia_results)
                .filter(|r| !failed[r.ref_index() * fits.len() + r.fit_index()]),
        );
        if pool.is_empty() {
            return Err(AlignError::NoCandidateFound {
                failed_pairs: failed.iter().filter(|&&f| f).count(),
                total_pairs: pairs.len(),
            });
        }
        log::debug!(
            "{} candidates over {} pairs, best {:.4}",
            pool.len(),
            pairs.len(),
            pool.best().map_or(0.0, |b| b.similarity())
        );
        Ok(pool)
    }

    /// Highest-scoring candidate of [`create_alignment_solutions`](Self::create_alignment_solutions)
    pub fn best(
        &self,
        references: &[ShapeVolume],
        fits: &[ShapeVolume],
        options: &SearchOptions,
    ) -> AlignResult<AlignmentResult> {
        let total_pairs = references.len() * fits.len();
        self.create_alignment_solutions(references, fits, options)?
            .into_descending_vec()
            .into_iter()
            .next()
            .ok_or(AlignError::NoCandidateFound {
                failed_pairs: 0,
                total_pairs,
            })
    }

    /// Canonical-axis seeds of one pair, each scored without optimization
    fn score_inertia_seeds(
        &self,
        references: &[ShapeVolume],
        fits: &[ShapeVolume],
        i: usize,
        j: usize,
        options: &SearchOptions,
    ) -> AlignResult<Vec<SeedCandidate>> {
        let poses = self.seeder.canonical_axis_seeds(&references[i], &fits[j])?;
        let mut out = Vec::with_capacity(poses.len());
        for transform in poses {
            self.cancel.check()?;
            let mut posed = fits[j].clone();
            posed.transform(&transform);
            let scored = self
                .refiner
                .refine(&references[i], &posed, options.pp_weight, false, options.tversky)?;
            out.push(SeedCandidate {
                ref_index: i,
                fit_index: j,
                seed: Seed::new(transform, scored.similarity),
            });
        }
        Ok(out)
    }

    /// Pool the seeds of every pair. Fatal errors abort; other per-pair
    /// failures are logged and the pair is marked failed.
    fn pool_seeds(
        &self,
        outcomes: Vec<AlignResult<Vec<SeedCandidate>>>,
        pairs: &[(usize, usize)],
        failed: &mut [bool],
        phase: &str,
    ) -> AlignResult<RankedPool<SeedCandidate>> {
        let mut pool = RankedPool::new(self.config.tie_policy);
        for (k, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(seeds) => pool.extend(seeds),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    let (i, j) = pairs[k];
                    log::warn!("{phase} seeding failed for conformer pair ({i}, {j}): {e}");
                    failed[k] = true;
                }
            }
        }
        Ok(pool)
    }

    /// Refine every candidate. Fatal errors abort; any other failure marks
    /// the candidate's pair failed in `failed` (indexed like the pair list).
    fn refine_all(
        &self,
        candidates: &[SeedCandidate],
        references: &[ShapeVolume],
        fits: &[ShapeVolume],
        options: &SearchOptions,
        optimize: bool,
        failed: &mut [bool],
    ) -> AlignResult<Vec<AlignmentResult>> {
        let outcomes = self.map_units(candidates, |c| self.refine_candidate(c, references, fits, options, optimize));
        let mut results = Vec::with_capacity(outcomes.len());
        for (candidate, outcome) in candidates.iter().zip(outcomes) {
            match outcome {
                Ok(result) => results.push(result),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    let (i, j) = (candidate.ref_index, candidate.fit_index);
                    log::warn!("refinement failed for conformer pair ({i}, {j}), dropping the pair: {e}");
                    failed[i * fits.len() + j] = true;
                }
            }
        }
        Ok(results)
    }

    /// Refine one seed; the result carries seed pose followed by correction
    fn refine_candidate(
        &self,
        candidate: &SeedCandidate,
        references: &[ShapeVolume],
        fits: &[ShapeVolume],
        options: &SearchOptions,
        optimize: bool,
    ) -> AlignResult<AlignmentResult> {
        self.cancel.check()?;
        let reference = &references[candidate.ref_index];
        let mut posed = fits[candidate.fit_index].clone();
        posed.transform(&candidate.seed.transform);

        let refined = self
            .refiner
            .refine(reference, &posed, options.pp_weight, optimize, options.tversky)?;
        let transform = candidate.seed.transform.clone().followed_by(&refined.correction);
        Ok(
            AlignmentResult::new(refined.similarity, transform, candidate.ref_index, candidate.fit_index)
                .with_contributions(refined.contributions),
        )
    }

    /// Align `fit` onto `reference` and move its coordinates into the
    /// reference's frame. Returns the best similarity. On failure the fit
    /// coordinates are left unchanged.
    pub fn align_two_mols_in_place(
        &self,
        reference: &ShapeMolecule,
        fit: &mut ShapeMolecule,
        pp_weight: f64,
    ) -> AlignResult<f64> {
        let mut ref_volume = ShapeVolume::from_molecule(reference)?;
        let ref_frame = ref_volume.canonical_frame()?;
        ref_volume.transform_rigid(&ref_frame.to_canonical());

        let mut fit_volume = ShapeVolume::from_molecule(fit)?;
        let fit_frame = fit_volume.canonical_frame()?;
        fit_volume.transform_rigid(&fit_frame.to_canonical());

        let guard = FrameGuard::enter(fit.conformer_mut(), fit_frame);
        let best = self.best(&[ref_volume], &[fit_volume], &SearchOptions::new(pp_weight))?;
        guard.commit(best.transform(), &ref_frame);
        log::info!("aligned {} onto {}: similarity {:.4}", fit.name, reference.name, best.similarity());
        Ok(best.similarity())
    }

    /// Search fit conformers against a fixed reference, e.g. a negative
    /// image of a binding site. Ring features of the fits are ignored and
    /// scoring is asymmetric. Returns up to `best_result_size` results,
    /// best first.
    pub fn align_to_negative_image(
        &self,
        reference: &ShapeVolume,
        fits: &[ShapeVolume],
        pp_weight: f64,
        optimize: bool,
    ) -> AlignResult<Vec<AlignmentResult>> {
        if fits.is_empty() {
            return Err(AlignError::EmptyFit);
        }
        let stripped: Vec<ShapeVolume> = fits
            .iter()
            .map(|f| {
                let mut f = f.clone();
                f.remove_ring_features();
                f
            })
            .collect();
        let options = SearchOptions::new(pp_weight)
            .with_optimize(optimize)
            .with_tversky(true)
            .with_directionality(false);
        let pool = self.create_alignment_solutions(std::slice::from_ref(reference), &stripped, &options)?;
        Ok(pool.top(self.config.best_result_size).to_vec())
    }

    /// Best match over the conformer cross product of two ensembles. The
    /// winning transform is applied to the matching fit conformer. The
    /// breakdown is forced to zero when the first conformers of the two
    /// ensembles carry different numbers of exit vectors.
    pub fn align(
        &self,
        reference: &ShapeEnsemble,
        fit: &mut ShapeEnsemble,
        pp_weight: f64,
        optimize: bool,
    ) -> AlignResult<EnsembleAlignment> {
        if reference.is_empty() {
            return Err(AlignError::EmptyReference);
        }
        if fit.is_empty() {
            return Err(AlignError::EmptyFit);
        }
        let options = SearchOptions::new(pp_weight).with_optimize(optimize);
        let best = self.best(reference.volumes(), fit.volumes(), &options)?;

        fit.conformer_at_mut(best.fit_index())?
            .conformer_mut()
            .apply_sequence(best.transform());

        let mut breakdown = *best.contributions();
        let n_ref = reference.exit_vector_count(0)?;
        let n_fit = fit.exit_vector_count(0)?;
        if n_ref != n_fit {
            log::debug!("exit vector counts differ ({n_ref} vs {n_fit}), vetoing match");
            breakdown = SimilarityBreakdown::zero();
        }

        Ok(EnsembleAlignment {
            breakdown,
            ref_index: best.ref_index(),
            fit_index: best.fit_index(),
            transform: best.transform().clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gshape_volume::{AtomGaussian, FeatureKind, PharmacophoreGaussian};
    use lin_alg::f64::Vec3;

    fn volume() -> ShapeVolume {
        let atoms = vec![
            AtomGaussian::from_radius(0, Vec3::new(-1.5, -0.4, 0.0), 1.7),
            AtomGaussian::from_radius(1, Vec3::new(0.0, 0.5, 0.1), 1.55),
            AtomGaussian::from_radius(2, Vec3::new(1.4, -0.2, -0.3), 1.52),
            AtomGaussian::from_radius(3, Vec3::new(2.6, 0.9, 0.2), 1.7),
        ];
        let features = vec![
            PharmacophoreGaussian::new(FeatureKind::Donor, Vec3::new(-1.5, -0.4, 0.0), None),
            PharmacophoreGaussian::new(FeatureKind::Acceptor, Vec3::new(1.4, -0.2, -0.3), None),
            PharmacophoreGaussian::new(FeatureKind::ExitVector, Vec3::new(2.6, 0.9, 0.2), None),
        ];
        ShapeVolume::new(atoms, features)
    }

    fn engine() -> AlignmentEngine {
        AlignmentEngine::new(AlignConfig::default().with_budgets(5, 3).with_parallel(false)).unwrap()
    }

    #[test]
    fn test_empty_inputs_fail_fast() {
        let v = volume();
        let opts = SearchOptions::new(0.5);
        assert!(matches!(
            engine().create_alignment_solutions(&[], &[v.clone()], &opts),
            Err(AlignError::EmptyReference)
        ));
        assert!(matches!(
            engine().create_alignment_solutions(&[v], &[], &opts),
            Err(AlignError::EmptyFit)
        ));
    }

    #[test]
    fn test_invalid_pp_weight() {
        let v = volume();
        let opts = SearchOptions::new(-0.1);
        assert!(matches!(
            engine().create_alignment_solutions(&[v.clone()], &[v], &opts),
            Err(AlignError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_reference_weights_not_mutated() {
        let reference = volume();
        let before = reference.clone();
        let pool = engine()
            .create_alignment_solutions(&[reference.clone()], &[volume()], &SearchOptions::new(0.5))
            .unwrap();
        assert!(!pool.is_empty());
        assert_eq!(reference, before);
    }

    #[test]
    fn test_results_carry_pair_indices() {
        let refs = [volume(), volume()];
        let fits = [volume()];
        let pool = engine()
            .create_alignment_solutions(&refs, &fits, &SearchOptions::new(0.5))
            .unwrap();
        assert!(pool.iter_descending().all(|r| r.ref_index() < 2 && r.fit_index() == 0));
        assert!(pool.len() <= 5 + 3);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cfg = AlignConfig::default().with_best_result_size(0);
        assert!(AlignmentEngine::new(cfg).is_err());
    }
}
