//! End-to-end alignment searches, with the default collaborators and with
//! instrumented mocks.

use std::sync::atomic::{AtomicUsize, Ordering};

use gshape_algos::linalg::mat3;
use gshape_align::{
    AlignConfig, AlignError, AlignResult, AlignmentEngine, CancelToken, PoseRefiner, PoseSeeder, Refinement,
    SearchOptions, Seed, SimilarityBreakdown,
};
use gshape_volume::{
    Element, FeatureKind, FeatureSite, RigidTransform, ShapeEnsemble, ShapeMolecule, ShapeVolume, TransformSequence,
};
use lin_alg::f64::Vec3;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Substituted phenyl ring with a donor, an acceptor and an optional exit
/// vector; deliberately asymmetric so its principal axes are well defined.
fn ligand(with_exit_vector: bool) -> ShapeMolecule {
    let mut mol = ShapeMolecule::new("ligand");
    let atoms = [
        (Element::Carbon, 0.00, 0.00, 0.00),
        (Element::Carbon, 1.39, 0.00, 0.00),
        (Element::Carbon, 2.09, 1.20, 0.00),
        (Element::Carbon, 1.39, 2.41, 0.00),
        (Element::Carbon, 0.00, 2.41, 0.00),
        (Element::Carbon, -0.70, 1.20, 0.00),
        (Element::Oxygen, 3.52, 1.25, 0.10),
        (Element::Nitrogen, -0.72, 3.62, 0.35),
        (Element::Carbon, -2.20, 1.15, -0.40),
        (Element::Chlorine, -3.10, 2.55, -1.10),
        (Element::Hydrogen, -1.70, 3.60, 0.50),
        (Element::Hydrogen, -0.50, -0.95, 0.00),
    ];
    for (element, x, y, z) in atoms {
        mol.add_atom(element, Vec3::new(x, y, z));
    }
    mol.add_feature(FeatureSite::new(FeatureKind::AromaticRing, vec![0, 1, 2, 3, 4, 5]))
        .unwrap();
    mol.add_feature(FeatureSite::new(FeatureKind::Acceptor, vec![6]).pointing_to(2))
        .unwrap();
    mol.add_feature(FeatureSite::new(FeatureKind::Donor, vec![7]).pointing_to(10))
        .unwrap();
    if with_exit_vector {
        mol.add_feature(FeatureSite::new(FeatureKind::ExitVector, vec![0]).pointing_to(11))
            .unwrap();
    }
    mol
}

fn moved(mol: &ShapeMolecule) -> ShapeMolecule {
    let mut out = mol.clone();
    out.conformer_mut().transform(&RigidTransform::new(
        mat3::from_axis_angle(Vec3::new(0.4, -0.2, 1.0), 1.9),
        Vec3::new(6.0, -3.5, 2.0),
    ));
    out
}

fn small_engine() -> AlignmentEngine {
    AlignmentEngine::new(AlignConfig::default().with_budgets(20, 8)).unwrap()
}

fn max_deviation(a: &ShapeMolecule, b: &ShapeMolecule) -> f64 {
    a.conformer()
        .positions()
        .iter()
        .zip(b.conformer().positions())
        .map(|(p, q)| (*p - *q).magnitude())
        .fold(0.0, f64::max)
}

// ---- mocks ----

/// Fixed numbers of identity seeds; triangle scores are distinct
struct MockSeeder {
    triangle: usize,
    inertia: usize,
}

impl PoseSeeder for MockSeeder {
    fn triangle_match(&self, _: &ShapeVolume, _: &ShapeVolume, _: bool) -> AlignResult<Vec<Seed>> {
        Ok((0..self.triangle)
            .map(|k| Seed::new(TransformSequence::new(), (k + 1) as f64 / (self.triangle + 1) as f64))
            .collect())
    }

    fn canonical_axis_seeds(&self, _: &ShapeVolume, _: &ShapeVolume) -> AlignResult<Vec<TransformSequence>> {
        Ok(vec![TransformSequence::new(); self.inertia])
    }
}

/// Identity corrections with a distinct similarity per call
#[derive(Default)]
struct CountingRefiner {
    calls: AtomicUsize,
    optimized: AtomicUsize,
    scored: AtomicUsize,
}

impl PoseRefiner for CountingRefiner {
    fn refine(&self, _: &ShapeVolume, _: &ShapeVolume, _: f64, optimize: bool, _: bool) -> AlignResult<Refinement> {
        let counter = if optimize { &self.optimized } else { &self.scored };
        counter.fetch_add(1, Ordering::SeqCst);
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let similarity = 1.0 / (1.0 + n as f64);
        Ok(Refinement {
            similarity,
            contributions: SimilarityBreakdown {
                overall: similarity,
                ..SimilarityBreakdown::zero()
            },
            correction: TransformSequence::new(),
        })
    }
}

struct FailingRefiner;

impl PoseRefiner for FailingRefiner {
    fn refine(&self, _: &ShapeVolume, _: &ShapeVolume, _: f64, _: bool, _: bool) -> AlignResult<Refinement> {
        Err(AlignError::Refinement("degenerate pose".into()))
    }
}

/// Scores like [`CountingRefiner`] but fails every optimization of a fit
/// that carries an exit vector
#[derive(Default)]
struct ExitVectorFailingRefiner {
    inner: CountingRefiner,
}

impl PoseRefiner for ExitVectorFailingRefiner {
    fn refine(
        &self,
        reference: &ShapeVolume,
        fit: &ShapeVolume,
        pp_weight: f64,
        optimize: bool,
        tversky: bool,
    ) -> AlignResult<Refinement> {
        if optimize && fit.exit_vector_count() > 0 {
            return Err(AlignError::Refinement("optimizer diverged".into()));
        }
        self.inner.refine(reference, fit, pp_weight, optimize, tversky)
    }
}

/// Trips the shared token on its first call
struct CancellingRefiner {
    token: CancelToken,
}

impl PoseRefiner for CancellingRefiner {
    fn refine(&self, _: &ShapeVolume, _: &ShapeVolume, _: f64, _: bool, _: bool) -> AlignResult<Refinement> {
        self.token.cancel();
        Ok(Refinement {
            similarity: 0.5,
            contributions: SimilarityBreakdown::zero(),
            correction: TransformSequence::new(),
        })
    }
}

fn volume_of(mol: &ShapeMolecule) -> ShapeVolume {
    ShapeVolume::from_molecule(mol).unwrap()
}

// ---- default collaborators ----

#[test]
fn test_self_alignment() {
    init_logging();
    let reference = ligand(false);
    let mut fit = reference.clone();
    let similarity = small_engine().align_two_mols_in_place(&reference, &mut fit, 0.5).unwrap();
    assert!(similarity >= 0.999, "self similarity {similarity}");
    assert!(max_deviation(&reference, &fit) < 0.05);
}

#[test]
fn test_moved_copy_returns_onto_reference() {
    init_logging();
    let reference = ligand(false);
    let mut fit = moved(&reference);
    assert!(max_deviation(&reference, &fit) > 1.0);

    let similarity = gshape_align::align_two_mols_in_place(&reference, &mut fit).unwrap();
    assert!(similarity >= 0.999);
    assert!(max_deviation(&reference, &fit) < 0.05);
}

#[test]
fn test_best_is_deterministic() {
    init_logging();
    let reference = volume_of(&ligand(false));
    let fit = volume_of(&moved(&ligand(false)));
    let engine = AlignmentEngine::new(AlignConfig::default().with_budgets(15, 6).with_parallel(true)).unwrap();
    let opts = SearchOptions::new(0.5);

    let a = engine.best(&[reference.clone()], &[fit.clone()], &opts).unwrap();
    let b = engine.best(&[reference], &[fit], &opts).unwrap();
    assert_eq!(a.similarity().to_bits(), b.similarity().to_bits());
    assert_eq!(a, b);
}

#[test]
fn test_parallel_matches_sequential() {
    let reference = volume_of(&ligand(false));
    let fit = volume_of(&moved(&ligand(false)));
    let opts = SearchOptions::new(0.5);
    let config = AlignConfig::default().with_budgets(10, 4);

    let par = AlignmentEngine::new(config.clone().with_parallel(true)).unwrap();
    let seq = AlignmentEngine::new(config.with_parallel(false)).unwrap();
    let a = par.create_alignment_solutions(&[reference.clone()], &[fit.clone()], &opts).unwrap();
    let b = seq.create_alignment_solutions(&[reference], &[fit], &opts).unwrap();
    assert_eq!(a.into_descending_vec(), b.into_descending_vec());
}

#[test]
fn test_exit_vector_veto() {
    init_logging();
    let reference = ShapeEnsemble::from_conformers(vec![ligand(true)]).unwrap();
    let mut fit = ShapeEnsemble::from_conformers(vec![ligand(false)]).unwrap();
    let result = small_engine().align(&reference, &mut fit, 0.5, true).unwrap();
    assert!(result.breakdown.is_vetoed());
    assert_eq!(result.breakdown.as_array(), [0.0; 4]);

    let mut matching = ShapeEnsemble::from_conformers(vec![ligand(true)]).unwrap();
    let result = small_engine().align(&reference, &mut matching, 0.5, true).unwrap();
    assert!(!result.breakdown.is_vetoed());
    assert!(result.breakdown.overall >= 0.999, "{:?}", result.breakdown);
}

#[test]
fn test_exit_vector_self_alignment() {
    init_logging();
    let reference = ligand(true);
    let mut fit = reference.clone();
    let similarity = small_engine().align_two_mols_in_place(&reference, &mut fit, 0.5).unwrap();
    assert!(similarity >= 0.999, "self similarity {similarity}");
    assert!(max_deviation(&reference, &fit) < 0.05);

    let mut fit = moved(&reference);
    let similarity = gshape_align::align_two_mols_in_place(&reference, &mut fit).unwrap();
    assert!(similarity >= 0.999, "moved similarity {similarity}");
    assert!(max_deviation(&reference, &fit) < 0.05);

    let ensemble = ShapeEnsemble::from_conformers(vec![reference.clone()]).unwrap();
    let mut twin = ensemble.clone();
    let result = small_engine().align(&ensemble, &mut twin, 0.5, true).unwrap();
    let b = result.breakdown;
    assert!(b.overall >= 0.999, "{b:?}");
    assert!(b.pharmacophore >= 0.999, "{b:?}");
    assert!(b.shape >= 0.999, "{b:?}");
}

#[test]
fn test_align_moves_selected_conformer() {
    let reference = ShapeEnsemble::from_conformers(vec![ligand(false)]).unwrap();
    let mut fit = ShapeEnsemble::from_conformers(vec![ligand(false), moved(&ligand(false))]).unwrap();
    let before: Vec<Vec<Vec3>> = (0..2)
        .map(|i| fit.conformer_at(i).unwrap().conformer().positions().to_vec())
        .collect();

    let result = small_engine().align(&reference, &mut fit, 0.5, true).unwrap();
    assert!(result.fit_index < 2);
    assert_eq!(result.ref_index, 0);

    let other = 1 - result.fit_index;
    assert_eq!(fit.conformer_at(other).unwrap().conformer().positions(), &before[other][..]);
    let mut expected = gshape_volume::Conformer::new(before[result.fit_index].clone());
    expected.apply_sequence(&result.transform);
    assert_eq!(fit.conformer_at(result.fit_index).unwrap().conformer(), &expected);
}

#[test]
fn test_negative_image_ignores_fit_rings() {
    init_logging();
    let engine = AlignmentEngine::new(AlignConfig::default().with_budgets(12, 5).with_parallel(false)).unwrap();
    let reference = volume_of(&ligand(false));
    let fits = vec![volume_of(&moved(&ligand(false))), volume_of(&ligand(false))];

    let results = engine.align_to_negative_image(&reference, &fits, 0.5, true).unwrap();

    let stripped: Vec<ShapeVolume> = fits
        .iter()
        .map(|f| {
            let mut f = f.clone();
            f.remove_ring_features();
            f
        })
        .collect();
    assert!(stripped.iter().all(|f| f.pp_gaussians().iter().all(|g| !g.kind.is_ring())));
    let baseline = engine
        .create_alignment_solutions(
            &[reference.clone()],
            &stripped,
            &SearchOptions::new(0.5).with_tversky(true).with_directionality(false),
        )
        .unwrap();
    assert_eq!(results, baseline.top(20).to_vec());

    // Input volumes keep their ring features
    assert!(fits[0].pp_gaussians().iter().any(|g| g.kind.is_ring()));
}

// ---- instrumented collaborators ----

#[test]
fn test_refinement_budgets() {
    let refiner = CountingRefiner::default();
    let engine = AlignmentEngine::with_collaborators(
        AlignConfig::default(),
        MockSeeder {
            triangle: 150,
            inertia: 30,
        },
        refiner,
    )
    .unwrap();
    let v = volume_of(&ligand(false));

    let pool = engine
        .create_alignment_solutions(&[v.clone()], &[v.clone()], &SearchOptions::new(0.5))
        .unwrap();
    assert_eq!(pool.len(), 120);
    assert_eq!(engine_refiner_counts(&engine), (120, 30));
}

#[test]
fn test_inertia_refinement_always_optimizes() {
    let engine = AlignmentEngine::with_collaborators(
        AlignConfig::default(),
        MockSeeder {
            triangle: 150,
            inertia: 30,
        },
        CountingRefiner::default(),
    )
    .unwrap();
    let v = volume_of(&ligand(false));
    engine
        .create_alignment_solutions(&[v.clone()], &[v], &SearchOptions::new(0.5).with_optimize(false))
        .unwrap();
    // 100 triangle refinements without optimization plus 30 seed scorings;
    // the 20 inertia refinements still optimize
    assert_eq!(engine_refiner_counts(&engine), (20, 130));
}

fn engine_refiner_counts(engine: &AlignmentEngine<MockSeeder, CountingRefiner>) -> (usize, usize) {
    let refiner = engine.refiner();
    (
        refiner.optimized.load(Ordering::SeqCst),
        refiner.scored.load(Ordering::SeqCst),
    )
}

#[test]
fn test_budgets_span_all_pairs() {
    let engine = AlignmentEngine::with_collaborators(
        AlignConfig::default(),
        MockSeeder {
            triangle: 40,
            inertia: 10,
        },
        CountingRefiner::default(),
    )
    .unwrap();
    let v = volume_of(&ligand(false));
    let refs = vec![v.clone(), v.clone()];
    let fits = vec![v.clone(), v.clone(), v];
    let pool = engine
        .create_alignment_solutions(&refs, &fits, &SearchOptions::new(0.5))
        .unwrap();
    // 6 pairs: 240 triangle seeds collapse to 40 distinct scores; 60
    // inertia seeds all score differently
    assert_eq!(engine_refiner_counts(&engine), (40 + 20, 60));
    assert_eq!(pool.len(), 60);
}

#[test]
fn test_top_n_strictly_descending() {
    let engine = AlignmentEngine::with_collaborators(
        AlignConfig::default(),
        MockSeeder {
            triangle: 30,
            inertia: 10,
        },
        CountingRefiner::default(),
    )
    .unwrap();
    let v = volume_of(&ligand(false));
    let results = engine.align_to_negative_image(&v, &[v.clone()], 0.5, true).unwrap();
    assert_eq!(results.len(), 20);
    for pair in results.windows(2) {
        assert!(pair[0].similarity() > pair[1].similarity());
    }

    let few = AlignmentEngine::with_collaborators(
        AlignConfig::default(),
        MockSeeder { triangle: 3, inertia: 2 },
        CountingRefiner::default(),
    )
    .unwrap();
    assert_eq!(few.align_to_negative_image(&v, &[v.clone()], 0.5, true).unwrap().len(), 5);
}

#[test]
fn test_identity_alignment_round_trips_frame() {
    let engine = AlignmentEngine::with_collaborators(
        AlignConfig::default(),
        MockSeeder { triangle: 0, inertia: 1 },
        CountingRefiner::default(),
    )
    .unwrap();
    let reference = moved(&ligand(false));
    let mut fit = reference.clone();
    engine.align_two_mols_in_place(&reference, &mut fit, 0.5).unwrap();
    assert!(max_deviation(&reference, &fit) < 1e-9);
}

#[test]
fn test_failure_restores_coordinates() {
    init_logging();
    let engine =
        AlignmentEngine::with_collaborators(AlignConfig::default(), MockSeeder { triangle: 5, inertia: 5 }, FailingRefiner)
            .unwrap();
    let reference = ligand(false);
    let original = moved(&ligand(false));
    let mut fit = original.clone();

    let err = engine.align_two_mols_in_place(&reference, &mut fit, 0.5).unwrap_err();
    assert!(matches!(
        err,
        AlignError::NoCandidateFound {
            failed_pairs: 1,
            total_pairs: 1
        }
    ));
    assert!(max_deviation(&original, &fit) < 1e-9);
}

#[test]
fn test_refinement_failure_drops_pair() {
    init_logging();
    let v = volume_of(&ligand(true));
    let engine = AlignmentEngine::with_collaborators(
        AlignConfig::default(),
        MockSeeder { triangle: 5, inertia: 5 },
        ExitVectorFailingRefiner::default(),
    )
    .unwrap();
    let err = engine.best(&[v.clone()], &[v.clone()], &SearchOptions::new(0.5)).unwrap_err();
    assert!(
        matches!(
            err,
            AlignError::NoCandidateFound {
                failed_pairs: 1,
                total_pairs: 1
            }
        ),
        "{err:?}"
    );

    // Only the pair whose fit carries an exit vector fails; none of its
    // candidates survive, while the other pair still contributes
    let plain = volume_of(&ligand(false));
    let engine = AlignmentEngine::with_collaborators(
        AlignConfig::default(),
        MockSeeder { triangle: 5, inertia: 5 },
        ExitVectorFailingRefiner::default(),
    )
    .unwrap();
    let pool = engine
        .create_alignment_solutions(&[v.clone()], &[plain, v], &SearchOptions::new(0.5))
        .unwrap();
    assert!(!pool.is_empty());
    assert!(pool.iter_descending().all(|r| r.fit_index() == 0));
}

#[test]
fn test_cancellation() {
    let v = volume_of(&ligand(false));
    let token = CancelToken::new();
    token.cancel();
    let engine = small_engine().with_cancel_token(token);
    assert!(matches!(
        engine.create_alignment_solutions(&[v.clone()], &[v.clone()], &SearchOptions::new(0.5)),
        Err(AlignError::Cancelled)
    ));

    let token = CancelToken::new();
    let engine = AlignmentEngine::with_collaborators(
        AlignConfig::default(),
        MockSeeder { triangle: 10, inertia: 10 },
        CancellingRefiner { token: token.clone() },
    )
    .unwrap()
    .with_cancel_token(token);
    assert!(matches!(
        engine.best(&[v.clone()], &[v], &SearchOptions::new(0.5)),
        Err(AlignError::Cancelled)
    ));
}

#[test]
fn test_empty_inputs() {
    let engine = small_engine();
    let v = volume_of(&ligand(false));
    assert!(matches!(
        engine.align_to_negative_image(&v, &[], 0.5, true),
        Err(AlignError::EmptyFit)
    ));
    let full = ShapeEnsemble::from_conformers(vec![ligand(false)]).unwrap();
    let mut empty = ShapeEnsemble::default();
    assert!(matches!(
        engine.align(&ShapeEnsemble::default(), &mut empty, 0.5, true),
        Err(AlignError::EmptyReference)
    ));
    assert!(matches!(
        engine.align(&full, &mut empty, 0.5, true),
        Err(AlignError::EmptyFit)
    ));
}
