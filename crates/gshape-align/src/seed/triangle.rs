//! Pharmacophore triangle matching
//!
//! Every triple of pharmacophore features forms a triangle. Reference
//! triangles are hashed by their sorted feature-kind triple and a binned
//! perimeter; each fit triangle looks up its own bin and the two adjacent
//! ones. A match whose sides agree within tolerance under a kind-consistent
//! vertex correspondence is superposed with weighted Kabsch (three vertices
//! plus the shape's center of mass) and becomes one seed pose.

use ahash::AHashMap;
use lin_alg::f64::Vec3;
use serde::{Deserialize, Serialize};

use gshape_algos::kabsch;
use gshape_volume::{FeatureKind, PharmacophoreGaussian, RigidTransform, ShapeVolume};

use crate::error::{AlignError, AlignResult};
use crate::seed::Seed;

/// Vertex correspondences tried between two triangles
const PERMUTATIONS: [[usize; 3]; 6] = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

/// Parameters for triangle matching
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangleParams {
    /// Width of a perimeter hash bin (Å)
    pub bin_size: f64,
    /// Largest allowed difference of any matched side (Å)
    pub side_tolerance: f64,
    /// Kabsch weight of the center-of-mass point relative to a vertex
    pub com_weight: f64,
}

impl Default for TriangleParams {
    fn default() -> Self {
        Self {
            bin_size: 1.0,
            side_tolerance: 1.0,
            com_weight: 0.5,
        }
    }
}

impl TriangleParams {
    pub fn validate(&self) -> AlignResult<()> {
        if !(self.bin_size.is_finite() && self.bin_size > 0.0) {
            return Err(AlignError::InvalidConfig(format!(
                "triangles.bin_size must be positive, got {}",
                self.bin_size
            )));
        }
        if !(self.side_tolerance.is_finite() && self.side_tolerance > 0.0) {
            return Err(AlignError::InvalidConfig(format!(
                "triangles.side_tolerance must be positive, got {}",
                self.side_tolerance
            )));
        }
        if !(self.com_weight.is_finite() && self.com_weight >= 0.0) {
            return Err(AlignError::InvalidConfig(format!(
                "triangles.com_weight must be non-negative, got {}",
                self.com_weight
            )));
        }
        Ok(())
    }
}

type TriangleKey = ([FeatureKind; 3], i64);

/// Three features of one shape, vertices ordered by kind
#[derive(Debug, Clone, Copy)]
struct Triangle {
    /// Indices into the shape's pharmacophore features
    vertices: [usize; 3],
    kinds: [FeatureKind; 3],
    /// `sides[k]` is the side opposite vertex `k`
    sides: [f64; 3],
}

impl Triangle {
    fn new(features: &[PharmacophoreGaussian], mut vertices: [usize; 3]) -> Self {
        vertices.sort_by_key(|&v| features[v].kind);
        let p = vertices.map(|v| features[v].center);
        Self {
            vertices,
            kinds: vertices.map(|v| features[v].kind),
            sides: [
                (p[1] - p[2]).magnitude(),
                (p[0] - p[2]).magnitude(),
                (p[0] - p[1]).magnitude(),
            ],
        }
    }

    fn perimeter(&self) -> f64 {
        self.sides.iter().sum()
    }

    fn bin(&self, bin_size: f64) -> i64 {
        (self.perimeter() / bin_size).floor() as i64
    }
}

fn triangles(features: &[PharmacophoreGaussian]) -> Vec<Triangle> {
    let n = features.len();
    let mut out = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                out.push(Triangle::new(features, [i, j, k]));
            }
        }
    }
    out
}

/// Triangle hash matcher
#[derive(Debug, Clone, Default)]
pub struct TriangleMatcher {
    params: TriangleParams,
}

impl TriangleMatcher {
    pub fn new(params: TriangleParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TriangleParams {
        &self.params
    }

    fn index(&self, features: &[PharmacophoreGaussian]) -> AHashMap<TriangleKey, Vec<Triangle>> {
        let mut table: AHashMap<TriangleKey, Vec<Triangle>> = AHashMap::new();
        for tri in triangles(features) {
            table
                .entry((tri.kinds, tri.bin(self.params.bin_size)))
                .or_default()
                .push(tri);
        }
        table
    }

    /// Seed poses moving `fit` onto `reference`, in fit-triangle order
    pub fn match_shapes(&self, reference: &ShapeVolume, fit: &ShapeVolume, use_directionality: bool) -> Vec<Seed> {
        let ref_features = reference.pp_gaussians();
        let fit_features = fit.pp_gaussians();
        if ref_features.len() < 3 || fit_features.len() < 3 {
            return Vec::new();
        }

        let table = self.index(ref_features);
        let ref_com = reference.center_of_mass();
        let fit_com = fit.center_of_mass();

        let mut seeds = Vec::new();
        for fit_tri in triangles(fit_features) {
            let bin = fit_tri.bin(self.params.bin_size);
            for b in (bin - 1)..=(bin + 1) {
                let Some(candidates) = table.get(&(fit_tri.kinds, b)) else {
                    continue;
                };
                for ref_tri in candidates {
                    for perm in PERMUTATIONS {
                        if let Some(seed) = self.superpose(
                            ref_tri,
                            &fit_tri,
                            perm,
                            (ref_features, ref_com),
                            (fit_features, fit_com),
                            use_directionality,
                        ) {
                            seeds.push(seed);
                        }
                    }
                }
            }
        }
        seeds
    }

    /// Seed for one vertex correspondence `ref vertex k <-> fit vertex perm[k]`
    fn superpose(
        &self,
        ref_tri: &Triangle,
        fit_tri: &Triangle,
        perm: [usize; 3],
        (ref_features, ref_com): (&[PharmacophoreGaussian], Vec3),
        (fit_features, fit_com): (&[PharmacophoreGaussian], Vec3),
        use_directionality: bool,
    ) -> Option<Seed> {
        if (0..3).any(|k| ref_tri.kinds[k] != fit_tri.kinds[perm[k]]) {
            return None;
        }
        let deltas = [0, 1, 2].map(|k| ref_tri.sides[k] - fit_tri.sides[perm[k]]);
        if deltas.iter().any(|d| d.abs() > self.params.side_tolerance) {
            return None;
        }

        let ref_vertices = ref_tri.vertices.map(|v| &ref_features[v]);
        let fit_vertices = perm.map(|k| &fit_features[fit_tri.vertices[k]]);

        let target = [ref_vertices[0].center, ref_vertices[1].center, ref_vertices[2].center, ref_com];
        let source = [fit_vertices[0].center, fit_vertices[1].center, fit_vertices[2].center, fit_com];
        let weights = [1.0, 1.0, 1.0, self.params.com_weight];
        let fit = match kabsch(&source, &target, Some(&weights[..])) {
            Ok(fit) => fit,
            Err(e) => {
                log::trace!("skipping triangle match: {e}");
                return None;
            }
        };
        let pose = RigidTransform::new(fit.rotation, fit.translation);

        let mut score = (-deltas.iter().map(|d| d * d).sum::<f64>()).exp();
        if use_directionality {
            let agreement: f64 = ref_vertices
                .iter()
                .zip(fit_vertices.iter())
                .map(|(r, f)| {
                    let mut moved = **f;
                    moved.transform(&pose);
                    r.direction_agreement(&moved)
                })
                .sum();
            score *= agreement / 3.0;
        }

        Some(Seed::new(pose.into(), score))
    }
}
