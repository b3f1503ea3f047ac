//! Gaussian shape volume of one conformer
//!
//! A [`ShapeVolume`] holds the atom Gaussians (steric shape) and the
//! pharmacophore Gaussians of a conformer. Alignment works on copies that
//! are moved rigidly; [`ShapeVolume::pre_process`] puts a volume and its
//! coordinates into a canonical frame (center of mass at the origin,
//! principal axes along x, y, z) so canonical-axis seeds are meaningful.

use lin_alg::f64::Vec3;

use gshape_algos::linalg::mat3::{self, Mat3};
use gshape_algos::linalg::symmetric_eigen;

use crate::error::{VolumeError, VolumeResult};
use crate::gaussian::{AtomGaussian, FeatureKind, PharmacophoreGaussian};
use crate::molecule::{Conformer, ShapeMolecule};
use crate::transform::{RigidTransform, TransformSequence};

/// Canonical frame of a volume: where its center of mass was and how it
/// was rotated onto its principal axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanonicalFrame {
    /// Center of mass in the original frame
    pub center: Vec3,
    /// Rows are the principal axes (largest spread first)
    pub rotation: Mat3,
}

impl CanonicalFrame {
    /// Original → canonical: `x' = R · (x - c)`
    pub fn to_canonical(&self) -> RigidTransform {
        RigidTransform::new(self.rotation, -mat3::mul_vec(&self.rotation, self.center))
    }

    /// Canonical → original: `x = Rᵀ · x' + c`
    pub fn from_canonical(&self) -> RigidTransform {
        RigidTransform::new(mat3::transpose(&self.rotation), self.center)
    }
}

/// Atom and pharmacophore Gaussians of one conformer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeVolume {
    atoms: Vec<AtomGaussian>,
    features: Vec<PharmacophoreGaussian>,
}

impl ShapeVolume {
    pub fn new(atoms: Vec<AtomGaussian>, features: Vec<PharmacophoreGaussian>) -> Self {
        Self { atoms, features }
    }

    /// Build the volume of a molecule's current conformer. Hydrogens do
    /// not contribute atom Gaussians.
    pub fn from_molecule(mol: &ShapeMolecule) -> VolumeResult<Self> {
        let conformer = mol.conformer();
        if conformer.len() != mol.atom_count() {
            return Err(VolumeError::CoordinateMismatch {
                expected: mol.atom_count(),
                actual: conformer.len(),
            });
        }

        let atoms = mol
            .elements()
            .iter()
            .zip(conformer.positions())
            .enumerate()
            .filter(|(_, (element, _))| !element.is_hydrogen())
            .map(|(i, (element, pos))| AtomGaussian::from_radius(i, *pos, element.vdw_radius()))
            .collect();

        let mut features = Vec::with_capacity(mol.features().len());
        for site in mol.features() {
            let center = site.center(conformer)?;
            let direction = site.direction(conformer)?;
            features.push(PharmacophoreGaussian::new(site.kind, center, direction));
        }

        Ok(Self { atoms, features })
    }

    pub fn atom_gaussians(&self) -> &[AtomGaussian] {
        &self.atoms
    }

    pub fn pp_gaussians(&self) -> &[PharmacophoreGaussian] {
        &self.features
    }

    pub fn pp_gaussians_mut(&mut self) -> &mut [PharmacophoreGaussian] {
        &mut self.features
    }

    pub fn exit_vector_gaussians(&self) -> impl Iterator<Item = &PharmacophoreGaussian> + '_ {
        self.features.iter().filter(|f| f.kind == FeatureKind::ExitVector)
    }

    pub fn exit_vector_count(&self) -> usize {
        self.exit_vector_gaussians().count()
    }

    /// Force the weight of every exit-vector feature
    pub fn set_exit_vector_weight(&mut self, weight: f64) {
        for f in self.features.iter_mut().filter(|f| f.kind == FeatureKind::ExitVector) {
            f.weight = weight;
        }
    }

    /// Drop ring-derived pharmacophore features
    pub fn remove_ring_features(&mut self) {
        let before = self.features.len();
        self.features.retain(|f| !f.kind.is_ring());
        log::trace!("removed {} ring features", before - self.features.len());
    }

    /// Volume-weighted center of the atom Gaussians
    pub fn center_of_mass(&self) -> Vec3 {
        let mut sum = Vec3::new_zero();
        let mut total = 0.0;
        for g in &self.atoms {
            let m = g.weight * g.volume();
            sum = sum + g.center * m;
            total += m;
        }
        if total <= 0.0 {
            return Vec3::new_zero();
        }
        sum * (1.0 / total)
    }

    /// Move every Gaussian by a rigid transform
    pub fn transform_rigid(&mut self, t: &RigidTransform) {
        for g in self.atoms.iter_mut() {
            g.transform(t);
        }
        for f in self.features.iter_mut() {
            f.transform(t);
        }
    }

    /// Move every Gaussian by a transform sequence
    pub fn transform(&mut self, seq: &TransformSequence) {
        self.transform_rigid(&seq.collapse());
    }

    /// Principal-axes frame of the atom Gaussians.
    ///
    /// Axes are ordered by decreasing spread. Each of the first two axes is
    /// oriented so the third moment along it is non-negative; the third is
    /// their cross product.
    pub fn canonical_frame(&self) -> VolumeResult<CanonicalFrame> {
        if self.atoms.is_empty() {
            return Err(VolumeError::EmptyVolume);
        }
        let com = self.center_of_mass();

        let mut cov = [[0.0f64; 3]; 3];
        for g in &self.atoms {
            let m = g.weight * g.volume();
            let r = g.center - com;
            let ra = [r.x, r.y, r.z];
            for i in 0..3 {
                for j in 0..3 {
                    cov[i][j] += m * ra[i] * ra[j];
                }
            }
        }
        let eig = symmetric_eigen(&cov);

        let mut axes = [
            mat3::column(&eig.vectors, 0),
            mat3::column(&eig.vectors, 1),
        ];
        for axis in axes.iter_mut() {
            let skew: f64 = self
                .atoms
                .iter()
                .map(|g| {
                    let s = (g.center - com).dot(*axis);
                    g.weight * g.volume() * s * s * s
                })
                .sum();
            if skew < 0.0 {
                *axis = -*axis;
            }
        }
        let third = axes[0].cross(axes[1]);

        Ok(CanonicalFrame {
            center: com,
            rotation: mat3::from_rows(axes[0], axes[1], third),
        })
    }

    /// Canonicalize this volume and the matching coordinates in place.
    /// Returns the frame so the move can be undone.
    pub fn pre_process(&mut self, conformer: &mut Conformer) -> VolumeResult<CanonicalFrame> {
        let frame = self.canonical_frame()?;
        let t = frame.to_canonical();
        self.transform_rigid(&t);
        conformer.transform(&t);
        Ok(frame)
    }
}
