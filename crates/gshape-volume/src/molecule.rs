//! Molecules as seen by the shape aligner
//!
//! A [`ShapeMolecule`] is a list of atoms with one [`Conformer`] of
//! coordinates, plus caller-supplied pharmacophore [`FeatureSite`]s
//! anchored on atoms. Feature perception itself happens upstream; sites
//! only record where a feature sits so it follows the coordinates.

use lin_alg::f64::Vec3;

use crate::element::Element;
use crate::error::{VolumeError, VolumeResult};
use crate::gaussian::FeatureKind;
use crate::transform::{RigidTransform, TransformSequence};

/// One set of atom coordinates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conformer {
    positions: Vec<Vec3>,
}

impl Conformer {
    pub fn new(positions: Vec<Vec3>) -> Self {
        Self { positions }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.positions
    }

    pub fn get(&self, atom: usize) -> Option<Vec3> {
        self.positions.get(atom).copied()
    }

    /// Geometric center
    pub fn center(&self) -> Vec3 {
        if self.positions.is_empty() {
            return Vec3::new_zero();
        }
        let sum = self.positions.iter().fold(Vec3::new_zero(), |acc, p| acc + *p);
        sum * (1.0 / self.positions.len() as f64)
    }

    /// Translate all coordinates by a vector
    pub fn translate(&mut self, delta: Vec3) {
        for p in self.positions.iter_mut() {
            *p = *p + delta;
        }
    }

    pub fn transform(&mut self, t: &RigidTransform) {
        for p in self.positions.iter_mut() {
            *p = t.apply_point(*p);
        }
    }

    pub fn apply_sequence(&mut self, seq: &TransformSequence) {
        seq.apply_points(&mut self.positions);
    }
}

/// Where a pharmacophore feature sits on a molecule
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSite {
    pub kind: FeatureKind,
    /// Atoms whose centroid is the feature center (one atom for
    /// donors/acceptors/exit vectors, all ring atoms for rings)
    pub anchors: Vec<usize>,
    /// Atom the feature points toward (donor hydrogen, lone-pair
    /// direction, exit substituent). Rings with ≥ 3 anchors use their
    /// plane normal instead.
    pub toward: Option<usize>,
}

impl FeatureSite {
    pub fn new(kind: FeatureKind, anchors: Vec<usize>) -> Self {
        Self { kind, anchors, toward: None }
    }

    pub fn pointing_to(mut self, atom: usize) -> Self {
        self.toward = Some(atom);
        self
    }

    /// Feature center in the given conformer
    pub fn center(&self, conformer: &Conformer) -> VolumeResult<Vec3> {
        if self.anchors.is_empty() {
            return Err(VolumeError::NoAnchors(self.kind.to_string()));
        }
        let mut sum = Vec3::new_zero();
        for &a in &self.anchors {
            let p = conformer
                .get(a)
                .ok_or(VolumeError::AtomIndexOutOfBounds(a, conformer.len()))?;
            sum = sum + p;
        }
        Ok(sum * (1.0 / self.anchors.len() as f64))
    }

    /// Feature direction in the given conformer, if defined
    pub fn direction(&self, conformer: &Conformer) -> VolumeResult<Option<Vec3>> {
        let center = self.center(conformer)?;
        if let Some(t) = self.toward {
            let p = conformer
                .get(t)
                .ok_or(VolumeError::AtomIndexOutOfBounds(t, conformer.len()))?;
            return Ok(Some(p - center));
        }
        if self.kind.is_ring() && self.anchors.len() >= 3 {
            let a = conformer.get(self.anchors[0]).unwrap_or(center);
            let b = conformer.get(self.anchors[1]).unwrap_or(center);
            let c = conformer.get(self.anchors[2]).unwrap_or(center);
            return Ok(Some((b - a).cross(c - a)));
        }
        Ok(None)
    }
}

/// Atoms, coordinates and feature sites of one conformer
#[derive(Debug, Clone, Default)]
pub struct ShapeMolecule {
    pub name: String,
    elements: Vec<Element>,
    conformer: Conformer,
    features: Vec<FeatureSite>,
}

impl ShapeMolecule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an atom and return its index
    pub fn add_atom(&mut self, element: Element, position: Vec3) -> usize {
        self.elements.push(element);
        self.conformer.positions.push(position);
        self.elements.len() - 1
    }

    /// Add a feature site; anchors and direction atom must exist
    pub fn add_feature(&mut self, site: FeatureSite) -> VolumeResult<()> {
        let n = self.atom_count();
        if site.anchors.is_empty() {
            return Err(VolumeError::NoAnchors(site.kind.to_string()));
        }
        if let Some(&bad) = site.anchors.iter().chain(site.toward.iter()).find(|&&a| a >= n) {
            return Err(VolumeError::AtomIndexOutOfBounds(bad, n));
        }
        self.features.push(site);
        Ok(())
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.elements.len()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn features(&self) -> &[FeatureSite] {
        &self.features
    }

    pub fn conformer(&self) -> &Conformer {
        &self.conformer
    }

    pub fn conformer_mut(&mut self) -> &mut Conformer {
        &mut self.conformer
    }

    /// Replace the coordinates; the atom count must match
    pub fn set_conformer(&mut self, conformer: Conformer) -> VolumeResult<()> {
        if conformer.len() != self.atom_count() {
            return Err(VolumeError::CoordinateMismatch {
                expected: self.atom_count(),
                actual: conformer.len(),
            });
        }
        self.conformer = conformer;
        Ok(())
    }

    /// Number of exit-vector sites
    pub fn exit_vector_count(&self) -> usize {
        self.features
            .iter()
            .filter(|f| f.kind == FeatureKind::ExitVector)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn benzene_like() -> ShapeMolecule {
        let mut mol = ShapeMolecule::new("ring");
        for i in 0..6 {
            let a = i as f64 * std::f64::consts::PI / 3.0;
            mol.add_atom(Element::Carbon, Vec3::new(1.4 * a.cos(), 1.4 * a.sin(), 0.0));
        }
        mol
    }

    #[test]
    fn test_ring_center_and_normal() {
        let mut mol = benzene_like();
        mol.add_feature(FeatureSite::new(FeatureKind::AromaticRing, (0..6).collect()))
            .unwrap();
        let site = &mol.features()[0];
        let c = site.center(mol.conformer()).unwrap();
        assert!(c.magnitude() < 1e-12);
        let n = site.direction(mol.conformer()).unwrap().unwrap().to_normalized();
        assert!((n.z.abs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_feature_validation() {
        let mut mol = benzene_like();
        assert!(matches!(
            mol.add_feature(FeatureSite::new(FeatureKind::Donor, vec![7])),
            Err(VolumeError::AtomIndexOutOfBounds(7, 6))
        ));
        assert!(matches!(
            mol.add_feature(FeatureSite::new(FeatureKind::Donor, vec![0]).pointing_to(9)),
            Err(VolumeError::AtomIndexOutOfBounds(9, 6))
        ));
        assert!(mol.add_feature(FeatureSite::new(FeatureKind::Donor, vec![])).is_err());
    }

    #[test]
    fn test_set_conformer_mismatch() {
        let mut mol = benzene_like();
        let err = mol.set_conformer(Conformer::new(vec![Vec3::new_zero()])).unwrap_err();
        assert!(matches!(err, VolumeError::CoordinateMismatch { expected: 6, actual: 1 }));
    }

    #[test]
    fn test_exit_vector_count() {
        let mut mol = benzene_like();
        mol.add_feature(FeatureSite::new(FeatureKind::ExitVector, vec![0]).pointing_to(1))
            .unwrap();
        mol.add_feature(FeatureSite::new(FeatureKind::Acceptor, vec![2])).unwrap();
        assert_eq!(mol.exit_vector_count(), 1);
    }
}
