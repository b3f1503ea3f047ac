//! Multi-conformer shape representation
//!
//! A [`ShapeEnsemble`] pairs each conformer of a molecule with its shape
//! volume. Both are stored in the volume's canonical frame, so a transform
//! found for a volume applies unchanged to its conformer.

use crate::error::{VolumeError, VolumeResult};
use crate::molecule::ShapeMolecule;
use crate::volume::{CanonicalFrame, ShapeVolume};

#[derive(Debug, Clone, Default)]
pub struct ShapeEnsemble {
    conformers: Vec<ShapeMolecule>,
    volumes: Vec<ShapeVolume>,
    frames: Vec<CanonicalFrame>,
}

impl ShapeEnsemble {
    /// Build volumes for every conformer and canonicalize both.
    pub fn from_conformers(conformers: Vec<ShapeMolecule>) -> VolumeResult<Self> {
        let mut ensemble = Self {
            conformers: Vec::with_capacity(conformers.len()),
            volumes: Vec::with_capacity(conformers.len()),
            frames: Vec::with_capacity(conformers.len()),
        };
        for mol in conformers {
            ensemble.push(mol)?;
        }
        Ok(ensemble)
    }

    /// Add one conformer, canonicalizing it together with its volume
    pub fn push(&mut self, mut mol: ShapeMolecule) -> VolumeResult<()> {
        let mut volume = ShapeVolume::from_molecule(&mol)?;
        let frame = volume.pre_process(mol.conformer_mut())?;
        self.conformers.push(mol);
        self.volumes.push(volume);
        self.frames.push(frame);
        Ok(())
    }

    pub fn conformer_count(&self) -> usize {
        self.conformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conformers.is_empty()
    }

    pub fn volumes(&self) -> &[ShapeVolume] {
        &self.volumes
    }

    pub fn volume_at(&self, i: usize) -> VolumeResult<&ShapeVolume> {
        self.volumes
            .get(i)
            .ok_or(VolumeError::ConformerOutOfBounds(i, self.volumes.len()))
    }

    pub fn conformer_at(&self, i: usize) -> VolumeResult<&ShapeMolecule> {
        self.conformers
            .get(i)
            .ok_or(VolumeError::ConformerOutOfBounds(i, self.conformers.len()))
    }

    pub fn conformer_at_mut(&mut self, i: usize) -> VolumeResult<&mut ShapeMolecule> {
        let n = self.conformers.len();
        self.conformers
            .get_mut(i)
            .ok_or(VolumeError::ConformerOutOfBounds(i, n))
    }

    /// Frame that maps conformer `i` back to its input coordinates
    pub fn frame_at(&self, i: usize) -> VolumeResult<&CanonicalFrame> {
        self.frames
            .get(i)
            .ok_or(VolumeError::ConformerOutOfBounds(i, self.frames.len()))
    }

    /// Exit-vector feature count of conformer `i`
    pub fn exit_vector_count(&self, i: usize) -> VolumeResult<usize> {
        Ok(self.volume_at(i)?.exit_vector_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::gaussian::FeatureKind;
    use crate::molecule::FeatureSite;
    use lin_alg::f64::Vec3;

    fn conformer(shift: f64) -> ShapeMolecule {
        let mut mol = ShapeMolecule::new("c");
        mol.add_atom(Element::Carbon, Vec3::new(shift, 0.0, 0.0));
        mol.add_atom(Element::Nitrogen, Vec3::new(shift + 1.4, 0.3, 0.0));
        mol.add_atom(Element::Oxygen, Vec3::new(shift + 2.1, 1.5, 0.2));
        mol.add_atom(Element::Carbon, Vec3::new(shift - 0.7, -1.2, 0.4));
        mol.add_feature(FeatureSite::new(FeatureKind::ExitVector, vec![0]).pointing_to(3))
            .unwrap();
        mol
    }

    #[test]
    fn test_conformers_are_canonicalized() {
        let ens = ShapeEnsemble::from_conformers(vec![conformer(0.0), conformer(25.0)]).unwrap();
        assert_eq!(ens.conformer_count(), 2);
        for i in 0..2 {
            assert!(ens.volume_at(i).unwrap().center_of_mass().magnitude() < 1e-9);
            assert_eq!(ens.exit_vector_count(i).unwrap(), 1);
        }
        let a = ens.conformer_at(0).unwrap().conformer().positions()[0];
        let b = ens.conformer_at(1).unwrap().conformer().positions()[0];
        assert!((a - b).magnitude() < 1e-9);
    }

    #[test]
    fn test_out_of_bounds() {
        let ens = ShapeEnsemble::from_conformers(vec![conformer(0.0)]).unwrap();
        assert!(matches!(ens.volume_at(3), Err(VolumeError::ConformerOutOfBounds(3, 1))));
        assert!(ens.frame_at(0).is_ok());
    }
}
