//! Gaussian shape volumes for molecular shape alignment
//!
//! This crate provides the geometric side of shape alignment:
//!
//! - [`Element`] - Elements with the VdW radii that size atom Gaussians
//! - [`ShapeMolecule`] / [`Conformer`] - Atoms, coordinates and anchored
//!   pharmacophore [`FeatureSite`]s
//! - [`ShapeVolume`] - Atom and pharmacophore Gaussians of one conformer,
//!   with canonical-frame pre-processing
//! - [`ShapeEnsemble`] - Conformers of one molecule with their volumes
//! - [`RigidTransform`] / [`TransformSequence`] - Composable rigid motions
//!
//! # Example
//!
//! ```rust
//! use gshape_volume::{Element, FeatureKind, FeatureSite, ShapeMolecule, ShapeVolume};
//! use lin_alg::f64::Vec3;
//!
//! let mut mol = ShapeMolecule::new("methanol");
//! let c = mol.add_atom(Element::Carbon, Vec3::new(0.0, 0.0, 0.0));
//! let o = mol.add_atom(Element::Oxygen, Vec3::new(1.43, 0.0, 0.0));
//! let h = mol.add_atom(Element::Hydrogen, Vec3::new(1.75, 0.9, 0.0));
//! mol.add_feature(FeatureSite::new(FeatureKind::Donor, vec![o]).pointing_to(h)).unwrap();
//!
//! let volume = ShapeVolume::from_molecule(&mol).unwrap();
//! assert_eq!(volume.atom_gaussians().len(), 2);
//! assert_eq!(volume.pp_gaussians().len(), 1);
//! # let _ = c;
//! ```

mod element;
mod ensemble;
mod error;
pub mod gaussian;
mod molecule;
pub mod transform;
mod volume;

pub use element::Element;
pub use ensemble::ShapeEnsemble;
pub use error::{VolumeError, VolumeResult};
pub use gaussian::{AtomGaussian, FeatureKind, PharmacophoreGaussian};
pub use molecule::{Conformer, FeatureSite, ShapeMolecule};
pub use transform::{RigidTransform, TransformSequence};
pub use volume::{CanonicalFrame, ShapeVolume};
