//! Error types for the alignment engine

use thiserror::Error;

use gshape_algos::GeomError;
use gshape_volume::VolumeError;

/// Errors that can occur during an alignment search
#[derive(Error, Debug, Clone)]
pub enum AlignError {
    /// No reference conformers were given
    #[error("Reference conformer list is empty")]
    EmptyReference,

    /// No fit conformers were given
    #[error("Fit conformer list is empty")]
    EmptyFit,

    /// Seeding and refinement produced no candidate for any conformer pair
    #[error("No alignment candidate found ({failed_pairs} of {total_pairs} conformer pairs failed)")]
    NoCandidateFound { failed_pairs: usize, total_pairs: usize },

    /// The search was cancelled or ran past its deadline
    #[error("Alignment search cancelled")]
    Cancelled,

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A collaborator reported a failure for one candidate
    #[error("Refinement failed: {0}")]
    Refinement(String),

    #[error(transparent)]
    Volume(#[from] VolumeError),

    #[error(transparent)]
    Geometry(#[from] GeomError),
}

impl AlignError {
    /// Whether the failure must abort the whole search instead of just
    /// the affected pair or candidate
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AlignError::Cancelled
                | AlignError::InvalidConfig(_)
                | AlignError::EmptyReference
                | AlignError::EmptyFit
        )
    }
}

/// Result type for alignment operations
pub type AlignResult<T> = Result<T, AlignError>;
