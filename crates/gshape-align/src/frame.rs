//! Scoped canonical frame over a coordinate set
//!
//! Alignment transforms are found between canonicalized shapes, so the fit
//! coordinates have to enter their canonical frame for the search and
//! leave it afterwards. [`FrameGuard`] owns that round trip: either the
//! result is committed into the reference's original frame, or dropping the
//! guard puts the coordinates back where they were.

use gshape_volume::{CanonicalFrame, Conformer, TransformSequence};

pub struct FrameGuard<'a> {
    conformer: &'a mut Conformer,
    frame: CanonicalFrame,
    committed: bool,
}

impl<'a> FrameGuard<'a> {
    /// Move `conformer` into the canonical coordinates of `frame`
    pub fn enter(conformer: &'a mut Conformer, frame: CanonicalFrame) -> Self {
        conformer.transform(&frame.to_canonical());
        Self {
            conformer,
            frame,
            committed: false,
        }
    }

    /// Coordinates in the canonical frame
    pub fn conformer(&self) -> &Conformer {
        self.conformer
    }

    /// Apply `alignment` (canonical fit → canonical reference), then leave
    /// through the reference's frame: inverse rotation followed by the
    /// reference's original center of mass.
    pub fn commit(mut self, alignment: &TransformSequence, reference: &CanonicalFrame) {
        self.conformer.apply_sequence(alignment);
        self.conformer.transform(&reference.from_canonical());
        self.committed = true;
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.conformer.transform(&self.frame.from_canonical());
        }
    }
}
