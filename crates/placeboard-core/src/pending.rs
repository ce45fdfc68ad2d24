//! Buffer of local pixel edits that the store has not acknowledged yet.
//!
//! Every pending pixel remembers the code it showed before the first edit
//! touched it. That original is what `clear` restores and what a repaint is
//! compared against to detect a revert.

use crate::board::PixelKey;
use crate::color::ColorCode;
use crate::surface::Surface;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default number of distinct pixels a batch may hold.
pub const DEFAULT_CAPACITY: usize = 256;

/// One pixel edit as sent to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelEdit {
    pub x: u16,
    pub y: u16,
    pub code: ColorCode,
}

impl PixelEdit {
    pub fn new(key: PixelKey, code: ColorCode) -> Self {
        Self {
            x: key.x,
            y: key.y,
            code,
        }
    }

    /// Key of the edited pixel, `None` if the coordinates are off the board.
    pub fn key(&self) -> Option<PixelKey> {
        PixelKey::new(self.x as usize, self.y as usize)
    }
}

/// Immutable copy of the pending edits taken at submission time.
pub type EditBatch = Vec<PixelEdit>;

/// Result of a paint request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintOutcome {
    /// A pending edit was added or overwritten and the pixel repainted.
    Painted,
    /// The pixel was painted back to its original code; its pending edit is gone.
    Reverted,
    /// The pixel already shows this code and has no pending edit.
    Unchanged,
    /// The buffer is full and this pixel is not already pending.
    Rejected,
}

/// Pending edits plus the pre-edit code of every touched pixel.
#[derive(Debug, Clone)]
pub struct PendingEdits {
    edits: HashMap<PixelKey, ColorCode>,
    originals: HashMap<PixelKey, ColorCode>,
    capacity: usize,
}

impl Default for PendingEdits {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PendingEdits {
    pub fn new(capacity: usize) -> Self {
        Self {
            edits: HashMap::new(),
            originals: HashMap::new(),
            capacity,
        }
    }

    /// Record an edit and paint it.
    ///
    /// The original code of a pixel is read back from the surface the first
    /// time it is touched; a color that is not in the palette reads as `A`.
    pub fn paint<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        key: PixelKey,
        code: ColorCode,
    ) -> PaintOutcome {
        let original = match self.originals.get(&key) {
            Some(original) => *original,
            None => surface
                .pixel(key.x as usize, key.y as usize)
                .map(ColorCode::from_rgb_or_default)
                .unwrap_or(ColorCode::A),
        };

        if code == original {
            if self.edits.remove(&key).is_some() {
                self.originals.remove(&key);
                Self::paint_pixel(surface, key, original);
                return PaintOutcome::Reverted;
            }
            return PaintOutcome::Unchanged;
        }

        if !self.edits.contains_key(&key) && self.is_full() {
            return PaintOutcome::Rejected;
        }

        self.originals.entry(key).or_insert(original);
        self.edits.insert(key, code);
        Self::paint_pixel(surface, key, code);
        PaintOutcome::Painted
    }

    /// Repaint every pending pixel to its original code and forget all edits.
    pub fn clear<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        for (key, original) in self.originals.drain() {
            Self::paint_pixel(surface, key, original);
        }
        self.edits.clear();
    }

    /// Copy of the current edits, ordered row by row.
    pub fn snapshot(&self) -> EditBatch {
        let mut batch: EditBatch = self
            .edits
            .iter()
            .map(|(key, code)| PixelEdit::new(*key, *code))
            .collect();
        batch.sort_by_key(|edit| (edit.y, edit.x));
        batch
    }

    /// Drop the edits the store accepted.
    ///
    /// Only keys whose live value still equals the submitted value are
    /// removed; a pixel repainted while the batch was in flight stays
    /// pending. Returns how many edits were cleared.
    pub fn acknowledge(&mut self, batch: &[PixelEdit]) -> usize {
        let mut cleared = 0;
        for edit in batch {
            let Some(key) = edit.key() else { continue };
            if self.edits.get(&key) == Some(&edit.code) {
                self.edits.remove(&key);
                self.originals.remove(&key);
                cleared += 1;
            }
        }
        cleared
    }

    /// Paint every pending edit again, e.g. over a freshly loaded board.
    ///
    /// Originals are not refreshed from the new board. A kept edit still
    /// remembers the code its pixel showed before it was first painted, so
    /// painting it back to that code is a revert and shows the old code even
    /// if the store has since changed the pixel.
    pub fn reapply<S: Surface + ?Sized>(&self, surface: &mut S) {
        for (key, code) in &self.edits {
            Self::paint_pixel(surface, *key, *code);
        }
    }

    fn paint_pixel<S: Surface + ?Sized>(surface: &mut S, key: PixelKey, code: ColorCode) {
        surface.fill_pixel(key.x as usize, key.y as usize, code.rgb());
    }

    /// Pending code for a pixel.
    pub fn get(&self, key: PixelKey) -> Option<ColorCode> {
        self.edits.get(&key).copied()
    }

    /// Code the pixel showed before it was first edited.
    pub fn original(&self, key: PixelKey) -> Option<ColorCode> {
        self.originals.get(&key).copied()
    }

    pub fn size(&self) -> usize {
        self.edits.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.edits.len() >= self.capacity
    }

    /// Fill level in `[0, 1]` for the progress indicator.
    pub fn progress(&self) -> f32 {
        if self.capacity == 0 {
            return 1.0;
        }
        self.edits.len() as f32 / self.capacity as f32
    }
}
