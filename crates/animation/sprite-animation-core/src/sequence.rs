//! Named frame sequences with a looping cursor.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use image::RgbaImage;

use crate::atlas::{Cell, FrameSource};
use crate::error::SpriteError;
use crate::Result;

/// Shared handle to a sequence. Handlers, queues and callers all point at the
/// same cursor, which persists between playbacks.
pub type SequenceHandle = Rc<RefCell<AnimationSequence>>;

/// Result of moving a sequence cursor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Cursor moved; carries the frame index now addressed.
    Advanced(usize),
    /// Cursor ran past the last frame and was reset to 0.
    Wrapped,
}

impl Advance {
    #[inline]
    pub fn is_wrapped(&self) -> bool {
        matches!(self, Self::Wrapped)
    }
}

/// Ordered list of atlas cells plus a playback cursor.
#[derive(Debug, Clone)]
pub struct AnimationSequence {
    name: String,
    frames: Vec<Cell>,
    source: Arc<dyn FrameSource>,
    /// Fractional position; the drawn frame is `floor(cursor)`.
    cursor: f32,
}

impl AnimationSequence {
    /// Build a sequence over `source`. Every cell is checked against the source grid.
    pub fn new(
        name: impl Into<String>,
        frames: impl IntoIterator<Item = Cell>,
        source: Arc<dyn FrameSource>,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(SpriteError::invalid("sequence name must not be empty"));
        }
        let frames: Vec<Cell> = frames.into_iter().collect();
        if frames.is_empty() {
            return Err(SpriteError::invalid(format!(
                "sequence '{name}' needs at least one frame"
            )));
        }
        for cell in &frames {
            source.check_cell(*cell)?;
        }
        Ok(Self {
            name,
            frames,
            source,
            cursor: 0.0,
        })
    }

    /// Wrap into a shared handle.
    pub fn into_handle(self) -> SequenceHandle {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frames(&self) -> &[Cell] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn source(&self) -> &Arc<dyn FrameSource> {
        &self.source
    }

    /// Raw cursor position.
    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    /// Frame index the cursor currently addresses.
    #[inline]
    pub fn index(&self) -> usize {
        self.cursor.floor() as usize
    }

    /// Cell addressed by the cursor.
    pub fn current_cell(&self) -> Result<Cell> {
        let index = self.index();
        self.frames
            .get(index)
            .copied()
            .ok_or_else(|| SpriteError::IndexOutOfRange {
                sequence: self.name.clone(),
                index,
                len: self.frames.len(),
            })
    }

    /// Image of the current frame at `scale`.
    pub fn draw(&self, scale: u32) -> Result<RgbaImage> {
        let cell = self.current_cell()?;
        self.source.get_image(scale, cell)
    }

    /// Move the cursor forward by `step` frames, wrapping to 0 past the end.
    pub fn iterate(&mut self, step: f32) -> Result<Advance> {
        if !step.is_finite() || step <= 0.0 {
            return Err(SpriteError::invalid(format!(
                "step must be a positive finite number, got {step}"
            )));
        }
        self.cursor += step;
        if self.cursor >= self.frames.len() as f32 {
            self.cursor = 0.0;
            return Ok(Advance::Wrapped);
        }
        Ok(Advance::Advanced(self.index()))
    }

    /// Rewind to the first frame.
    pub fn reset(&mut self) {
        self.cursor = 0.0;
    }

    /// Append one frame to the end of the loop.
    pub fn add_frame(&mut self, cell: Cell) -> Result<()> {
        self.source.check_cell(cell)?;
        self.frames.push(cell);
        Ok(())
    }

    /// Append several frames. Nothing is added if any cell is out of range.
    pub fn add_frames(&mut self, cells: impl IntoIterator<Item = Cell>) -> Result<()> {
        let cells: Vec<Cell> = cells.into_iter().collect();
        for cell in &cells {
            self.source.check_cell(*cell)?;
        }
        self.frames.extend(cells);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::AtlasView;

    fn source() -> Arc<dyn FrameSource> {
        Arc::new(AtlasView::new(Arc::new(RgbaImage::new(8, 4)), 2, 2, None).unwrap())
    }

    fn seq(n: u32) -> AnimationSequence {
        AnimationSequence::new("walk", (0..n).map(|c| Cell::new(c, 0)), source()).unwrap()
    }

    #[test]
    fn wraps_after_n_steps() {
        let mut s = seq(4);
        for i in 1..4 {
            assert_eq!(s.iterate(1.0).unwrap(), Advance::Advanced(i));
        }
        assert_eq!(s.iterate(1.0).unwrap(), Advance::Wrapped);
        assert_eq!(s.index(), 0);
    }

    #[test]
    fn fractional_steps_hold_frames() {
        let mut s = seq(2);
        assert_eq!(s.iterate(0.5).unwrap(), Advance::Advanced(0));
        assert_eq!(s.iterate(0.5).unwrap(), Advance::Advanced(1));
        assert_eq!(s.iterate(0.5).unwrap(), Advance::Advanced(1));
        assert_eq!(s.iterate(0.5).unwrap(), Advance::Wrapped);
    }

    #[test]
    fn large_step_wraps_to_zero_not_modulo() {
        let mut s = seq(3);
        assert!(s.iterate(7.0).unwrap().is_wrapped());
        assert_eq!(s.cursor(), 0.0);
    }

    #[test]
    fn non_positive_step_is_rejected() {
        let mut s = seq(3);
        assert!(s.iterate(0.0).is_err());
        assert!(s.iterate(-1.0).is_err());
        assert!(s.iterate(f32::NAN).is_err());
        assert_eq!(s.cursor(), 0.0);
    }

    #[test]
    fn construction_validates_frames() {
        assert!(AnimationSequence::new("empty", Vec::new(), source()).is_err());
        assert!(AnimationSequence::new("", [Cell::new(0, 0)], source()).is_err());
        let err = AnimationSequence::new("far", [Cell::new(4, 0)], source()).unwrap_err();
        assert_eq!(err.category(), "range");
    }

    #[test]
    fn add_frames_is_all_or_nothing() {
        let mut s = seq(1);
        s.add_frame(Cell::new(3, 1)).unwrap();
        assert_eq!(s.len(), 2);
        assert!(s.add_frames([Cell::new(1, 0), Cell::new(9, 9)]).is_err());
        assert_eq!(s.len(), 2);
        s.add_frames([Cell::new(1, 0), Cell::new(2, 1)]).unwrap();
        assert_eq!(s.frames().last(), Some(&Cell::new(2, 1)));
    }
}
