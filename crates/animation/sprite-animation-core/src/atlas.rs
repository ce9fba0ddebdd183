//! Atlas slicing: grid cells, the frame-source capability and the `AtlasView` over a shared atlas.

use std::fmt;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::SpriteError;
use crate::Result;

/// Scale applied when callers do not ask for one.
pub const DEFAULT_SCALE: u32 = 1;

/// One grid position within an atlas. Serialized as `[col, row]`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Cell {
    pub col: u32,
    pub row: u32,
}

impl Cell {
    #[inline]
    pub const fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

impl From<(u32, u32)> for Cell {
    fn from((col, row): (u32, u32)) -> Self {
        Self { col, row }
    }
}

impl From<[u32; 2]> for Cell {
    fn from([col, row]: [u32; 2]) -> Self {
        Self { col, row }
    }
}

impl From<Cell> for [u32; 2] {
    fn from(c: Cell) -> Self {
        [c.col, c.row]
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// Anything that can hand out a scaled frame image for a grid cell.
///
/// Sequences only talk to this trait, so several atlas layouts (or procedurally
/// generated frames) can sit behind the same playback code.
pub trait FrameSource: fmt::Debug {
    /// Extract `cell`, scaled by the integer factor `scale`.
    fn get_image(&self, scale: u32, cell: Cell) -> Result<RgbaImage>;

    /// Size in pixels of one unscaled cell.
    fn cell_size(&self) -> (u32, u32);

    /// Number of addressable columns and rows.
    fn grid_size(&self) -> (u32, u32);

    fn contains(&self, cell: Cell) -> bool {
        let (columns, rows) = self.grid_size();
        cell.col < columns && cell.row < rows
    }

    /// Range-check `cell` against the grid.
    fn check_cell(&self, cell: Cell) -> Result<()> {
        if self.contains(cell) {
            return Ok(());
        }
        let (columns, rows) = self.grid_size();
        Err(SpriteError::CellOutOfRange {
            col: cell.col,
            row: cell.row,
            columns,
            rows,
        })
    }
}

/// Grid view over a pre-loaded atlas.
///
/// The atlas pixels are shared and never written to; every image handed out is
/// an independent copy.
#[derive(Clone)]
pub struct AtlasView {
    atlas: Arc<RgbaImage>,
    cell_width: u32,
    cell_height: u32,
    color_key: Option<Rgb<u8>>,
}

impl fmt::Debug for AtlasView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtlasView")
            .field("atlas", &self.atlas.dimensions())
            .field("cell_width", &self.cell_width)
            .field("cell_height", &self.cell_height)
            .field("color_key", &self.color_key.map(|k| k.0))
            .finish()
    }
}

impl AtlasView {
    /// Wrap `atlas` with the given cell geometry. Pixels equal to `color_key`
    /// (RGB comparison) come out fully transparent.
    pub fn new(
        atlas: Arc<RgbaImage>,
        cell_width: u32,
        cell_height: u32,
        color_key: Option<Rgb<u8>>,
    ) -> Result<Self> {
        if cell_width == 0 || cell_height == 0 {
            return Err(SpriteError::invalid(format!(
                "cell dimensions must be positive, got {cell_width}x{cell_height}"
            )));
        }
        let (w, h) = atlas.dimensions();
        if w % cell_width != 0 || h % cell_height != 0 {
            log::warn!(
                "atlas {w}x{h} is not a multiple of the {cell_width}x{cell_height} cell; trailing pixels are unreachable"
            );
        }
        Ok(Self {
            atlas,
            cell_width,
            cell_height,
            color_key,
        })
    }

    pub fn atlas(&self) -> &Arc<RgbaImage> {
        &self.atlas
    }

    pub fn color_key(&self) -> Option<Rgb<u8>> {
        self.color_key
    }

    fn apply_color_key(&self, frame: &mut RgbaImage) {
        let Some(Rgb(key)) = self.color_key else {
            return;
        };
        for px in frame.pixels_mut() {
            if px.0[..3] == key {
                px.0[3] = 0;
            }
        }
    }
}

impl FrameSource for AtlasView {
    fn get_image(&self, scale: u32, cell: Cell) -> Result<RgbaImage> {
        if scale == 0 {
            return Err(SpriteError::invalid("scale must be at least 1"));
        }
        self.check_cell(cell)?;

        let (out_w, out_h) = match (
            self.cell_width.checked_mul(scale),
            self.cell_height.checked_mul(scale),
        ) {
            (Some(w), Some(h)) => (w, h),
            _ => {
                return Err(SpriteError::invalid(format!(
                    "scale {scale} overflows the output size"
                )))
            }
        };

        let mut frame = imageops::crop_imm(
            &*self.atlas,
            cell.col * self.cell_width,
            cell.row * self.cell_height,
            self.cell_width,
            self.cell_height,
        )
        .to_image();
        // Keyed at source resolution; nearest sampling carries alpha through unchanged.
        self.apply_color_key(&mut frame);

        if scale == 1 {
            return Ok(frame);
        }
        Ok(imageops::resize(&frame, out_w, out_h, FilterType::Nearest))
    }

    fn cell_size(&self) -> (u32, u32) {
        (self.cell_width, self.cell_height)
    }

    fn grid_size(&self) -> (u32, u32) {
        let (w, h) = self.atlas.dimensions();
        (w / self.cell_width, h / self.cell_height)
    }
}
