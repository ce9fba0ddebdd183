//! Sprite animation core (engine-agnostic)
//!
//! Slices a pre-loaded texture atlas into frames ([`AtlasView`]), strings frames
//! into named looping sequences ([`AnimationSequence`]) and drives one playback
//! state machine per entity ([`AnimationHandler`]). Decoding, compositing and
//! presentation stay with the host.

pub mod atlas;
pub mod config;
pub mod error;
pub mod handler;
pub mod outputs;
pub mod sequence;
pub mod sheet;

// Re-exports for consumers (adapters)
pub use atlas::{AtlasView, Cell, FrameSource, DEFAULT_SCALE};
pub use config::Config;
pub use error::SpriteError;
pub use handler::{AnimationHandler, PlaybackEntry};
pub use outputs::{HandlerEvent, StartSource};
pub use sequence::{Advance, AnimationSequence, SequenceHandle};
pub use sheet::{parse_sheet_json, DefaultDef, SequenceDef, SheetDef};

pub use image::{Rgb, Rgba, RgbaImage};

/// Sprite animation result type
pub type Result<T> = core::result::Result<T, SpriteError>;
