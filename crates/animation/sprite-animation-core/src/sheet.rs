use std::sync::Arc;

use hashbrown::HashSet;
use image::{Rgb, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::atlas::{AtlasView, Cell, FrameSource, DEFAULT_SCALE};
use crate::config::Config;
use crate::error::SpriteError;
use crate::handler::AnimationHandler;
use crate::sequence::AnimationSequence;
use crate::Result;

fn default_scale() -> u32 {
    DEFAULT_SCALE
}

/// One named animation: an ordered list of `[col, row]` cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequenceDef {
    pub name: String,
    pub frames: Vec<Cell>,
}

/// Which animation a handler falls back to, and at what scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefaultDef {
    pub animation: String,
    #[serde(default = "default_scale")]
    pub scale: u32,
}

/// Declarative description of a sprite sheet and the animations cut from it.
///
/// The atlas pixels are not part of the definition; they are bound at build time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheetDef {
    #[serde(default)]
    pub name: Option<String>,
    pub cell_width: u32,
    pub cell_height: u32,
    /// RGB colour treated as transparent.
    #[serde(default)]
    pub color_key: Option<[u8; 3]>,
    /// Falls back to the first animation at scale 1 when absent.
    #[serde(default)]
    pub default: Option<DefaultDef>,
    pub animations: Vec<SequenceDef>,
}

/// Parse a JSON sheet definition and validate its structure.
///
/// Cell ranges are only checked once an atlas is bound (see [`SheetDef::build_atlas`]).
pub fn parse_sheet_json(s: &str) -> Result<SheetDef> {
    let def: SheetDef = serde_json::from_str(s)?;
    def.validate()?;
    Ok(def)
}

impl SheetDef {
    /// Structural checks that do not need the atlas.
    pub fn validate(&self) -> Result<()> {
        if self.cell_width == 0 || self.cell_height == 0 {
            return Err(SpriteError::invalid(format!(
                "cell dimensions must be positive, got {}x{}",
                self.cell_width, self.cell_height
            )));
        }
        if self.animations.is_empty() {
            return Err(SpriteError::invalid("sheet defines no animations"));
        }

        let mut seen = HashSet::new();
        for anim in &self.animations {
            if anim.name.is_empty() {
                return Err(SpriteError::invalid("animation name must not be empty"));
            }
            if anim.frames.is_empty() {
                return Err(SpriteError::invalid(format!(
                    "animation '{}' has no frames",
                    anim.name
                )));
            }
            if !seen.insert(anim.name.as_str()) {
                return Err(SpriteError::DuplicateName {
                    name: anim.name.clone(),
                });
            }
        }

        if let Some(default) = &self.default {
            if !seen.contains(default.animation.as_str()) {
                return Err(SpriteError::not_found(&default.animation));
            }
            if default.scale == 0 {
                return Err(SpriteError::invalid("default scale must be at least 1"));
            }
        }
        Ok(())
    }

    /// Bind a pre-loaded atlas to this sheet's cell geometry.
    pub fn build_atlas(&self, atlas: Arc<RgbaImage>) -> Result<Arc<AtlasView>> {
        let view = AtlasView::new(
            atlas,
            self.cell_width,
            self.cell_height,
            self.color_key.map(Rgb),
        )?;
        Ok(Arc::new(view))
    }

    /// Instantiate every animation over `source`, in declaration order.
    pub fn build_sequences(&self, source: Arc<dyn FrameSource>) -> Result<Vec<AnimationSequence>> {
        self.animations
            .iter()
            .map(|a| AnimationSequence::new(a.name.clone(), a.frames.iter().copied(), source.clone()))
            .collect()
    }

    pub fn build_handler(&self, atlas: Arc<RgbaImage>) -> Result<AnimationHandler> {
        self.build_handler_with_config(atlas, Config::default())
    }

    /// Build a handler with every animation registered and the default entry installed.
    pub fn build_handler_with_config(
        &self,
        atlas: Arc<RgbaImage>,
        cfg: Config,
    ) -> Result<AnimationHandler> {
        self.validate()?;
        let source: Arc<dyn FrameSource> = self.build_atlas(atlas)?;
        let sequences = self.build_sequences(source)?;

        let (default_name, default_scale) = match &self.default {
            Some(d) => (d.animation.as_str(), d.scale),
            None => (self.animations[0].name.as_str(), DEFAULT_SCALE),
        };

        let mut rest = Vec::with_capacity(sequences.len());
        let mut default_seq = None;
        for seq in sequences {
            if default_seq.is_none() && seq.name() == default_name {
                default_seq = Some(seq);
            } else {
                rest.push(seq);
            }
        }
        let default_seq = default_seq.ok_or_else(|| SpriteError::not_found(default_name))?;

        let mut handler =
            AnimationHandler::with_config(default_seq.into_handle(), default_scale, cfg)?;
        for seq in rest {
            handler.add_animation(seq)?;
        }
        log::debug!(
            "built handler for sheet {:?} with {} animations",
            self.name,
            self.animations.len()
        );
        Ok(handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = r#"{
        "cell_width": 2, "cell_height": 2,
        "color_key": [255, 0, 255],
        "animations": [
            { "name": "idle", "frames": [[0, 0], [1, 0]] },
            { "name": "jump", "frames": [[1, 1]] }
        ]
    }"#;

    #[test]
    fn parses_minimal_sheet() {
        let def = parse_sheet_json(SHEET).unwrap();
        assert_eq!(def.animations.len(), 2);
        assert_eq!(def.animations[1].frames, vec![Cell::new(1, 1)]);
        assert_eq!(def.color_key, Some([255, 0, 255]));
        assert!(def.default.is_none());
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = parse_sheet_json("{ \"cell_width\": 2").unwrap_err();
        assert_eq!(err.category(), "serialization");
    }

    #[test]
    fn missing_default_is_reported() {
        let mut def = parse_sheet_json(SHEET).unwrap();
        def.default = Some(DefaultDef {
            animation: "run".into(),
            scale: 1,
        });
        assert_eq!(def.validate().unwrap_err(), SpriteError::not_found("run"));
    }

    #[test]
    fn first_animation_is_the_implicit_default() {
        let def = parse_sheet_json(SHEET).unwrap();
        let handler = def.build_handler(Arc::new(RgbaImage::new(4, 4))).unwrap();
        assert_eq!(handler.default_entry().name(), "idle");
        assert_eq!(handler.default_entry().scale, 1);
        assert_eq!(handler.animation_names(), vec!["idle", "jump"]);
    }

    #[test]
    fn cells_are_checked_against_bound_atlas() {
        let def = parse_sheet_json(SHEET).unwrap();
        let err = def.build_handler(Arc::new(RgbaImage::new(4, 2))).unwrap_err();
        assert!(matches!(err, SpriteError::CellOutOfRange { col: 1, row: 1, .. }));
    }
}
