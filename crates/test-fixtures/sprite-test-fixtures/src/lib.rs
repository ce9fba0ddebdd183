use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    sheets: HashMap<String, String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// JSON sheet definitions listed in `fixtures/manifest.json`.
pub mod sheets {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.sheets.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.sheets, "sheet", name)?;
        read_to_string(rel)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let rel = lookup(&MANIFEST.sheets, "sheet", name)?;
        super::load_json(rel)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.sheets, "sheet", name)?;
        Ok(resolve_path(rel))
    }
}

/// Procedurally generated atlases, so tests never decode image files.
///
/// Every cell is filled with a colour derived from its grid position
/// ([`atlases::cell_color`]); keyed atlases additionally paint the top-left
/// pixel of each cell with [`atlases::KEY`].
pub mod atlases {
    use image::{Rgba, RgbaImage};

    /// Magenta colour key.
    pub const KEY: [u8; 3] = [255, 0, 255];

    /// Opaque fill colour of cell `(col, row)`. Never equal to [`KEY`].
    pub fn cell_color(col: u32, row: u32) -> Rgba<u8> {
        Rgba([(col * 40 + 10) as u8, (row * 40 + 10) as u8, 100, 255])
    }

    /// `columns x rows` grid of `cell_w x cell_h` cells, no key pixels.
    pub fn coded(columns: u32, rows: u32, cell_w: u32, cell_h: u32) -> RgbaImage {
        RgbaImage::from_fn(columns * cell_w, rows * cell_h, |x, y| {
            cell_color(x / cell_w, y / cell_h)
        })
    }

    /// Like [`coded`] but with the top-left pixel of every cell set to [`KEY`].
    pub fn coded_keyed(columns: u32, rows: u32, cell_w: u32, cell_h: u32) -> RgbaImage {
        let mut img = coded(columns, rows, cell_w, cell_h);
        for row in 0..rows {
            for col in 0..columns {
                img.put_pixel(col * cell_w, row * cell_h, Rgba([KEY[0], KEY[1], KEY[2], 255]));
            }
        }
        img
    }
}
