//! Sticker overlays for stickercam
//!
//! Stickers are emoji-like glyphs stamped on top of the camera image. Each
//! palette entry carries a small pixel-art bitmap so glyphs render without a
//! font rasterizer, scaled up to the configured glyph size.

use crate::compositor::Surface;
use crate::error::{Result, StickercamError};

/// Bitmap grid size (cells per side)
pub const GLYPH_GRID: usize = 12;

/// Immutable palette entry
#[derive(Debug, PartialEq, Eq)]
pub struct StickerDefinition {
    /// Stable identifier used on the command line and in config
    pub id: &'static str,
    /// Emoji this sticker stands for
    pub glyph: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Pixel-art rows, one char per cell (see [`cell_color`])
    pub bitmap: [&'static str; GLYPH_GRID],
}

/// The fixed sticker palette, loaded once
pub static PALETTE: [StickerDefinition; 4] = [
    StickerDefinition {
        id: "cool",
        glyph: "😎",
        name: "Smiling face with sunglasses",
        bitmap: [
            "....YYYY....",
            "..YYYYYYYY..",
            ".YYYYYYYYYY.",
            "YKKKKYYKKKKY",
            "YKKKKKKKKKKY",
            "YYKKKYYKKKYY",
            "YYYYYYYYYYYY",
            "YYYYYYYYYYYY",
            "YYKYYYYYYKYY",
            ".YYKKKKKKYY.",
            "..YYYYYYYY..",
            "....YYYY....",
        ],
    },
    StickerDefinition {
        id: "joy",
        glyph: "😂",
        name: "Face with tears of joy",
        bitmap: [
            "....YYYY....",
            "..YYYYYYYY..",
            ".YYYYYYYYYY.",
            "YYKKYYYYKKYY",
            "BYYYYYYYYYYB",
            "BBYYYYYYYYBB",
            "YBKKKKKKKKBY",
            "YYKWWWWWWKYY",
            "YYKRRRRRRKYY",
            ".YYKKKKKKYY.",
            "..YYYYYYYY..",
            "....YYYY....",
        ],
    },
    StickerDefinition {
        id: "heart",
        glyph: "❤️",
        name: "Red heart",
        bitmap: [
            "............",
            ".RRR....RRR.",
            "RRRRR..RRRRR",
            "RRRRRRRRRRRR",
            "RRRRRRRRRRRR",
            "RRRRRRRRRRRR",
            ".RRRRRRRRRR.",
            "..RRRRRRRR..",
            "...RRRRRR...",
            "....RRRR....",
            ".....RR.....",
            "............",
        ],
    },
    StickerDefinition {
        id: "mind-blown",
        glyph: "🤯",
        name: "Exploding head",
        bitmap: [
            ".O.R..O.R.O.",
            "..ORRORRO...",
            ".OORRRRROO..",
            "..YYYYYYYY..",
            ".YYYYYYYYYY.",
            "YYKKYYYYKKYY",
            "YYWKYYYYWKYY",
            "YYYYYYYYYYYY",
            "YYYYKKKKYYYY",
            ".YYYKKKKYYY.",
            "..YYYYYYYY..",
            "....YYYY....",
        ],
    },
];

/// Look up a sticker by id or by its emoji
pub fn find_sticker(key: &str) -> Result<&'static StickerDefinition> {
    let key = key.trim();
    PALETTE
        .iter()
        .find(|s| s.id.eq_ignore_ascii_case(key) || s.glyph == key)
        .ok_or_else(|| StickercamError::UnknownSticker(key.to_string()))
}

/// Color for one bitmap cell, `None` for transparent
fn cell_color(cell: u8) -> Option<[u8; 4]> {
    match cell {
        b'Y' => Some([255, 204, 51, 255]),
        b'K' => Some([40, 30, 20, 255]),
        b'W' => Some([255, 255, 255, 255]),
        b'R' => Some([221, 46, 68, 255]),
        b'B' => Some([93, 173, 236, 255]),
        b'O' => Some([244, 144, 12, 255]),
        _ => None,
    }
}

/// A sticker placed on the surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedOverlay {
    /// Palette entry
    pub sticker: &'static StickerDefinition,
    /// Surface x of the glyph's left edge
    pub x: f32,
    /// Surface y of the glyph's baseline (bottom edge)
    pub y: f32,
}

impl PlacedOverlay {
    /// Place a sticker at surface coordinates
    pub fn new(sticker: &'static StickerDefinition, x: f32, y: f32) -> Self {
        Self { sticker, x, y }
    }
}

/// Ordered collection of placed stickers; insertion order is draw order
#[derive(Debug, Clone, Default)]
pub struct OverlaySet {
    items: Vec<PlacedOverlay>,
}

impl OverlaySet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a placement; later placements draw on top
    pub fn push(&mut self, overlay: PlacedOverlay) {
        self.items.push(overlay);
    }

    /// Remove every placement
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of placements
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing has been placed
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Placements in draw order
    pub fn iter(&self) -> impl Iterator<Item = &PlacedOverlay> {
        self.items.iter()
    }

    /// Placements as a slice
    pub fn as_slice(&self) -> &[PlacedOverlay] {
        &self.items
    }
}

/// Stamp a sticker glyph onto the surface
///
/// The glyph occupies a `size` x `size` box whose bottom-left corner sits at
/// `(x, y)`, like text drawn on a baseline. Cells are scaled nearest-neighbor
/// and clipped to the surface; opaque cells overwrite, transparent cells
/// leave the surface untouched.
pub fn render_glyph(surface: &mut Surface, sticker: &StickerDefinition, x: f32, y: f32, size: u32) {
    if size == 0 {
        return;
    }

    let (width, height) = surface.dimensions();
    let left = x.floor() as i64;
    let top = y.floor() as i64 - size as i64;

    for dy in 0..size {
        let py = top + dy as i64;
        if py < 0 || py >= height as i64 {
            continue;
        }
        let row = sticker.bitmap[dy as usize * GLYPH_GRID / size as usize].as_bytes();

        for dx in 0..size {
            let px = left + dx as i64;
            if px < 0 || px >= width as i64 {
                continue;
            }
            let cell = row.get(dx as usize * GLYPH_GRID / size as usize).copied();
            if let Some(color) = cell.and_then(cell_color) {
                surface.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_bitmaps_are_square() {
        for sticker in &PALETTE {
            for (i, row) in sticker.bitmap.iter().enumerate() {
                assert_eq!(row.len(), GLYPH_GRID, "{} row {} has wrong width", sticker.id, i);
            }
            assert!(
                sticker.bitmap.iter().any(|r| r.bytes().any(|c| cell_color(c).is_some())),
                "{} has an empty bitmap",
                sticker.id
            );
        }
    }

    #[test]
    fn test_find_sticker() {
        assert_eq!(find_sticker("heart").unwrap().glyph, "❤️");
        assert_eq!(find_sticker("😎").unwrap().id, "cool");
        assert_eq!(find_sticker("MIND-BLOWN").unwrap().id, "mind-blown");
        assert!(matches!(
            find_sticker("unicorn"),
            Err(StickercamError::UnknownSticker(_))
        ));
    }

    #[test]
    fn test_overlay_set_keeps_order() {
        let mut set = OverlaySet::new();
        set.push(PlacedOverlay::new(&PALETTE[0], 1.0, 2.0));
        set.push(PlacedOverlay::new(&PALETTE[2], 3.0, 4.0));

        let ids: Vec<_> = set.iter().map(|o| o.sticker.id).collect();
        assert_eq!(ids, vec!["cool", "heart"]);

        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_render_glyph_baseline_anchor() {
        let mut surface = Surface::new(100, 100);
        let heart = find_sticker("heart").unwrap();
        render_glyph(&mut surface, heart, 10.0, 70.0, 60);

        // Heart center cell (row 5, col 6) maps to pixel (10 + 30, 10 + 25)
        assert_eq!(surface.get_pixel(40, 35), [221, 46, 68, 255]);
        // Top-left corner cell is transparent
        assert_eq!(surface.get_pixel(10, 10), [0, 0, 0, 0]);
        // Nothing below the baseline
        assert_eq!(surface.get_pixel(40, 71), [0, 0, 0, 0]);
    }

    #[test]
    fn test_render_glyph_clips_to_surface() {
        let mut surface = Surface::new(20, 20);
        let cool = find_sticker("cool").unwrap();
        // Mostly off the right/top edges; must not panic
        render_glyph(&mut surface, cool, 15.0, 5.0, 60);
        render_glyph(&mut surface, cool, -50.0, 80.0, 60);
    }
}
