//! Frame compositing
//!
//! Merges the current camera frame, the active filter and the placed
//! stickers into one fixed-size RGBA surface. The same surface is used for
//! still export and as one frame of a recording.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::trace;

use crate::config::CaptureConfig;
use crate::filter::{ColorTransform, FilterKind};
use crate::overlay::{render_glyph, OverlaySet};
use crate::types::Frame;

/// Fixed-size RGBA drawing surface
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    /// Create a transparent surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Width and height in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Reset every pixel to transparent black
    pub fn clear(&mut self) {
        self.image.fill(0);
    }

    /// Read one pixel
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// Overwrite one pixel
    pub fn put_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        self.image.put_pixel(x, y, Rgba(color));
    }

    /// Draw an image stretched over the whole surface through `transform`
    ///
    /// `src` must already match the surface dimensions.
    pub fn draw_image(&mut self, src: &RgbaImage, transform: &ColorTransform) {
        debug_assert_eq!(src.dimensions(), self.image.dimensions());

        if transform.is_identity() {
            self.image.copy_from_slice(src.as_raw());
            return;
        }

        for (dst, px) in self.image.pixels_mut().zip(src.pixels()) {
            *dst = Rgba(transform.apply_pixel(px.0));
        }
    }

    /// Borrow the underlying image
    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    /// Raw RGBA bytes
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Take the underlying image
    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// Stretch a frame to the given dimensions (aspect ratio is not kept)
pub fn scale_frame(frame: &Frame, width: u32, height: u32) -> Option<RgbaImage> {
    let image = frame.to_image()?;
    if image.dimensions() == (width, height) {
        return Some(image);
    }
    Some(imageops::resize(&image, width, height, FilterType::Triangle))
}

/// Renders frame + filter + stickers into a surface
#[derive(Debug, Clone)]
pub struct Compositor {
    width: u32,
    height: u32,
    glyph_size: u32,
}

impl Compositor {
    /// Create a compositor with explicit surface and glyph sizes
    pub fn new(width: u32, height: u32, glyph_size: u32) -> Self {
        Self {
            width,
            height,
            glyph_size,
        }
    }

    /// Create a compositor from the capture configuration
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(config.width, config.height, config.glyph_size)
    }

    /// Surface dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Glyph box size in pixels
    pub fn glyph_size(&self) -> u32 {
        self.glyph_size
    }

    /// Render into a fresh surface
    ///
    /// Returns `None` without rendering anything when no usable frame is
    /// available yet.
    pub fn render(
        &self,
        frame: Option<&Frame>,
        filter: FilterKind,
        overlays: &OverlaySet,
    ) -> Option<Surface> {
        let mut surface = Surface::new(self.width, self.height);
        self.render_into(&mut surface, frame, filter, overlays)
            .then_some(surface)
    }

    /// Render into an existing surface of the compositor's dimensions
    ///
    /// Order is fixed: clear, draw the frame through the filter transform,
    /// then stamp stickers with the identity transform so glyph colors are
    /// never filtered. Returns `false` and leaves `dst` untouched when the
    /// frame is missing or incomplete.
    pub fn render_into(
        &self,
        dst: &mut Surface,
        frame: Option<&Frame>,
        filter: FilterKind,
        overlays: &OverlaySet,
    ) -> bool {
        let Some(scaled) = frame.and_then(|f| scale_frame(f, self.width, self.height)) else {
            trace!("No frame available, skipping render");
            return false;
        };

        dst.clear();
        dst.draw_image(&scaled, &filter.transform());

        for overlay in overlays.iter() {
            render_glyph(dst, overlay.sticker, overlay.x, overlay.y, self.glyph_size);
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{find_sticker, PlacedOverlay};

    fn solid_frame(width: u32, height: u32, color: [u8; 4]) -> Frame {
        let data = color.repeat((width * height) as usize);
        Frame::from_rgba(width, height, data, 0)
    }

    #[test]
    fn test_render_without_frame() {
        let compositor = Compositor::new(32, 24, 8);
        assert!(compositor.render(None, FilterKind::None, &OverlaySet::new()).is_none());
    }

    #[test]
    fn test_render_into_leaves_surface_on_missing_frame() {
        let compositor = Compositor::new(4, 4, 2);
        let mut surface = Surface::new(4, 4);
        surface.put_pixel(0, 0, [1, 2, 3, 4]);

        let incomplete = Frame::from_rgba(4, 4, vec![0; 3], 0);
        assert!(!compositor.render_into(&mut surface, Some(&incomplete), FilterKind::None, &OverlaySet::new()));
        assert_eq!(surface.get_pixel(0, 0), [1, 2, 3, 4]);
    }

    #[test]
    fn test_frame_is_stretched() {
        let compositor = Compositor::new(64, 16, 8);
        let frame = solid_frame(8, 8, [10, 20, 30, 255]);
        let surface = compositor
            .render(Some(&frame), FilterKind::None, &OverlaySet::new())
            .unwrap();

        assert_eq!(surface.dimensions(), (64, 16));
        assert_eq!(surface.get_pixel(63, 15), [10, 20, 30, 255]);
    }

    #[test]
    fn test_filter_does_not_touch_glyphs() {
        let compositor = Compositor::new(48, 48, 24);
        let frame = solid_frame(48, 48, [0, 0, 0, 255]);
        let mut overlays = OverlaySet::new();
        overlays.push(PlacedOverlay::new(find_sticker("heart").unwrap(), 0.0, 24.0));

        let surface = compositor
            .render(Some(&frame), FilterKind::Invert, &overlays)
            .unwrap();

        // Background inverted to white, heart keeps its red
        assert_eq!(surface.get_pixel(47, 47), [255, 255, 255, 255]);
        assert_eq!(surface.get_pixel(12, 10), [221, 46, 68, 255]);
    }
}
