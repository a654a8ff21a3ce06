use std::collections::HashMap;

use anyhow::{Context, Result};
use fontdue::layout::{CoordinateSystem, GlyphRasterConfig, Layout, LayoutSettings, TextStyle};
use winit::dpi::PhysicalSize;

/// Candidate paths for a usable sans-serif, checked in order.
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
];

/// A parsed font usable by [`RasterCanvas::fill_text`].
pub struct TextFont {
    font: fontdue::Font,
}

impl TextFont {
    /// Parses a TrueType or OpenType font from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| anyhow::anyhow!("font parse error: {e}"))?;
        Ok(Self { font })
    }

    /// Loads the first available system font from a fixed candidate list.
    pub fn from_system() -> Result<Self> {
        let bytes = SYSTEM_FONT_PATHS
            .iter()
            .find_map(|p| std::fs::read(p).ok())
            .context("no usable system font found")?;
        Self::from_bytes(&bytes)
    }
}

/// A CPU raster surface backing a texture.
///
/// Single-channel (R8): the backdrop is monochrome ink on a flat background.
/// Drawing mutates the CPU buffer; [`RasterCanvas::upload`] copies it to the
/// GPU texture, which is the "mark for re-upload" step of the draw cycle.
pub struct RasterCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,

    texture: wgpu::Texture,
    view: wgpu::TextureView,

    glyph_cache: HashMap<GlyphRasterConfig, (fontdue::Metrics, Vec<u8>)>,
    layout: Layout<()>,
}

impl RasterCanvas {
    /// Creates a canvas sized to the viewport (clamped to at least 1x1).
    pub fn new(device: &wgpu::Device, size: PhysicalSize<u32>) -> Self {
        let width = size.width.max(1);
        let height = size.height.max(1);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("prisma raster canvas"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            width,
            height,
            pixels: vec![0; (width * height) as usize],
            texture,
            view,
            glyph_cache: HashMap::new(),
            layout: Layout::new(CoordinateSystem::PositiveYDown),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Fills the whole surface with `shade`.
    pub fn clear(&mut self, shade: u8) {
        self.pixels.fill(shade);
    }

    /// Draws `text` centered horizontally on `center_x` with the vertical
    /// midline on `center_y` (center alignment, middle baseline), in ink that
    /// darkens the background.
    ///
    /// Lines far outside the surface simply clip away; the scroll ring keeps
    /// two overscan lines beyond the viewport at all times.
    pub fn fill_text(&mut self, font: &TextFont, text: &str, center_x: f32, center_y: f32, px: f32) {
        self.layout.reset(&LayoutSettings::default());
        self.layout
            .append(&[&font.font], &TextStyle::new(text, px, 0));

        // Snapshot placements so the borrow on `self.layout` ends before the
        // cache (which needs `&mut self`) is touched.
        let placements: Vec<(GlyphRasterConfig, f32, f32, usize, usize)> = self
            .layout
            .glyphs()
            .iter()
            .filter(|g| g.char_data.rasterize() && g.width > 0 && g.height > 0)
            .map(|g| (g.key, g.x, g.y, g.width, g.height))
            .collect();

        if placements.is_empty() {
            return;
        }

        let min_x = placements.iter().map(|p| p.1).fold(f32::MAX, f32::min);
        let max_x = placements
            .iter()
            .map(|p| p.1 + p.3 as f32)
            .fold(f32::MIN, f32::max);
        let min_y = placements.iter().map(|p| p.2).fold(f32::MAX, f32::min);
        let max_y = placements
            .iter()
            .map(|p| p.2 + p.4 as f32)
            .fold(f32::MIN, f32::max);

        let offset_x = center_x - (min_x + max_x) * 0.5;
        let offset_y = center_y - (min_y + max_y) * 0.5;

        for (key, gx, gy, gw, gh) in placements {
            if !self.glyph_cache.contains_key(&key) {
                let rasterized = font.font.rasterize_config(key);
                self.glyph_cache.insert(key, rasterized);
            }
            let Some((_, bitmap)) = self.glyph_cache.get(&key) else {
                continue;
            };

            blit_ink(
                &mut self.pixels,
                self.width,
                self.height,
                (gx + offset_x).round() as i64,
                (gy + offset_y).round() as i64,
                bitmap,
                gw,
                gh,
            );
        }
    }

    /// Copies the CPU buffer to the backing texture.
    pub fn upload(&self, queue: &wgpu::Queue) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &self.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

/// Subtractively blends a coverage bitmap into `dst` at (`x`, `y`), clipping
/// to the destination bounds. Saturates at black.
#[allow(clippy::too_many_arguments)]
fn blit_ink(
    dst: &mut [u8],
    dst_w: u32,
    dst_h: u32,
    x: i64,
    y: i64,
    coverage: &[u8],
    src_w: usize,
    src_h: usize,
) {
    for row in 0..src_h as i64 {
        let dy = y + row;
        if dy < 0 || dy >= dst_h as i64 {
            continue;
        }
        for col in 0..src_w as i64 {
            let dx = x + col;
            if dx < 0 || dx >= dst_w as i64 {
                continue;
            }
            let s = coverage[(row * src_w as i64 + col) as usize];
            let d = &mut dst[(dy * dst_w as i64 + dx) as usize];
            *d = d.saturating_sub(s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blit_subtracts_and_saturates() {
        let mut dst = vec![200u8; 4 * 4];
        let coverage = vec![255u8; 2 * 2];
        blit_ink(&mut dst, 4, 4, 1, 1, &coverage, 2, 2);

        assert_eq!(dst[0], 200); // untouched corner
        assert_eq!(dst[4 * 1 + 1], 0); // fully inked, saturated at black
        assert_eq!(dst[4 * 2 + 2], 0);
        assert_eq!(dst[4 * 3 + 3], 200);
    }

    #[test]
    fn blit_clips_outside_destination() {
        let mut dst = vec![255u8; 4 * 4];
        let coverage = vec![255u8; 3 * 3];

        // Overlapping the top-left corner: only the in-bounds quadrant lands.
        blit_ink(&mut dst, 4, 4, -2, -2, &coverage, 3, 3);
        assert_eq!(dst[0], 0);
        assert_eq!(dst[1], 255);
        assert_eq!(dst[4], 255);

        // Entirely off the bottom-right: nothing lands, nothing panics.
        let before = dst.clone();
        blit_ink(&mut dst, 4, 4, 10, 10, &coverage, 3, 3);
        assert_eq!(dst, before);
    }
}
