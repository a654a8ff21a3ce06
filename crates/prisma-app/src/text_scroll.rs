//! Scrolling text backdrop.
//!
//! A fixed ring of text lines drifts vertically across a CPU raster surface;
//! the line that drifts out of range is relocated to the far end of the ring,
//! so a handful of lines reads as an infinite scroll. The surface uploads as
//! a texture the composite pass samples as the backdrop.

use winit::dpi::PhysicalSize;

use prisma_engine::text::{RasterCanvas, TextFont};

/// A line leaves the visible range entirely once its position drops below
/// this threshold (negative scroll direction).
pub const EXIT_THRESHOLD: f32 = -300.0;

/// Scroll configuration.
#[derive(Debug, Clone)]
pub struct ScrollConfig {
    pub font_size: f32,
    pub padding: f32,
    /// Scroll speed in pixels per second. Must stay well below
    /// `font_size + padding` per tick for the single-relocation invariant.
    pub speed: f32,
    /// +1.0 or -1.0.
    pub direction: f32,
    pub even_text: String,
    pub odd_text: String,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            font_size: 280.0,
            padding: 10.0,
            speed: 120.0,
            direction: -1.0,
            even_text: "SOME".to_string(),
            odd_text: "THING".to_string(),
        }
    }
}

/// One line of the ring: fixed content, mutable vertical position.
#[derive(Debug, Clone)]
pub struct TextLine {
    pub text: String,
    pub y: f32,
}

/// The position ring. Pure state — no GPU resources — so the wrap invariants
/// are testable directly.
#[derive(Debug, Clone)]
pub struct LineRing {
    lines: Vec<TextLine>,
    line_height: f32,
    speed: f32,
    direction: f32,
    viewport_h: f32,
}

/// Lines needed to cover `viewport_h` plus two overscan lines, rounded up to
/// an even count so parity-alternating content stays alternating after any
/// number of wraps.
pub fn line_count(viewport_h: f32, font_size: f32) -> usize {
    let mut n = (viewport_h / font_size).ceil() as usize + 2;
    if n % 2 == 1 {
        n += 1;
    }
    n
}

impl LineRing {
    pub fn new(viewport_h: f32, config: &ScrollConfig) -> Self {
        let line_height = config.font_size + config.padding;
        let lines = (0..line_count(viewport_h, config.font_size))
            .map(|i| TextLine {
                text: if i % 2 == 0 {
                    config.even_text.clone()
                } else {
                    config.odd_text.clone()
                },
                y: i as f32 * line_height,
            })
            .collect();

        Self {
            lines,
            line_height,
            speed: config.speed,
            direction: config.direction,
            viewport_h,
        }
    }

    pub fn lines(&self) -> &[TextLine] {
        &self.lines
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Translates every line by the per-tick delta, then applies the wrap
    /// step.
    pub fn advance(&mut self, dt: f32) {
        let delta = self.speed * self.direction * dt;
        for line in &mut self.lines {
            line.y += delta;
        }
        self.wrap();
    }

    /// The ring-buffer step, expressed through positions rather than index
    /// rotation.
    ///
    /// "First" and "last" are defined by position values at this instant,
    /// found by an explicit O(N) scan (N is on the order of viewport height
    /// over font size). Because per-tick movement is bounded well below the
    /// line spacing, at most one line can be out of range per tick.
    fn wrap(&mut self) {
        if self.lines.is_empty() {
            return;
        }

        let mut first = 0;
        let mut last = 0;
        for i in 1..self.lines.len() {
            if self.lines[i].y < self.lines[first].y {
                first = i;
            }
            if self.lines[i].y > self.lines[last].y {
                last = i;
            }
        }

        if self.direction < 0.0 {
            if self.lines[first].y < EXIT_THRESHOLD {
                self.lines[first].y = self.lines[last].y + self.line_height;
            }
        } else if self.lines[last].y > self.viewport_h + self.line_height {
            self.lines[last].y = self.lines[first].y - self.line_height;
        }
    }

    #[cfg(test)]
    fn positions(&self) -> Vec<f32> {
        self.lines.iter().map(|l| l.y).collect()
    }

    #[cfg(test)]
    fn with_positions(
        ys: &[f32],
        line_height: f32,
        speed: f32,
        direction: f32,
        viewport_h: f32,
    ) -> Self {
        Self {
            lines: ys
                .iter()
                .map(|&y| TextLine {
                    text: String::new(),
                    y,
                })
                .collect(),
            line_height,
            speed,
            direction,
            viewport_h,
        }
    }
}

/// The scrolling layer: ring + raster surface + font.
pub struct TextScroll {
    ring: LineRing,
    canvas: RasterCanvas,
    font: TextFont,
    config: ScrollConfig,
}

const BACKGROUND_SHADE: u8 = 0xff;

impl TextScroll {
    pub fn new(
        device: &wgpu::Device,
        font: TextFont,
        size: PhysicalSize<u32>,
        config: ScrollConfig,
    ) -> Self {
        Self {
            ring: LineRing::new(size.height as f32, &config),
            canvas: RasterCanvas::new(device, size),
            font,
            config,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.ring.advance(dt);
    }

    /// Redraws every line at its current position and uploads the surface.
    pub fn draw(&mut self, queue: &wgpu::Queue) {
        self.canvas.clear(BACKGROUND_SHADE);
        let center_x = self.canvas.width() as f32 * 0.5;
        for line in self.ring.lines() {
            self.canvas
                .fill_text(&self.font, &line.text, center_x, line.y, self.config.font_size);
        }
        self.canvas.upload(queue);
    }

    /// Rebuilds the surface and the ring for a new viewport.
    pub fn resize(&mut self, device: &wgpu::Device, new_size: PhysicalSize<u32>) {
        self.canvas = RasterCanvas::new(device, new_size);
        self.ring = LineRing::new(new_size.height as f32, &self.config);
    }

    pub fn view(&self) -> &wgpu::TextureView {
        self.canvas.view()
    }

    pub fn line_count(&self) -> usize {
        self.ring.lines().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScrollConfig {
        ScrollConfig::default()
    }

    fn ring(viewport_h: f32) -> LineRing {
        LineRing::new(viewport_h, &config())
    }

    #[test]
    fn line_count_covers_viewport_plus_overscan_and_is_even() {
        assert_eq!(line_count(720.0, 280.0), 6);
        assert_eq!(line_count(1080.0, 280.0), 6);
        assert_eq!(line_count(1200.0, 280.0), 8);
        for h in [0.0, 300.0, 720.0, 1080.0, 2160.0] {
            assert_eq!(line_count(h, 280.0) % 2, 0);
        }
    }

    #[test]
    fn ring_membership_is_constant_and_positions_stay_distinct() {
        let mut ring = ring(720.0);
        let n = ring.lines().len();

        for _ in 0..10_000 {
            ring.advance(1.0 / 60.0);
            assert_eq!(ring.lines().len(), n);

            let mut ys = ring.positions();
            ys.sort_by(|a, b| a.partial_cmp(b).unwrap());
            for pair in ys.windows(2) {
                assert!(pair[0] < pair[1], "positions collided: {pair:?}");
            }
        }
    }

    #[test]
    fn advance_is_a_uniform_translation_away_from_the_wrap_boundary() {
        let mut ring = ring(720.0);
        let before = ring.positions();

        ring.advance(1.0 / 60.0);
        let delta = config().speed * config().direction / 60.0;

        for (y_before, line) in before.iter().zip(ring.lines()) {
            assert!((line.y - (y_before + delta)).abs() < 1e-4);
        }
    }

    #[test]
    fn spacing_lattice_survives_wraps() {
        // Differences between line positions stay integer multiples of the
        // line height no matter how many relocations have fired.
        let mut ring = ring(720.0);
        let lh = ring.line_height();

        for _ in 0..5_000 {
            ring.advance(1.0 / 60.0);
        }
        let ys = ring.positions();
        for a in &ys {
            for b in &ys {
                let steps = (a - b) / lh;
                assert!((steps - steps.round()).abs() < 5e-3, "off-lattice: {a} {b}");
            }
        }
    }

    #[test]
    fn boundary_example_relocates_to_last_plus_line_height() {
        // A line one pixel past the exit threshold, line height 290, last
        // line at 1000: the wrap relocates that same line to 1290 and leaves
        // every other line at its translated position.
        let mut ring =
            LineRing::with_positions(&[-301.0, 0.0, 290.0, 580.0, 870.0, 1000.0], 290.0, 0.0, -1.0, 720.0);

        ring.advance(1.0);

        let ys = ring.positions();
        assert_eq!(ys[0], 1290.0);
        assert_eq!(&ys[1..], &[0.0, 290.0, 580.0, 870.0, 1000.0]);
    }

    #[test]
    fn negative_direction_relocates_the_first_line_past_the_last() {
        // Drive the ring until the minimum line crosses the exit threshold,
        // then check the relocation lands exactly one line height past the
        // maximum while every other line moved only by the uniform delta.
        let mut ring = ring(720.0);
        let lh = ring.line_height();
        let dt = 1.0 / 60.0;
        let delta = config().speed * config().direction * dt;

        for _ in 0..20_000 {
            let before = ring.positions();
            let min_before = before.iter().cloned().fold(f32::MAX, f32::min);
            let max_before = before.iter().cloned().fold(f32::MIN, f32::max);
            let will_wrap = min_before + delta < EXIT_THRESHOLD;

            ring.advance(dt);

            if !will_wrap {
                continue;
            }

            let mut wrapped = 0;
            for (y_before, line) in before.iter().zip(ring.lines()) {
                let translated = y_before + delta;
                if (line.y - translated).abs() < 1e-4 {
                    continue;
                }
                // The one relocated line: from the minimum to one spacing
                // past the (translated) maximum.
                wrapped += 1;
                assert!((translated - (min_before + delta)).abs() < 1e-4);
                assert!((line.y - (max_before + delta + lh)).abs() < 1e-3);
            }
            assert_eq!(wrapped, 1, "exactly one relocation per tick");
            return;
        }
        panic!("ring never reached the wrap boundary");
    }

    #[test]
    fn positive_direction_relocates_the_last_line_before_the_first() {
        let mut cfg = config();
        cfg.direction = 1.0;
        let mut ring = LineRing::new(720.0, &cfg);
        let lh = ring.line_height();
        let dt = 1.0 / 60.0;
        let delta = cfg.speed * dt;

        let mut wraps = 0;
        for tick in 0..5_000 {
            let before = ring.positions();
            let min_before = before.iter().cloned().fold(f32::MAX, f32::min);
            let max_before = before.iter().cloned().fold(f32::MIN, f32::max);

            ring.advance(dt);

            let after = ring.positions();
            let min_after = after.iter().cloned().fold(f32::MAX, f32::min);
            let max_after = after.iter().cloned().fold(f32::MIN, f32::max);

            if max_after < max_before {
                // A relocation fired: the old maximum became the new
                // minimum, one spacing before the old (translated) minimum.
                wraps += 1;
                assert!((min_after - (min_before + delta - lh)).abs() < 1e-2);
            }

            // Once the initial overhang has drained, the maximum hovers at
            // the wrap boundary.
            if tick > 1_000 {
                assert!(max_after <= 720.0 + lh + delta + 1e-2);
            }
        }
        assert!(wraps > 0);
    }

    #[test]
    fn content_alternates_by_line_parity() {
        let ring = ring(720.0);
        for (i, line) in ring.lines().iter().enumerate() {
            let expected = if i % 2 == 0 { "SOME" } else { "THING" };
            assert_eq!(line.text, expected);
        }
    }
}
