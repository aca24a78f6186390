use crate::model::{ProgressState, ViewGeometry};
use crate::wave::{Regime, SampleBuffers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

pub(crate) const BACKGROUND: Rgb = Rgb::new(206, 214, 222);
pub(crate) const FILL: Rgb = Rgb::new(30, 144, 230);

pub(crate) const WAVE_ONE_ALPHA: u8 = 80;
pub(crate) const WAVE_TWO_ALPHA: u8 = 100;

/// Colour and opacity for a single draw call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DrawStyle {
    pub(crate) color: Rgb,
    pub(crate) alpha: u8,
}

impl DrawStyle {
    pub(crate) const fn opaque(color: Rgb) -> Self {
        Self { color, alpha: 255 }
    }

    pub(crate) const fn translucent(color: Rgb, alpha: u8) -> Self {
        Self { color, alpha }
    }
}

/// Something the ripple can be painted onto, in pixel coordinates.
pub(crate) trait Surface {
    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, style: DrawStyle);

    /// Paints column `x` from `y_top` down to `y_bottom`.
    fn vertical_line(&mut self, x: f32, y_top: f32, y_bottom: f32, style: DrawStyle);
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct RippleRenderer {
    background: DrawStyle,
    wave_one: DrawStyle,
    wave_two: DrawStyle,
}

impl Default for RippleRenderer {
    fn default() -> Self {
        Self {
            background: DrawStyle::opaque(BACKGROUND),
            wave_one: DrawStyle::translucent(FILL, WAVE_ONE_ALPHA),
            wave_two: DrawStyle::translucent(FILL, WAVE_TWO_ALPHA),
        }
    }
}

impl RippleRenderer {
    /// Paints the disc and both wave layers. `buffers` must have been sampled
    /// for `geometry` and `progress` in the same frame.
    pub(crate) fn render<S: Surface>(
        &self,
        surface: &mut S,
        geometry: &ViewGeometry,
        progress: &ProgressState,
        buffers: &SampleBuffers,
    ) {
        let radius = geometry.radius;
        if radius <= 0.0 {
            return;
        }

        let (cx, cy) = geometry.center();
        surface.fill_circle(cx, cy, radius, self.background);

        let (ox, oy) = geometry.origin();
        let regime = Regime::select(progress.water_level, radius);
        for i in 0..buffers.len() {
            let circle_y = buffers.circle_y[i];
            if circle_y.is_nan() {
                continue;
            }
            let bottom = regime.fill_boundary(radius, circle_y);
            // upper rim of this column
            let top_rim = 2.0 * radius - bottom;
            let x = ox + i as f32;

            for (wave_y, style) in [
                (buffers.wave_one_y[i], self.wave_one),
                (buffers.wave_two_y[i], self.wave_two),
            ] {
                let top = wave_y.max(top_rim);
                if top < bottom {
                    surface.vertical_line(x, oy + top, oy + bottom, style);
                }
            }
        }
    }
}
