use crate::model::ViewGeometry;
use std::f32::consts::TAU;

const AMPLITUDE: f32 = 0.8;
const WAVE_ONE_FREQ: f32 = 0.5;
const WAVE_TWO_FREQ: f32 = 0.7;
const WAVE_TWO_SWING_INSET: f32 = 5.0;
const WAVE_TWO_PHASE_SHIFT: f32 = 5.0;

/// Which rim of the disc the wave surface hugs.
///
/// Below the midline the wave is clamped so it never rises above the upper
/// rim; from the midline on it is clamped so it never sinks below the lower
/// rim. Either way the fill runs down to the lower rim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Regime {
    UnderHalf,
    OverHalf,
}

impl Regime {
    pub(crate) fn select(water_level: f32, radius: f32) -> Self {
        if water_level < radius {
            Regime::UnderHalf
        } else {
            Regime::OverHalf
        }
    }

    /// Rim height for a column `dx` pixels from the disc centre.
    pub(crate) fn rim(self, radius: f32, dx: f32) -> f32 {
        let half_chord = (radius * radius - dx * dx).max(0.0).sqrt();
        match self {
            Regime::UnderHalf => radius - half_chord,
            Regime::OverHalf => radius + half_chord,
        }
    }

    fn clamp(self, rim: f32, wave: f32) -> f32 {
        match self {
            Regime::UnderHalf => rim.max(wave),
            Regime::OverHalf => rim.min(wave),
        }
    }

    /// Lower rim the fill extends down to, given the sampled rim.
    pub(crate) fn fill_boundary(self, radius: f32, circle_y: f32) -> f32 {
        match self {
            Regime::UnderHalf => 2.0 * radius - circle_y,
            Regime::OverHalf => circle_y,
        }
    }
}

/// Per-column heights in disc-local coordinates (y grows downward).
/// `circle_y` is NaN for columns that fall outside the disc.
#[derive(Clone, Debug, Default)]
pub(crate) struct SampleBuffers {
    pub(crate) circle_y: Vec<f32>,
    pub(crate) wave_one_y: Vec<f32>,
    pub(crate) wave_two_y: Vec<f32>,
}

impl SampleBuffers {
    pub(crate) fn len(&self) -> usize {
        self.circle_y.len()
    }

    fn resize(&mut self, n: usize) {
        self.circle_y.clear();
        self.circle_y.resize(n, f32::NAN);
        self.wave_one_y.clear();
        self.wave_one_y.resize(n, 0.0);
        self.wave_two_y.clear();
        self.wave_two_y.resize(n, 0.0);
    }
}

#[derive(Debug, Default)]
pub(crate) struct WaveSampler {
    radius: f32,
    period: f32,
    swing: f32,
    buffers: SampleBuffers,
}

impl WaveSampler {
    pub(crate) fn new(geometry: &ViewGeometry) -> Self {
        let mut sampler = Self::default();
        sampler.resize(geometry);
        sampler
    }

    pub(crate) fn resize(&mut self, geometry: &ViewGeometry) {
        self.radius = geometry.radius.max(0.0);
        self.period = if self.radius > 0.0 {
            TAU / self.radius
        } else {
            0.0
        };
        self.swing = self.radius / 10.0;
        self.buffers.resize(geometry.columns());
    }

    pub(crate) fn sample(&mut self, water_level: f32, phase: f32) -> &SampleBuffers {
        let radius = self.radius;
        let center = radius.trunc();
        let r2 = radius * radius;
        let regime = Regime::select(water_level, radius);
        let amp_one = AMPLITUDE * self.swing;
        let amp_two = AMPLITUDE * (self.swing - WAVE_TWO_SWING_INSET);

        let b = &mut self.buffers;
        for i in 0..b.circle_y.len() {
            let x = i as f32;
            let one = water_level + amp_one * (self.period * x * WAVE_ONE_FREQ + phase).sin();
            let two = water_level
                + amp_two * (self.period * x * WAVE_TWO_FREQ + phase + WAVE_TWO_PHASE_SHIFT).sin();

            let dx = x - center;
            if dx * dx > r2 {
                b.circle_y[i] = f32::NAN;
                b.wave_one_y[i] = one;
                b.wave_two_y[i] = two;
                continue;
            }

            let rim = regime.rim(radius, dx);
            b.circle_y[i] = rim;
            b.wave_one_y[i] = regime.clamp(rim, one);
            b.wave_two_y[i] = regime.clamp(rim, two);
        }
        &self.buffers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sampler(size: u32) -> WaveSampler {
        WaveSampler::new(&ViewGeometry::new(size, size))
    }

    #[test]
    fn centre_column_under_half_sits_on_top_rim() {
        let mut s = sampler(200);
        let b = s.sample(60.0, 0.0);
        assert_eq!(b.len(), 200);
        assert_eq!(b.circle_y[100], 0.0);
        assert!(b.wave_one_y[100] >= b.circle_y[100]);
    }

    #[test]
    fn centre_column_at_full_switches_to_bottom_rim() {
        let mut s = sampler(200);
        let b = s.sample(100.0, 0.0);
        assert_eq!(b.circle_y[100], 200.0);
        assert!(b.wave_one_y[100] <= 200.0);
        assert!(b.wave_two_y[100] <= 200.0);
    }

    #[rstest]
    #[case(200, 0.0)]
    #[case(200, 37.5)]
    #[case(200, 100.0)]
    #[case(57, 10.0)]
    #[case(57, 28.5)]
    #[case(8, 1.0)]
    fn rim_stays_inside_the_disc_box(#[case] size: u32, #[case] level: f32) {
        let mut s = sampler(size);
        let r = size as f32 / 2.0;
        for phase in [0.0, 1.3, 4.0] {
            let b = s.sample(level, phase);
            for (i, y) in b.circle_y.iter().enumerate() {
                assert!(!y.is_nan(), "column {i} unexpectedly outside");
                assert!((0.0..=2.0 * r).contains(y), "column {i}: {y}");
            }
        }
    }

    #[test]
    fn waves_are_clamped_to_the_active_rim() {
        let mut s = sampler(120);
        let b = s.sample(5.0, 2.0).clone();
        for i in 0..b.len() {
            assert!(b.wave_one_y[i] >= b.circle_y[i]);
            assert!(b.wave_two_y[i] >= b.circle_y[i]);
        }
        let b = s.sample(60.0, 2.0);
        for i in 0..b.len() {
            assert!(b.wave_one_y[i] <= b.circle_y[i]);
            assert!(b.wave_two_y[i] <= b.circle_y[i]);
        }
    }

    #[test]
    fn fill_boundary_is_continuous_across_the_midline() {
        let r = 100.0;
        for dx in [-100.0, -63.0, -1.0, 0.0, 12.0, 99.0] {
            let under = Regime::UnderHalf;
            let over = Regime::OverHalf;
            let a = under.fill_boundary(r, under.rim(r, dx));
            let b = over.fill_boundary(r, over.rim(r, dx));
            assert!((a - b).abs() < 1e-4, "dx {dx}: {a} vs {b}");
        }
    }

    #[test]
    fn unclamped_waves_follow_the_sine_formula() {
        let mut s = sampler(200);
        let phase = 0.4;
        let b = s.sample(50.0, phase);
        // The top rim is at 0 in the centre column, far above both waves.
        let period = TAU / 100.0;
        let one = 50.0 + 0.8 * 10.0 * (period * 100.0 * 0.5 + phase).sin();
        let two = 50.0 + 0.8 * 5.0 * (period * 100.0 * 0.7 + phase + 5.0).sin();
        assert!((b.wave_one_y[100] - one).abs() < 1e-3);
        assert!((b.wave_two_y[100] - two).abs() < 1e-3);
        // At the left edge the rim sits on the midline and wins the clamp.
        assert_eq!(b.circle_y[0], 100.0);
        assert_eq!(b.wave_one_y[0], 100.0);
    }

    #[test]
    fn zero_radius_yields_empty_buffers() {
        let mut s = WaveSampler::new(&ViewGeometry::new(0, 40));
        assert_eq!(s.sample(0.0, 1.0).len(), 0);
    }

    #[test]
    fn resize_reallocates_buffers() {
        let mut s = sampler(200);
        s.resize(&ViewGeometry::new(90, 300));
        let b = s.sample(10.0, 0.0);
        assert_eq!(b.len(), 90);
        assert_eq!(b.wave_one_y.len(), 90);
    }
}
