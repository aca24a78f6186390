use std::f32::consts::TAU;

pub(crate) const PROGRESS_MAX: f32 = 100.0;

/// Pixel size of the drawable surface and the disc inscribed in it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ViewGeometry {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) radius: f32,
}

impl ViewGeometry {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            radius: width.min(height) as f32 / 2.0,
        }
    }

    pub(crate) fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    /// Top-left corner of the disc's bounding square. Sample buffers are
    /// expressed relative to this point.
    pub(crate) fn origin(&self) -> (f32, f32) {
        let (cx, cy) = self.center();
        (cx - self.radius, cy - self.radius)
    }

    /// Number of sampled pixel columns across the disc.
    pub(crate) fn columns(&self) -> usize {
        (2.0 * self.radius).ceil().max(0.0) as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ProgressState {
    pub(crate) progress: f32,
    pub(crate) water_level: f32,
}

impl ProgressState {
    pub(crate) fn new(progress: f32, radius: f32) -> Self {
        let mut st = Self {
            progress: 0.0,
            water_level: 0.0,
        };
        st.set(progress, radius);
        st
    }

    pub(crate) fn set(&mut self, value: f32, radius: f32) {
        self.progress = clamp_progress(value);
        self.rederive(radius);
    }

    /// Water level always follows progress and the current radius.
    pub(crate) fn rederive(&mut self, radius: f32) {
        self.water_level = if self.progress >= PROGRESS_MAX {
            radius
        } else {
            radius * self.progress / PROGRESS_MAX
        };
    }
}

pub(crate) fn clamp_progress(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, PROGRESS_MAX)
}

/// Horizontal wave offset. The continuous ripple owns `ripple`; drop/rise
/// bursts accumulate into `burst`. Both stay in `[0, 2π)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct WaveState {
    pub(crate) ripple: f32,
    pub(crate) burst: f32,
}

impl WaveState {
    pub(crate) fn phase(&self) -> f32 {
        (self.ripple + self.burst).rem_euclid(TAU)
    }

    pub(crate) fn add_burst(&mut self, delta: f32) {
        self.burst = (self.burst + delta).rem_euclid(TAU);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(200, 200, 100.0)]
    #[case(300, 120, 60.0)]
    #[case(41, 90, 20.5)]
    #[case(0, 50, 0.0)]
    fn radius_is_half_the_short_side(#[case] w: u32, #[case] h: u32, #[case] radius: f32) {
        let g = ViewGeometry::new(w, h);
        assert_eq!(g.radius, radius);
        assert_eq!(g.columns(), w.min(h) as usize);
    }

    #[test]
    fn origin_centres_the_disc_on_wide_surfaces() {
        let g = ViewGeometry::new(300, 120);
        assert_eq!(g.origin(), (90.0, 0.0));
    }

    #[rstest]
    #[case(60.0, 60.0)]
    #[case(0.0, 0.0)]
    #[case(100.0, 100.0)]
    #[case(250.0, 100.0)]
    #[case(-12.0, 0.0)]
    #[case(f32::NAN, 0.0)]
    fn water_level_follows_clamped_progress(#[case] input: f32, #[case] level: f32) {
        let st = ProgressState::new(input, 100.0);
        assert!((st.water_level - level).abs() < 1e-4, "{input} -> {}", st.water_level);
        assert!((0.0..=PROGRESS_MAX).contains(&st.progress));
    }

    #[test]
    fn rederive_tracks_new_radius() {
        let mut st = ProgressState::new(50.0, 100.0);
        st.rederive(40.0);
        assert_eq!(st.water_level, 20.0);
    }

    #[test]
    fn phase_wraps_sum_of_ripple_and_burst() {
        let mut w = WaveState {
            ripple: 5.0,
            burst: 0.0,
        };
        w.add_burst(3.0 * TAU + 2.0);
        assert!((w.burst - 2.0).abs() < 1e-4);
        assert!((w.phase() - (7.0 - TAU)).abs() < 1e-4);
    }
}
