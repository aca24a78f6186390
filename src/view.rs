use crate::anim::{AnimationDriver, SessionPhase};
use crate::model::{ProgressState, ViewGeometry, WaveState};
use crate::ripple::{RippleRenderer, Surface};
use crate::wave::WaveSampler;
use std::time::Duration;
use tracing::{debug, info};

/// A liquid progress disc: progress and wave state, the animations that
/// move them, and the buffers used to paint them.
pub(crate) struct LiquidView {
    geometry: ViewGeometry,
    progress: ProgressState,
    wave: WaveState,
    sampler: WaveSampler,
    renderer: RippleRenderer,
    driver: AnimationDriver,
    redraw_requested: bool,
}

impl LiquidView {
    pub(crate) fn new(width: u32, height: u32, progress: f32) -> Self {
        let geometry = ViewGeometry::new(width, height);
        Self {
            geometry,
            progress: ProgressState::new(progress, geometry.radius),
            wave: WaveState::default(),
            sampler: WaveSampler::new(&geometry),
            renderer: RippleRenderer::default(),
            driver: AnimationDriver::default(),
            redraw_requested: true,
        }
    }

    pub(crate) fn geometry(&self) -> &ViewGeometry {
        &self.geometry
    }

    pub(crate) fn progress(&self) -> f32 {
        self.progress.progress
    }

    pub(crate) fn water_level(&self) -> f32 {
        self.progress.water_level
    }

    pub(crate) fn phase(&self) -> f32 {
        self.wave.phase()
    }

    pub(crate) fn is_animating(&self) -> bool {
        self.driver.is_rippling()
    }

    pub(crate) fn session_phase(&self) -> Option<SessionPhase> {
        self.driver.session().map(|s| s.phase())
    }

    /// Applies a new surface size. Must not be called between sampling and
    /// painting a frame; `draw` does both in one call.
    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        if width == self.geometry.width && height == self.geometry.height {
            return;
        }
        self.geometry = ViewGeometry::new(width, height);
        self.sampler.resize(&self.geometry);
        self.progress.rederive(self.geometry.radius);
        debug!(width, height, radius = self.geometry.radius, "surface resized");
        self.redraw_requested = true;
    }

    /// Clamps `value` to 0..=100.
    pub(crate) fn set_progress(&mut self, value: f32) {
        self.progress.set(value, self.geometry.radius);
        self.redraw_requested = true;
    }

    pub(crate) fn start_animation(&mut self) {
        self.driver.start_ripple();
        self.wave.ripple = 0.0;
        self.redraw_requested = true;
        info!("ripple started");
    }

    pub(crate) fn stop_animation(&mut self) {
        if self.driver.stop_ripple() {
            info!(phase = self.wave.phase(), "ripple stopped");
        }
    }

    /// Starts the drop/rise sequence from the current progress.
    pub(crate) fn trigger(&mut self) {
        info!(progress = self.progress.progress, "drop/rise triggered");
        self.driver.trigger(self.progress.progress);
    }

    pub(crate) fn tick(&mut self, dt: Duration) {
        let delta = self.driver.advance(dt);
        if delta.is_empty() {
            return;
        }
        if let Some(ripple) = delta.ripple_phase {
            self.wave.ripple = ripple;
        }
        self.wave.add_burst(delta.burst);
        match delta.progress {
            Some(p) => self.set_progress(p),
            None => self.redraw_requested = true,
        }
    }

    /// Returns whether anything changed since the last call.
    pub(crate) fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    /// Samples the waves for the current state and paints one full frame.
    pub(crate) fn draw<S: Surface>(&mut self, surface: &mut S) {
        let buffers = self
            .sampler
            .sample(self.progress.water_level, self.wave.phase());
        self.renderer
            .render(surface, &self.geometry, &self.progress, buffers);
    }
}
