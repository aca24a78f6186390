//! Time-driven animation for the liquid disc.
//!
//! Two independent owners produce state changes: the endless [`RippleTicker`]
//! and the one-shot [`DropRiseSession`]. Neither schedules anything itself;
//! the host calls [`AnimationDriver::advance`] with the elapsed frame time and
//! merges the returned [`FrameDelta`] into the view.

use crate::model::PROGRESS_MAX;
use std::f32::consts::TAU;
use std::time::Duration;
use tracing::debug;

pub(crate) const RIPPLE_PERIOD: Duration = Duration::from_millis(1300);

/// Burst phase speed relative to the continuous ripple.
const BURST_SPEED: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Interpolator {
    Linear,
    /// Quadratic ease-in: starts slow, ends fast.
    Accelerate,
}

impl Interpolator {
    pub(crate) fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Interpolator::Linear => t,
            Interpolator::Accelerate => t * t,
        }
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn fraction(elapsed: Duration, total: Duration) -> f32 {
    (elapsed.as_secs_f32() / total.as_secs_f32()).clamp(0.0, 1.0)
}

/* -----------------------------
   Continuous ripple
------------------------------ */

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RippleTicker {
    elapsed: Duration,
}

impl RippleTicker {
    /// Advances and returns the ripple position in `[0, 2π)`.
    pub(crate) fn advance(&mut self, dt: Duration) -> f32 {
        let period = RIPPLE_PERIOD.as_nanos();
        let wrapped = (self.elapsed + dt).as_nanos() % period;
        self.elapsed = Duration::from_nanos(wrapped as u64);
        TAU * fraction(self.elapsed, RIPPLE_PERIOD)
    }
}

/* -----------------------------
   Drop / rise session
------------------------------ */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SessionPhase {
    Dropping,
    Pausing,
    Accelerating,
    Rising,
}

impl SessionPhase {
    pub(crate) fn duration(self) -> Duration {
        match self {
            SessionPhase::Dropping => Duration::from_millis(700),
            SessionPhase::Pausing => Duration::from_millis(100),
            SessionPhase::Accelerating => Duration::from_millis(3000),
            SessionPhase::Rising => Duration::from_millis(900),
        }
    }

    fn interpolator(self) -> Interpolator {
        match self {
            SessionPhase::Dropping | SessionPhase::Rising => Interpolator::Accelerate,
            SessionPhase::Pausing | SessionPhase::Accelerating => Interpolator::Linear,
        }
    }

    fn next(self) -> Option<SessionPhase> {
        match self {
            SessionPhase::Dropping => Some(SessionPhase::Pausing),
            SessionPhase::Pausing => Some(SessionPhase::Accelerating),
            SessionPhase::Accelerating => Some(SessionPhase::Rising),
            SessionPhase::Rising => None,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            SessionPhase::Dropping => "dropping",
            SessionPhase::Pausing => "pausing",
            SessionPhase::Accelerating => "accelerating",
            SessionPhase::Rising => "rising",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SessionStep {
    pub(crate) progress: f32,
    pub(crate) burst: f32,
    pub(crate) finished: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct DropRiseSession {
    initial_progress: f32,
    phase: SessionPhase,
    elapsed: Duration,
}

impl DropRiseSession {
    pub(crate) fn new(initial_progress: f32) -> Self {
        Self {
            initial_progress,
            phase: SessionPhase::Dropping,
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub(crate) fn initial_progress(&self) -> f32 {
        self.initial_progress
    }

    fn progress(&self) -> f32 {
        let t = self
            .phase
            .interpolator()
            .apply(fraction(self.elapsed, self.phase.duration()));
        match self.phase {
            SessionPhase::Dropping => lerp(self.initial_progress, PROGRESS_MAX, t),
            SessionPhase::Pausing | SessionPhase::Accelerating => PROGRESS_MAX,
            SessionPhase::Rising => lerp(PROGRESS_MAX, self.initial_progress, t),
        }
    }

    /// Advances by `dt`, carrying leftover time into the following phases.
    pub(crate) fn advance(&mut self, dt: Duration) -> SessionStep {
        let mut remaining = dt;
        let mut burst = 0.0;
        loop {
            let total = self.phase.duration();
            let before = fraction(self.elapsed, total);
            let used = remaining.min(total.saturating_sub(self.elapsed));
            self.elapsed += used;
            remaining -= used;

            if self.phase == SessionPhase::Accelerating {
                let after = fraction(self.elapsed, total);
                burst += BURST_SPEED * (after - before) * TAU;
            }

            if self.elapsed < total {
                return SessionStep {
                    progress: self.progress(),
                    burst,
                    finished: false,
                };
            }

            match self.phase.next() {
                Some(next) => {
                    self.phase = next;
                    self.elapsed = Duration::ZERO;
                }
                None => {
                    return SessionStep {
                        progress: self.initial_progress,
                        burst,
                        finished: true,
                    };
                }
            }
        }
    }
}

/* -----------------------------
   Driver
------------------------------ */

/// State changes produced by one [`AnimationDriver::advance`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct FrameDelta {
    /// New continuous ripple position, when the ripple is running.
    pub(crate) ripple_phase: Option<f32>,
    /// Extra phase advance from an accelerating session.
    pub(crate) burst: f32,
    /// Progress set by a running session.
    pub(crate) progress: Option<f32>,
}

impl FrameDelta {
    pub(crate) fn is_empty(&self) -> bool {
        self.ripple_phase.is_none() && self.progress.is_none() && self.burst == 0.0
    }
}

#[derive(Debug, Default)]
pub(crate) struct AnimationDriver {
    ripple: Option<RippleTicker>,
    session: Option<DropRiseSession>,
}

impl AnimationDriver {
    /// Installs a fresh ripple ticker, replacing any running one.
    pub(crate) fn start_ripple(&mut self) {
        self.ripple = Some(RippleTicker::default());
    }

    /// Returns whether a ticker was running.
    pub(crate) fn stop_ripple(&mut self) -> bool {
        self.ripple.take().is_some()
    }

    pub(crate) fn is_rippling(&self) -> bool {
        self.ripple.is_some()
    }

    /// Starts a drop/rise session from `current_progress`, dropping any
    /// session already in flight.
    pub(crate) fn trigger(&mut self, current_progress: f32) {
        if let Some(old) = self.session.take() {
            debug!(phase = old.phase().label(), "drop/rise session superseded");
        }
        self.session = Some(DropRiseSession::new(current_progress));
    }

    pub(crate) fn session(&self) -> Option<&DropRiseSession> {
        self.session.as_ref()
    }

    pub(crate) fn advance(&mut self, dt: Duration) -> FrameDelta {
        let mut delta = FrameDelta {
            ripple_phase: self.ripple.as_mut().map(|r| r.advance(dt)),
            ..FrameDelta::default()
        };

        if let Some(session) = self.session.as_mut() {
            let was = session.phase();
            let step = session.advance(dt);
            delta.progress = Some(step.progress);
            delta.burst = step.burst;
            if step.finished {
                debug!(initial = session.initial_progress(), "drop/rise session finished");
                self.session = None;
            } else if session.phase() != was {
                debug!(
                    from = was.label(),
                    to = session.phase().label(),
                    "drop/rise phase change"
                );
            }
        }
        delta
    }
}
