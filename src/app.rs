use crate::canvas::{canvas_to_cells, Pixel, PixelCanvas};
use crate::config::{load_settings, save_settings_atomic, settings_path, Args, RenderMode, Settings};
use crate::input::{collect_input_nonblocking, map_event_to_action, Action, InputEvent};
use crate::term::Terminal;
use crate::view::LiquidView;
use anyhow::Result;
use crossterm::style::Color;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const HUD_ROWS: u16 = 1;

pub(crate) struct App {
    /// Effective settings: file values with command-line overrides.
    settings: Settings,
    /// What gets written back on exit; only in-app toggles touch it.
    file_settings: Settings,
    settings_path: Option<PathBuf>,
    term: Terminal,
    canvas: PixelCanvas,
    view: LiquidView,
    should_quit: bool,
    dirty: bool,
}

impl App {
    fn init(args: &Args) -> Result<Self> {
        let settings_path = settings_path(args);
        let file_settings = settings_path
            .as_deref()
            .map(load_settings)
            .unwrap_or_default();
        let settings = file_settings.clone().with_args(args);

        let term = Terminal::begin()?;
        let canvas = PixelCanvas::for_cells(
            settings.render_mode,
            term.cols,
            canvas_rows(&settings, term.rows),
        );
        let mut view = LiquidView::new(canvas.w, canvas.h, settings.initial_progress);
        if settings.autostart {
            view.start_animation();
        }
        info!(
            cols = term.cols,
            rows = term.rows,
            mode = ?settings.render_mode,
            progress = view.progress(),
            "liquid-progress started"
        );

        Ok(Self {
            settings,
            file_settings,
            settings_path,
            term,
            canvas,
            view,
            should_quit: false,
            dirty: true,
        })
    }

    fn run(&mut self) -> Result<()> {
        let frame_dt = Duration::from_secs_f32(1.0 / self.settings.fps() as f32);
        let mut last_frame = Instant::now();

        while !self.should_quit {
            // resize before ticking so a frame never mixes two geometries
            if self.term.resize_if_needed()? {
                self.relayout();
            }

            for ev in collect_input_nonblocking(frame_dt)? {
                self.handle(ev);
                if self.should_quit {
                    break;
                }
            }

            let now = Instant::now();
            self.view.tick(now.saturating_duration_since(last_frame));
            last_frame = now;

            let redraw = self.view.take_redraw_request();
            if redraw || self.dirty {
                self.render_frame()?;
                self.dirty = false;
            }

            spin_sleep(frame_dt, now);
        }
        Ok(())
    }

    fn handle(&mut self, ev: InputEvent) {
        if let InputEvent::Click { row } = ev {
            // ignore clicks on the status line
            if row >= canvas_rows(&self.settings, self.term.rows) {
                return;
            }
        }
        let Some(action) = map_event_to_action(&ev) else {
            return;
        };
        match action {
            Action::Trigger => self.view.trigger(),
            Action::ToggleRipple => {
                if self.view.is_animating() {
                    self.view.stop_animation();
                } else {
                    self.view.start_animation();
                }
                self.dirty = true;
            }
            Action::NudgeProgress(delta) => self.view.set_progress(self.view.progress() + delta),
            Action::SetProgress(p) => self.view.set_progress(p),
            Action::ToggleMode => {
                self.settings.render_mode = self.settings.render_mode.toggled();
                self.file_settings.render_mode = self.settings.render_mode;
                self.relayout();
            }
            Action::ToggleHud => {
                self.settings.show_hud = !self.settings.show_hud;
                self.file_settings.show_hud = self.settings.show_hud;
                self.relayout();
            }
            Action::Quit => self.should_quit = true,
        }
    }

    fn relayout(&mut self) {
        self.canvas = PixelCanvas::for_cells(
            self.settings.render_mode,
            self.term.cols,
            canvas_rows(&self.settings, self.term.rows),
        );
        self.view.resize(self.canvas.w, self.canvas.h);
        debug!(
            cols = self.term.cols,
            rows = self.term.rows,
            mode = ?self.settings.render_mode,
            radius = self.view.geometry().radius,
            "relayout"
        );
        self.dirty = true;
    }

    fn render_frame(&mut self) -> Result<()> {
        let bg = Color::Black;
        self.term.cur.clear(bg);
        self.canvas.clear(Pixel::default());

        self.view.draw(&mut self.canvas);
        canvas_to_cells(
            self.settings.render_mode,
            &self.canvas,
            &mut self.term.cur,
            self.settings.enable_color,
            bg,
        );

        if self.settings.show_hud {
            let line = status_line(&self.view, &self.settings);
            let y = self.term.rows.saturating_sub(HUD_ROWS);
            self.term.cur.put_str(0, y, &line, Color::Grey, bg);
        }

        self.term.present()?;
        Ok(())
    }

    fn save_settings(&self) -> Result<()> {
        match &self.settings_path {
            Some(path) => save_settings_atomic(path, &self.file_settings),
            None => Ok(()),
        }
    }
}

pub(crate) fn run(args: Args) -> Result<()> {
    let mut app = App::init(&args)?;
    let res = app.run();
    // restore the terminal even when the loop failed
    let end = app.term.end();
    res.and(end)?;
    app.save_settings()?;
    info!(
        progress = app.view.progress(),
        water_level = app.view.water_level(),
        phase = app.view.phase(),
        "liquid-progress exited"
    );
    Ok(())
}

fn canvas_rows(settings: &Settings, rows: u16) -> u16 {
    if settings.show_hud {
        rows.saturating_sub(HUD_ROWS)
    } else {
        rows
    }
}

fn status_line(view: &LiquidView, settings: &Settings) -> String {
    let ripple = if view.is_animating() { "on" } else { "off" };
    let session = view.session_phase().map_or("idle", |p| p.label());
    let mode = match settings.render_mode {
        RenderMode::Braille => "braille",
        RenderMode::HalfBlock => "half-block",
    };
    format!(
        " {:>5.1}%  ripple {:<3}  {:<12} | space drop  r ripple  ↑↓ ±5  0-9 set  m {}  h hud  q quit",
        view.progress(),
        ripple,
        session,
        mode
    )
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
