use anyhow::Context;
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Cell {
    pub(crate) const fn blank(bg: Color) -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank(Color::Black)
    }
}

/// A horizontal stretch of cells that differ from what is on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Run {
    pub(crate) x: u16,
    pub(crate) y: u16,
    pub(crate) len: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }

    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }

    pub(crate) fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell::blank(bg));
    }

    /// Writes `s` from `(x, y)` rightwards, cut off at the right edge.
    pub(crate) fn put_str(&mut self, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
        if y >= self.h {
            return;
        }
        let room = self.w.saturating_sub(x) as usize;
        for (i, ch) in s.chars().take(room).enumerate() {
            self.set(x + i as u16, y, Cell { ch, fg, bg });
        }
    }

    /// Runs of cells that differ from `shown`. A buffer of another size
    /// counts as entirely stale.
    pub(crate) fn changed_runs(&self, shown: &CellBuffer) -> Vec<Run> {
        let stale = self.w != shown.w || self.h != shown.h;
        let mut runs = Vec::new();
        for y in 0..self.h {
            let row = self.idx(0, y);
            let mut open: Option<u16> = None;
            for x in 0..self.w {
                let i = row + x as usize;
                let changed = stale || self.cells[i] != shown.cells[i];
                match (changed, open) {
                    (true, None) => open = Some(x),
                    (false, Some(start)) => {
                        runs.push(Run {
                            x: start,
                            y,
                            len: (x - start) as usize,
                        });
                        open = None;
                    }
                    _ => {}
                }
            }
            if let Some(start) = open {
                runs.push(Run {
                    x: start,
                    y,
                    len: (self.w - start) as usize,
                });
            }
        }
        runs
    }
}

/// Terminal modes this process has switched on. Whatever is set gets
/// switched back off by `restore`, at the latest when the guard drops, so an
/// early `?` or a panic still hands the shell back intact.
#[derive(Debug, Default)]
struct TtyGuard {
    raw: bool,
    screen: bool,
}

impl TtyGuard {
    fn enter() -> anyhow::Result<Self> {
        let mut guard = Self::default();
        terminal::enable_raw_mode().context("could not enable raw mode")?;
        guard.raw = true;
        // a half-written sequence still needs undoing
        guard.screen = true;
        execute!(
            io::stdout(),
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            EnableMouseCapture,
            Clear(ClearType::All)
        )
        .context("could not enter the alternate screen")?;
        Ok(guard)
    }

    fn restore(&mut self) -> anyhow::Result<()> {
        let screen = if std::mem::take(&mut self.screen) {
            execute!(
                io::stdout(),
                ResetColor,
                Clear(ClearType::All),
                DisableMouseCapture,
                cursor::Show,
                EnableLineWrap,
                LeaveAlternateScreen
            )
            .context("could not leave the alternate screen")
        } else {
            Ok(())
        };
        let raw = if std::mem::take(&mut self.raw) {
            terminal::disable_raw_mode().context("could not disable raw mode")
        } else {
            Ok(())
        };
        screen.and(raw)
    }

    fn is_active(&self) -> bool {
        self.raw || self.screen
    }
}

impl Drop for TtyGuard {
    fn drop(&mut self) {
        // nowhere left to report a failure
        let _ = self.restore();
    }
}

/// Alternate-screen terminal with mouse capture. `cur` is the frame being
/// built; `present` writes only the runs that differ from `shown`.
pub(crate) struct Terminal {
    out: io::Stdout,
    guard: TtyGuard,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    shown: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let guard = TtyGuard::enter()?;
        let (cols, rows) = terminal::size().context("could not read the terminal size")?;
        Ok(Self {
            out: io::stdout(),
            guard,
            cols,
            rows,
            shown: CellBuffer::new(0, 0),
            cur: CellBuffer::new(cols, rows),
        })
    }

    /// Hands the terminal back. Safe to call more than once.
    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        if !self.guard.is_active() {
            return Ok(());
        }
        self.out.flush()?;
        self.guard.restore()
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.cur = CellBuffer::new(c, r);
        // after the clear nothing on screen is known, so repaint it all
        self.shown = CellBuffer::new(0, 0);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        let runs = self.cur.changed_runs(&self.shown);
        if runs.is_empty() {
            return Ok(());
        }
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        for run in runs {
            queue!(self.out, cursor::MoveTo(run.x, run.y))?;
            let start = self.cur.idx(run.x, run.y);
            for c in &self.cur.cells[start..start + run.len] {
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        if self.shown.w == self.cur.w && self.shown.h == self.cur.h {
            self.shown.cells.copy_from_slice(&self.cur.cells);
        } else {
            self.shown = self.cur.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(ch: char) -> Cell {
        Cell {
            ch,
            ..Cell::default()
        }
    }

    fn row_text(buf: &CellBuffer, y: u16) -> String {
        (0..buf.w).map(|x| buf.cells[buf.idx(x, y)].ch).collect()
    }

    #[test]
    fn text_is_clipped_at_the_right_edge() {
        let mut buf = CellBuffer::new(4, 2);
        buf.put_str(2, 1, "hello", Color::White, Color::Black);
        assert_eq!(row_text(&buf, 1), "  he");
        buf.put_str(9, 0, "x", Color::White, Color::Black);
        buf.put_str(0, 7, "x", Color::White, Color::Black);
        assert_eq!(row_text(&buf, 0), "    ");
    }

    #[test]
    fn out_of_range_set_is_ignored() {
        let mut buf = CellBuffer::new(2, 2);
        buf.set(5, 0, glyph('x'));
        assert!(buf.cells.iter().all(|c| c.ch == ' '));
    }

    #[test]
    fn identical_frames_have_no_runs() {
        let buf = CellBuffer::new(5, 3);
        assert!(buf.changed_runs(&buf.clone()).is_empty());
    }

    #[test]
    fn changed_cells_group_into_runs_per_row() {
        let shown = CellBuffer::new(6, 2);
        let mut cur = shown.clone();
        cur.set(1, 0, glyph('a'));
        cur.set(2, 0, glyph('b'));
        cur.set(5, 0, glyph('c'));
        cur.set(0, 1, glyph('d'));
        assert_eq!(
            cur.changed_runs(&shown),
            vec![
                Run { x: 1, y: 0, len: 2 },
                Run { x: 5, y: 0, len: 1 },
                Run { x: 0, y: 1, len: 1 },
            ]
        );
    }

    #[test]
    fn background_change_counts_as_a_change() {
        let shown = CellBuffer::new(3, 1);
        let mut cur = shown.clone();
        cur.clear(Color::DarkBlue);
        assert_eq!(cur.changed_runs(&shown), vec![Run { x: 0, y: 0, len: 3 }]);
    }

    #[test]
    fn resized_buffer_repaints_every_row() {
        let cur = CellBuffer::new(3, 2);
        let runs = cur.changed_runs(&CellBuffer::new(0, 0));
        assert_eq!(
            runs,
            vec![Run { x: 0, y: 0, len: 3 }, Run { x: 0, y: 1, len: 3 }]
        );
    }

    #[test]
    fn idle_guard_restores_nothing() {
        let mut guard = TtyGuard::default();
        assert!(!guard.is_active());
        assert!(guard.restore().is_ok());
        assert!(guard.restore().is_ok());
    }
}
