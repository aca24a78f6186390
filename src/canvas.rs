use crate::config::RenderMode;
use crate::ripple::{DrawStyle, Surface};
use crate::term::{Cell, CellBuffer};
use crossterm::style::Color;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pixel {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<DrawStyle> for Pixel {
    fn from(s: DrawStyle) -> Self {
        Self {
            r: s.color.r,
            g: s.color.g,
            b: s.color.b,
            a: s.alpha,
        }
    }
}

/// RGBA sub-cell pixels. Cell encoders fold them into terminal cells.
pub(crate) struct PixelCanvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<Pixel>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); (w as usize) * (h as usize)],
        }
    }

    /// Canvas covering `cols`×`rows` cells at the mode's sub-cell resolution.
    pub(crate) fn for_cells(mode: RenderMode, cols: u16, rows: u16) -> Self {
        let (sx, sy) = mode.subpixels();
        Self::new(cols as u32 * sx, rows as u32 * sy)
    }

    pub(crate) fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn get(&self, x: u32, y: u32) -> Pixel {
        if x >= self.w || y >= self.h {
            return Pixel::default();
        }
        self.px[self.idx(x, y)]
    }

    pub(crate) fn clear(&mut self, p: Pixel) {
        self.px.fill(p);
    }

    fn blend_over(&mut self, x: i32, y: i32, src: Pixel) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        let dst = self.px[i];

        let sa = src.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;

        let out_a = sa + da * (1.0 - sa);
        if out_a <= 1e-6 {
            self.px[i] = Pixel::default();
            return;
        }

        let blend = |sc: u8, dc: u8| -> u8 {
            let sc = sc as f32 / 255.0;
            let dc = dc as f32 / 255.0;
            let out = (sc * sa + dc * da * (1.0 - sa)) / out_a;
            (out.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
        };

        self.px[i] = Pixel {
            r: blend(src.r, dst.r),
            g: blend(src.g, dst.g),
            b: blend(src.b, dst.b),
            a: (out_a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        };
    }
}

// Pixel (x, y) is covered when its centre (x + 0.5, y + 0.5) is.
#[inline]
fn first_covered(edge: f32) -> i32 {
    (edge - 0.5).ceil() as i32
}

impl Surface for PixelCanvas {
    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, style: DrawStyle) {
        if radius <= 0.0 {
            return;
        }
        let src = Pixel::from(style);
        let r2 = radius * radius;
        for y in first_covered(cy - radius)..first_covered(cy + radius) {
            let dy = y as f32 + 0.5 - cy;
            for x in first_covered(cx - radius)..first_covered(cx + radius) {
                let dx = x as f32 + 0.5 - cx;
                if dx * dx + dy * dy <= r2 {
                    self.blend_over(x, y, src);
                }
            }
        }
    }

    fn vertical_line(&mut self, x: f32, y_top: f32, y_bottom: f32, style: DrawStyle) {
        let src = Pixel::from(style);
        let x = x.floor() as i32;
        for y in first_covered(y_top)..first_covered(y_bottom) {
            self.blend_over(x, y, src);
        }
    }
}

/* -----------------------------
   Braille encoding: 2×4 pixels -> U+2800..U+28FF
------------------------------ */

// Alpha at or above this counts as ink.
const INK_ALPHA: u8 = 32;

fn braille_bit(dx: u32, dy: u32) -> u8 {
    // Dot mapping:
    // (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64
    // (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

fn ink_color(p: Pixel, enable_color: bool) -> Color {
    if enable_color {
        Color::Rgb {
            r: p.r,
            g: p.g,
            b: p.b,
        }
    } else {
        Color::White
    }
}

pub(crate) fn canvas_to_braille(
    canvas: &PixelCanvas,
    out: &mut CellBuffer,
    enable_color: bool,
    bg: Color,
) {
    let cols = (canvas.w / 2).min(out.w as u32);
    let rows = (canvas.h / 4).min(out.h as u32);

    for cy in 0..rows {
        for cx in 0..cols {
            let mut mask: u8 = 0;
            let mut sum_r: u32 = 0;
            let mut sum_g: u32 = 0;
            let mut sum_b: u32 = 0;
            let mut ink_count: u32 = 0;

            for dy in 0..4 {
                for dx in 0..2 {
                    let p = canvas.get(cx * 2 + dx, cy * 4 + dy);
                    if p.a >= INK_ALPHA {
                        mask |= braille_bit(dx, dy);
                        sum_r += p.r as u32;
                        sum_g += p.g as u32;
                        sum_b += p.b as u32;
                        ink_count += 1;
                    }
                }
            }
            if ink_count == 0 {
                continue;
            }

            let ch = char::from_u32(0x2800 + (mask as u32)).unwrap_or(' ');
            let avg = Pixel {
                r: (sum_r / ink_count) as u8,
                g: (sum_g / ink_count) as u8,
                b: (sum_b / ink_count) as u8,
                a: 255,
            };
            out.set(
                cx as u16,
                cy as u16,
                Cell {
                    ch,
                    fg: ink_color(avg, enable_color),
                    bg,
                },
            );
        }
    }
}

/* -----------------------------
   Half blocks: 1×2 pixels per cell
------------------------------ */

pub(crate) fn canvas_to_half_blocks(
    canvas: &PixelCanvas,
    out: &mut CellBuffer,
    enable_color: bool,
    bg: Color,
) {
    let cols = canvas.w.min(out.w as u32);
    let rows = (canvas.h / 2).min(out.h as u32);

    for cy in 0..rows {
        for cx in 0..cols {
            let top = canvas.get(cx, cy * 2);
            let bottom = canvas.get(cx, cy * 2 + 1);
            let cell = match (top.a >= INK_ALPHA, bottom.a >= INK_ALPHA) {
                (false, false) => continue,
                (true, false) => Cell {
                    ch: '▀',
                    fg: ink_color(top, enable_color),
                    bg,
                },
                (false, true) => Cell {
                    ch: '▄',
                    fg: ink_color(bottom, enable_color),
                    bg,
                },
                (true, true) if enable_color => Cell {
                    ch: '▀',
                    fg: ink_color(top, true),
                    bg: ink_color(bottom, true),
                },
                (true, true) => Cell {
                    ch: '█',
                    fg: Color::White,
                    bg,
                },
            };
            out.set(cx as u16, cy as u16, cell);
        }
    }
}

pub(crate) fn canvas_to_cells(
    mode: RenderMode,
    canvas: &PixelCanvas,
    out: &mut CellBuffer,
    enable_color: bool,
    bg: Color,
) {
    match mode {
        RenderMode::Braille => canvas_to_braille(canvas, out, enable_color, bg),
        RenderMode::HalfBlock => canvas_to_half_blocks(canvas, out, enable_color, bg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ripple::Rgb;

    const RED: Rgb = Rgb::new(255, 0, 0);

    fn inked(c: &PixelCanvas) -> usize {
        c.px.iter().filter(|p| p.a > 0).count()
    }

    #[test]
    fn translucent_over_opaque_stays_opaque_and_mixes() {
        let mut c = PixelCanvas::new(1, 1);
        c.vertical_line(0.0, 0.0, 1.0, DrawStyle::opaque(Rgb::new(0, 0, 255)));
        c.vertical_line(0.0, 0.0, 1.0, DrawStyle::translucent(RED, 128));
        let p = c.get(0, 0);
        assert_eq!(p.a, 255);
        assert!(p.r > 100 && p.b > 100, "{p:?}");
    }

    #[test]
    fn circle_stays_within_its_bounds() {
        let mut c = PixelCanvas::new(20, 20);
        c.fill_circle(10.0, 10.0, 5.0, DrawStyle::opaque(RED));
        assert!(c.get(10, 10).a == 255);
        assert_eq!(c.get(2, 10).a, 0);
        assert_eq!(c.get(10, 16).a, 0);
        let n = inked(&c);
        // roughly pi r^2
        assert!((70..=90).contains(&n), "{n}");
    }

    #[test]
    fn vertical_line_covers_pixel_centres() {
        let mut c = PixelCanvas::new(3, 10);
        c.vertical_line(1.2, 2.4, 6.6, DrawStyle::opaque(RED));
        let ys: Vec<u32> = (0..10).filter(|&y| c.get(1, y).a > 0).collect();
        assert_eq!(ys, vec![2, 3, 4, 5, 6]);
        assert_eq!(inked(&c), 5);
    }

    #[test]
    fn braille_packs_two_by_four() {
        let mut c = PixelCanvas::new(2, 4);
        c.vertical_line(0.0, 0.0, 4.0, DrawStyle::opaque(RED));
        let mut out = CellBuffer::new(1, 1);
        canvas_to_braille(&c, &mut out, true, Color::Black);
        let cell = out.cells[0];
        assert_eq!(cell.ch, '\u{2847}');
        assert_eq!(cell.fg, Color::Rgb { r: 255, g: 0, b: 0 });
    }

    #[test]
    fn half_blocks_use_both_colours() {
        let mut c = PixelCanvas::new(1, 2);
        c.vertical_line(0.0, 0.0, 1.0, DrawStyle::opaque(RED));
        c.vertical_line(0.0, 1.0, 2.0, DrawStyle::opaque(Rgb::new(0, 0, 9)));
        let mut out = CellBuffer::new(1, 1);
        canvas_to_half_blocks(&c, &mut out, true, Color::Black);
        let cell = out.cells[0];
        assert_eq!(cell.ch, '▀');
        assert_eq!(cell.bg, Color::Rgb { r: 0, g: 0, b: 9 });

        canvas_to_half_blocks(&c, &mut out, false, Color::Black);
        assert_eq!(out.cells[0].ch, '█');
    }

    #[test]
    fn empty_canvas_leaves_cells_alone() {
        let c = PixelCanvas::for_cells(RenderMode::Braille, 4, 2);
        assert_eq!((c.w, c.h), (8, 8));
        let mut out = CellBuffer::new(4, 2);
        canvas_to_cells(RenderMode::Braille, &c, &mut out, true, Color::Black);
        assert!(out.cells.iter().all(|c| c.ch == ' '));
    }
}
