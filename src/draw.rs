use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoFont, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::Rectangle,
    text::{Baseline, Text},
};

/// Fixed width font used by [`draw_text`]
pub const TEXT_FONT: &MonoFont<'static> = &FONT_6X10;

/// Horizontal advance per character, in pixels
pub const GLYPH_WIDTH: i32 = 6;

/// Glyph cell height, in pixels
pub const GLYPH_HEIGHT: i32 = 10;

pub fn draw_pixel<D>(target: &mut D, x: i32, y: i32, color: BinaryColor) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    Pixel(Point::new(x, y), color).draw(target)
}

/// Integer Bresenham rasterisation of a straight line.
///
/// Endpoints are put in a canonical order first, so swapping `start` and
/// `end` yields exactly the same pixel set. Every step along the major
/// axis maps to exactly one minor coordinate, rounded to nearest, which
/// lets [`LinePoints::clipped`] begin at the window edge instead of walking
/// up to it from an endpoint far off the panel.
#[derive(Debug, Clone)]
pub struct LinePoints {
    x_major: bool,
    m0: i64,
    n0: i64,
    dm: i64,
    dn: i64,
    next: i64,
    last: i64,
    // inclusive minor axis bounds, set when clipping
    window: Option<(i64, i64)>,
}

impl LinePoints {
    pub fn new(start: Point, end: Point) -> Self {
        let (a, b) = if (start.x, start.y) <= (end.x, end.y) { (start, end) } else { (end, start) };
        let (dx, dy) = (b.x as i64 - a.x as i64, b.y as i64 - a.y as i64);
        let x_major = dx.abs() >= dy.abs();
        let (m0, n0, dm, dn) = if x_major {
            (a.x as i64, a.y as i64, dx, dy)
        } else {
            (a.y as i64, a.x as i64, dy, dx)
        };
        Self {
            x_major,
            m0,
            n0,
            dm,
            dn,
            next: m0.min(m0 + dm),
            last: m0.max(m0 + dm),
            window: None,
        }
    }

    /// Only the points of the line that fall inside `area`
    pub fn clipped(start: Point, end: Point, area: &Rectangle) -> Self {
        let mut line = Self::new(start, end);
        let (x0, y0) = (area.top_left.x as i64, area.top_left.y as i64);
        let (x1, y1) = (x0 + area.size.width as i64 - 1, y0 + area.size.height as i64 - 1);
        let ((m_lo, m_hi), window) = if line.x_major { ((x0, x1), (y0, y1)) } else { ((y0, y1), (x0, x1)) };
        line.next = line.next.max(m_lo);
        line.last = line.last.min(m_hi);
        line.window = Some(window);
        line
    }

    /// Minor coordinate at major coordinate `m`
    fn minor_at(&self, m: i64) -> i64 {
        if self.dm == 0 {
            return self.n0;
        }
        let (t, span) = if self.dm < 0 { (self.m0 - m, -self.dm) } else { (m - self.m0, self.dm) };
        let num = 2 * t as i128 * self.dn as i128 + span as i128;
        self.n0 + num.div_euclid(2 * span as i128) as i64
    }
}

impl Iterator for LinePoints {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        while self.next <= self.last {
            let m = self.next;
            self.next += 1;
            let n = self.minor_at(m);
            if let Some((lo, hi)) = self.window {
                if n < lo || n > hi {
                    continue;
                }
            }
            let (x, y) = if self.x_major { (m, n) } else { (n, m) };
            return Some(Point::new(x as i32, y as i32));
        }
        None
    }
}

pub fn draw_line<D>(
    target: &mut D,
    start: Point,
    end: Point,
    color: BinaryColor,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let area = target.bounding_box();
    target.draw_iter(LinePoints::clipped(start, end, &area).map(|p| Pixel(p, color)))
}

/// Intersection of the box `[x, x + w) x [y, y + h)` with `bounds`.
///
/// Worked in i64 so that any i32 origin with any u32 extent is safe; the
/// returned rectangle lies wholly inside `bounds`.
pub fn clip_rect(bounds: &Rectangle, x: i64, y: i64, w: i64, h: i64) -> Option<Rectangle> {
    let (bx, by) = (bounds.top_left.x as i64, bounds.top_left.y as i64);
    let left = x.max(bx);
    let top = y.max(by);
    let right = (x + w).min(bx + bounds.size.width as i64);
    let bottom = (y + h).min(by + bounds.size.height as i64);
    if left >= right || top >= bottom {
        return None;
    }
    Some(Rectangle::new(
        Point::new(left as i32, top as i32),
        Size::new((right - left) as u32, (bottom - top) as u32),
    ))
}

fn fill_clipped<D>(target: &mut D, x: i64, y: i64, w: i64, h: i64, color: BinaryColor) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    match clip_rect(&target.bounding_box(), x, y, w, h) {
        Some(visible) => target.fill_solid(&visible, color),
        None => Ok(()),
    }
}

/// Horizontal run of `w` pixels starting at (x, y)
pub fn draw_hline<D>(target: &mut D, x: i32, y: i32, w: u32, color: BinaryColor) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    fill_clipped(target, x.into(), y.into(), w.into(), 1, color)
}

/// Vertical run of `h` pixels starting at (x, y)
pub fn draw_vline<D>(target: &mut D, x: i32, y: i32, h: u32, color: BinaryColor) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    fill_clipped(target, x.into(), y.into(), 1, h.into(), color)
}

/// Outline (one pixel border) or filled rectangle with its top left at (x, y)
pub fn draw_rectangle<D>(
    target: &mut D,
    x: i32,
    y: i32,
    w: u32,
    h: u32,
    color: BinaryColor,
    filled: bool,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let (x, y, w, h) = (i64::from(x), i64::from(y), i64::from(w), i64::from(h));
    if filled || w <= 2 || h <= 2 {
        return fill_clipped(target, x, y, w, h, color);
    }
    // top and bottom rows, then the sides between them
    fill_clipped(target, x, y, w, 1, color)?;
    fill_clipped(target, x, y + h - 1, w, 1, color)?;
    fill_clipped(target, x, y + 1, 1, h - 2, color)?;
    fill_clipped(target, x + w - 1, y + 1, 1, h - 2, color)
}

/// Clears a rectangular region of the target buffer to BinaryColor::Off.
pub fn clear_region<D>(target: &mut D, region: Rectangle) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    fill_clipped(
        target,
        region.top_left.x.into(),
        region.top_left.y.into(),
        region.size.width.into(),
        region.size.height.into(),
        BinaryColor::Off,
    )
}

/// Text with its top left corner at (x, y), one fixed width cell per char.
///
/// Characters outside printable ASCII have no glyph and leave their cell
/// untouched. Only glyph pixels are written; the background stays as is.
pub fn draw_text<D>(
    target: &mut D,
    text: &str,
    x: i32,
    y: i32,
    color: BinaryColor,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let bounds = target.bounding_box();
    let (left, top) = (i64::from(bounds.top_left.x), i64::from(bounds.top_left.y));
    let right = left + i64::from(bounds.size.width);
    let bottom = top + i64::from(bounds.size.height);
    let (glyph_w, glyph_h) = (i64::from(GLYPH_WIDTH), i64::from(GLYPH_HEIGHT));

    let row = i64::from(y);
    if row >= bottom || row + glyph_h <= top {
        return Ok(());
    }

    let style = MonoTextStyle::new(TEXT_FONT, color);
    let mut cell_x = i64::from(x);
    let mut utf8 = [0u8; 4];

    for ch in text.chars() {
        if cell_x >= right {
            break;
        }
        // cells left of the panel only advance; visible ones are near the panel in i32
        if cell_x + glyph_w > left && ch.is_ascii_graphic() {
            let glyph: &str = ch.encode_utf8(&mut utf8);
            Text::with_baseline(glyph, Point::new(cell_x as i32, y), style, Baseline::Top).draw(target)?;
        }
        cell_x += glyph_w;
    }
    Ok(())
}
