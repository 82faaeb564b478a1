// Raster charts for solved plans, drawn pixel by pixel into an RgbImage.
// Charts are a sink: nothing drawn here is ever read back by the models.

use image::{ImageBuffer, ImageResult, Rgb, RgbImage};
use std::path::Path;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const GRID: Rgb<u8> = Rgb([225, 225, 225]);
pub const AXIS: Rgb<u8> = Rgb([60, 60, 60]);
pub const LINK: Rgb<u8> = Rgb([170, 170, 170]);
pub const PLANT: Rgb<u8> = Rgb([0, 100, 200]);
pub const OPENED: Rgb<u8> = Rgb([210, 40, 40]);
pub const REGION: Rgb<u8> = Rgb([40, 160, 70]);
pub const PRODUCTION: Rgb<u8> = Rgb([120, 170, 220]);
pub const WORKFORCE: Rgb<u8> = Rgb([230, 130, 20]);
pub const INVENTORY: Rgb<u8> = Rgb([40, 160, 70]);
pub const BACKLOG: Rgb<u8> = Rgb([150, 60, 170]);

const MARGIN: i64 = 40;

/// Plants, regions and the shipments between them.
///
/// Only the topology is drawn: a link marks that a plant serves a region,
/// not how much it ships.
pub struct NetworkChart<'a> {
    pub plants: &'a [(f64, f64)],
    pub regions: &'a [(f64, f64)],
    pub opened: &'a [usize],
    pub links: Vec<(usize, usize)>,
}

/// Per-period series of an aggregate plan. Production bars and the workforce
/// line share the left axis; inventory and backlog share the right one.
pub struct TimeSeriesChart<'a> {
    pub production: &'a [f64],
    pub workforce: &'a [f64],
    pub inventory: &'a [f64],
    pub backlog: Option<&'a [f64]>,
}

struct Canvas {
    img: RgbImage,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            img: ImageBuffer::from_pixel(width, height, WHITE),
        }
    }

    fn width(&self) -> i64 {
        self.img.width() as i64
    }

    fn height(&self) -> i64 {
        self.img.height() as i64
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && x < self.width() && y < self.height() {
            self.img.put_pixel(x as u32, y as u32, color);
        }
    }

    fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
        for y in y0.min(y1)..=y0.max(y1) {
            for x in x0.min(x1)..=x0.max(x1) {
                self.put(x, y, color);
            }
        }
    }

    // Bresenham
    fn line(&mut self, (x0, y0): (i64, i64), (x1, y1): (i64, i64), color: Rgb<u8>) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.put(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn square(&mut self, (cx, cy): (i64, i64), half: i64, color: Rgb<u8>) {
        self.fill_rect(cx - half, cy - half, cx + half, cy + half, color);
    }

    fn disc(&mut self, (cx, cy): (i64, i64), radius: i64, color: Rgb<u8>) {
        for y in -radius..=radius {
            for x in -radius..=radius {
                if x * x + y * y <= radius * radius {
                    self.put(cx + x, cy + y, color);
                }
            }
        }
    }

    fn cross(&mut self, (cx, cy): (i64, i64), half: i64, color: Rgb<u8>) {
        self.line((cx - half, cy - half), (cx + half, cy + half), color);
        self.line((cx - half, cy + half), (cx + half, cy - half), color);
    }

    fn polyline(&mut self, points: &[(i64, i64)], color: Rgb<u8>) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], color);
        }
    }
}

/// Linear map from a data interval onto a pixel interval
#[derive(Debug, Clone, Copy)]
struct Scale {
    lo: f64,
    hi: f64,
    from_px: i64,
    to_px: i64,
}

impl Scale {
    fn new(lo: f64, hi: f64, from_px: i64, to_px: i64) -> Self {
        let (lo, hi) = if hi - lo < 1e-9 {
            (lo - 1.0, hi + 1.0)
        } else {
            (lo, hi)
        };
        Self {
            lo,
            hi,
            from_px,
            to_px,
        }
    }

    /// Pixel for `value`, pinned to the target interval
    fn px(&self, value: f64) -> i64 {
        let (first, last) = (self.from_px.min(self.to_px), self.from_px.max(self.to_px));
        let t = (value - self.lo) / (self.hi - self.lo);
        let px = self.from_px as f64 + t * (self.to_px - self.from_px) as f64;
        if px.is_nan() {
            return first;
        }
        px.round().clamp(first as f64, last as f64) as i64
    }
}

fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.1).max(0.5);
    (lo - pad, hi + pad)
}

fn value_ceiling<'a>(series: impl IntoIterator<Item = &'a [f64]>) -> f64 {
    let max = series
        .into_iter()
        .flat_map(|s| s.iter().copied())
        .fold(0.0, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

fn draw_grid(canvas: &mut Canvas, divisions: i64) {
    let (w, h) = (canvas.width(), canvas.height());
    for k in 0..=divisions {
        let x = MARGIN + k * (w - 2 * MARGIN) / divisions;
        let y = MARGIN + k * (h - 2 * MARGIN) / divisions;
        canvas.line((x, MARGIN), (x, h - MARGIN), GRID);
        canvas.line((MARGIN, y), (w - MARGIN, y), GRID);
    }
}

/// Scatter of plants (squares, opened ones highlighted) and regions (discs),
/// with a line for every plant → region link.
pub fn render_network(chart: &NetworkChart<'_>) -> RgbImage {
    let mut canvas = Canvas::new(600, 600);
    draw_grid(&mut canvas, 10);

    let all = chart.plants.iter().chain(chart.regions.iter());
    let (x_lo, x_hi) = padded_range(all.clone().map(|p| p.0));
    let (y_lo, y_hi) = padded_range(all.map(|p| p.1));
    let sx = Scale::new(x_lo, x_hi, MARGIN, canvas.width() - MARGIN);
    // Image rows grow downwards
    let sy = Scale::new(y_lo, y_hi, canvas.height() - MARGIN, MARGIN);
    let at = |p: &(f64, f64)| (sx.px(p.0), sy.px(p.1));

    for &(i, j) in &chart.links {
        if let (Some(plant), Some(region)) = (chart.plants.get(i), chart.regions.get(j)) {
            canvas.line(at(plant), at(region), LINK);
        }
    }
    for plant in chart.plants {
        canvas.square(at(plant), 7, PLANT);
    }
    for plant in chart.opened.iter().filter_map(|&i| chart.plants.get(i)) {
        canvas.square(at(plant), 7, OPENED);
    }
    for region in chart.regions {
        canvas.disc(at(region), 6, REGION);
    }

    canvas.img
}

#[derive(Clone, Copy)]
enum Marker {
    Square,
    Disc,
    Cross,
}

fn plot_series(canvas: &mut Canvas, points: &[(i64, i64)], color: Rgb<u8>, marker: Marker) {
    canvas.polyline(points, color);
    for &p in points {
        match marker {
            Marker::Square => canvas.square(p, 4, color),
            Marker::Disc => canvas.disc(p, 4, color),
            Marker::Cross => canvas.cross(p, 5, color),
        }
    }
}

/// Dual-axis time series: production bars and workforce (squares) on the left
/// axis, inventory (discs) and backlog (crosses) on the right axis.
pub fn render_time_series(chart: &TimeSeriesChart<'_>) -> RgbImage {
    let mut canvas = Canvas::new(720, 480);
    let (w, h) = (canvas.width(), canvas.height());
    let periods = chart.production.len().max(1) as i64;

    let left = Scale::new(
        0.0,
        value_ceiling([chart.production, chart.workforce]),
        h - MARGIN,
        MARGIN,
    );
    let right = Scale::new(
        0.0,
        value_ceiling([chart.inventory].into_iter().chain(chart.backlog)),
        h - MARGIN,
        MARGIN,
    );

    let slot = (w - 2 * MARGIN) / periods;
    let centre = |t: usize| MARGIN + slot * t as i64 + slot / 2;

    for t in 0..=4 {
        let y = MARGIN + t * (h - 2 * MARGIN) / 4;
        canvas.line((MARGIN, y), (w - MARGIN, y), GRID);
    }

    let half_bar = (slot * 3 / 10).max(1);
    for (t, &p) in chart.production.iter().enumerate() {
        let top = left.px(p);
        canvas.fill_rect(centre(t) - half_bar, top, centre(t) + half_bar, h - MARGIN, PRODUCTION);
    }

    let points = |values: &[f64], scale: Scale| -> Vec<(i64, i64)> {
        values
            .iter()
            .enumerate()
            .map(|(t, &v)| (centre(t), scale.px(v)))
            .collect()
    };

    plot_series(&mut canvas, &points(chart.workforce, left), WORKFORCE, Marker::Square);
    plot_series(&mut canvas, &points(chart.inventory, right), INVENTORY, Marker::Disc);
    if let Some(backlog) = chart.backlog {
        plot_series(&mut canvas, &points(backlog, right), BACKLOG, Marker::Cross);
    }

    canvas.line((MARGIN, MARGIN), (MARGIN, h - MARGIN), AXIS);
    canvas.line((w - MARGIN, MARGIN), (w - MARGIN, h - MARGIN), AXIS);
    canvas.line((MARGIN, h - MARGIN), (w - MARGIN, h - MARGIN), AXIS);

    canvas.img
}

/// Write a chart as PNG (format taken from the extension)
pub fn save(img: &RgbImage, path: impl AsRef<Path>) -> ImageResult<()> {
    img.save(path)
}
