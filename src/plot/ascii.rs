//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Force-extension plots always put distance on the x axis and force on the
//! y axis, whatever the model's independent axis is.
//!
//! Plot elements:
//! - observed points: `o`
//! - fitted curve (or zero line in residual plots): `-`

use crate::domain::{Axis, Measurement};
use crate::io::curve::CurveFile;

/// Data points overlaid with the fitted curve.
pub fn render_fit_plot(data: &Measurement, curve: &[(f64, f64)], width: usize, height: usize) -> String {
    let points: Vec<(f64, f64)> = data
        .distance
        .iter()
        .zip(&data.force)
        .map(|(&d, &f)| (d, f))
        .collect();
    let (x_min, x_max) = x_range(&points, curve).unwrap_or((0.0, 1.0));
    render_plot(
        &points,
        Some(curve),
        (x_min, x_max),
        width,
        height,
        (Axis::Distance, "force [pN]"),
    )
}

/// Weighted residuals against the model's independent axis, with a zero line.
pub fn render_residual_plot(
    x: &[f64],
    residuals: &[f64],
    independent: Axis,
    width: usize,
    height: usize,
) -> String {
    let points: Vec<(f64, f64)> = x.iter().zip(residuals).map(|(&x, &r)| (x, r)).collect();
    let (x_min, x_max) = x_range(&points, &[]).unwrap_or((0.0, 1.0));
    let zero = [(x_min, 0.0), (x_max, 0.0)];
    render_plot(
        &points,
        Some(&zero),
        (x_min, x_max),
        width,
        height,
        (independent, "residual [sigma]"),
    )
}

/// Render a saved curve JSON file (curve only, no overlay points).
pub fn render_curve_file(curve: &CurveFile, width: usize, height: usize) -> String {
    let points: Vec<(f64, f64)> = curve
        .grid
        .distance_um
        .iter()
        .zip(&curve.grid.force_pn)
        .map(|(&d, &f)| (d, f))
        .collect();
    let (x_min, x_max) = x_range(&[], &points).unwrap_or((0.0, 1.0));
    render_plot(
        &[],
        Some(&points),
        (x_min, x_max),
        width,
        height,
        (Axis::Distance, "force [pN]"),
    )
}

fn render_plot(
    points: &[(f64, f64)],
    curve: Option<&[(f64, f64)]>,
    (x_min, x_max): (f64, f64),
    width: usize,
    height: usize,
    (x_axis, y_label): (Axis, &str),
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (y_min, y_max) = y_range(points, curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curve first (so points can overlay).
    if let Some(curve) = curve {
        draw_curve(&mut grid, curve, x_min, x_max, y_min, y_max);
    }

    for &(x, y) in points {
        if !x.is_finite() || !y.is_finite() {
            continue;
        }
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {}=[{x_min:.3}, {x_max:.3}] {} | {y_label}=[{y_min:.2}, {y_max:.2}]\n",
        x_axis.label(),
        x_axis.unit(),
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn x_range(points: &[(f64, f64)], curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    finite_range(points.iter().chain(curve).map(|&(x, _)| x))
}

fn y_range(points: &[(f64, f64)], curve: Option<&[(f64, f64)]>) -> Option<(f64, f64)> {
    let curve = curve.unwrap_or(&[]);
    finite_range(points.iter().chain(curve).map(|&(_, y)| y))
}

fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve.iter().filter(|(x, y)| x.is_finite() && y.is_finite()) {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, '-');
        } else {
            grid[row][col] = '-';
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_golden_snapshot_small() {
        let data = Measurement::new(vec![0.0, 1.0], vec![0.0, 1.0]);
        let curve = [(0.0, 0.0), (1.0, 1.0)];
        let txt = render_fit_plot(&data, &curve, 10, 5);
        let expected = concat!(
            "Plot: distance=[0.000, 1.000] um | force [pN]=[-0.05, 1.05]\n",
            "        -o\n",
            "      --  \n",
            "    --    \n",
            "  --      \n",
            "o-        \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn residual_plot_has_zero_line() {
        let txt = render_residual_plot(&[1.0, 2.0, 3.0], &[1.0, -1.0, 0.5], Axis::Force, 12, 5);
        let lines: Vec<&str> = txt.lines().collect();
        assert!(lines[0].starts_with("Plot: force=[1.000, 3.000] pN"));
        assert_eq!(lines.len(), 6);
        assert!(lines.iter().skip(1).any(|l| l.contains("--")));
        let marks: usize = lines[1..].iter().map(|l| l.matches('o').count()).sum();
        assert_eq!(marks, 3);
    }

    #[test]
    fn degenerate_data_does_not_panic() {
        let data = Measurement::new(vec![1.0], vec![2.0]);
        let txt = render_fit_plot(&data, &[], 3, 2);
        assert_eq!(txt.lines().count(), 6);
    }
}
