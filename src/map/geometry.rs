use crate::braille::{BrailleCanvas, Rgb};

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_dot(x, y, color);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Clip a segment to an axis-aligned box (Liang-Barsky).
/// Returns the visible part, or `None` if the segment misses the box.
pub fn clip_segment(
    p0: (f64, f64),
    p1: (f64, f64),
    min: (f64, f64),
    max: (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let dx = p1.0 - p0.0;
    let dy = p1.1 - p0.1;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    for (p, q) in [
        (-dx, p0.0 - min.0),
        (dx, max.0 - p0.0),
        (-dy, p0.1 - min.1),
        (dy, max.1 - p0.1),
    ] {
        if p == 0.0 {
            // Parallel to this edge and outside it
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((
        (p0.0 + t0 * dx, p0.1 + t0 * dy),
        (p0.0 + t1 * dx, p0.1 + t1 * dy),
    ))
}

/// Draw a filled disc
pub fn draw_disc(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32, color: Rgb) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_dot(cx + dx, cy + dy, color);
            }
        }
    }
}

/// Draw the outline of a circle, `width` dots thick, centered on `radius`
pub fn draw_ring(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32, width: i32, color: Rgb) {
    let outer = radius + width / 2;
    let inner = (radius - (width - width / 2)).max(0);
    for dy in -outer..=outer {
        for dx in -outer..=outer {
            let d2 = dx * dx + dy * dy;
            if d2 <= outer * outer && d2 > inner * inner {
                canvas.set_dot(cx + dx, cy + dy, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb = (255, 255, 255);

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0, WHITE);
        assert_eq!(canvas.to_string(), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7, WHITE);
        assert_eq!(canvas.to_string(), "⡇\n⡇");
    }

    #[test]
    fn test_single_point_line() {
        let mut canvas = BrailleCanvas::new(1, 1);
        draw_line(&mut canvas, 1, 1, 1, 1, WHITE);
        assert_eq!(canvas.inked_cells(), 1);
    }

    #[test]
    fn test_clip_segment() {
        let (min, max) = ((0.0, 0.0), (10.0, 10.0));

        // Fully inside: untouched
        assert_eq!(
            clip_segment((1.0, 1.0), (9.0, 5.0), min, max),
            Some(((1.0, 1.0), (9.0, 5.0)))
        );

        // Crossing the box is cut at both edges
        assert_eq!(
            clip_segment((-10.0, 5.0), (30.0, 5.0), min, max),
            Some(((0.0, 5.0), (10.0, 5.0)))
        );

        // Entirely outside, including parallel to an edge
        assert_eq!(clip_segment((-5.0, -5.0), (-1.0, 20.0), min, max), None);
        assert_eq!(clip_segment((0.0, -1.0), (10.0, -1.0), min, max), None);
        assert_eq!(clip_segment((-3.0, 0.0), (0.0, -3.0), min, max), None);
    }

    #[test]
    fn test_disc_covers_center_and_ring_does_not() {
        let mut disc = BrailleCanvas::new(8, 4);
        draw_disc(&mut disc, 8, 8, 3, WHITE);
        assert!(disc.cell(4, 2).is_some());

        let mut ring = BrailleCanvas::new(8, 4);
        draw_ring(&mut ring, 8, 8, 5, 1, WHITE);
        assert!(ring.cell(4, 2).is_none());
        assert!(ring.inked_cells() > 0);
    }
}
