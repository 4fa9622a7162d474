/// Opaque terminal color
pub type Rgb = (u8, u8, u8);

/// Braille Unicode canvas with one color per character cell.
/// Each character cell represents a 2x4 dot grid (8 dots); the cell takes
/// the color of the last dot drawn into it.
/// Unicode Braille patterns: U+2800 to U+28FF
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    dots: Vec<u8>, // Bit pattern per char, row-major
    colors: Vec<Option<Rgb>>,
}

impl BrailleCanvas {
    /// Create a new canvas with the given character dimensions.
    /// Effective dot resolution: width*2 x height*4
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            dots: vec![0; width * height],
            colors: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bit for a dot within its cell.
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    #[inline(always)]
    fn dot_bit(x: usize, y: usize) -> u8 {
        match (x % 2, y % 4) {
            (0, 0) => 0x01,
            (1, 0) => 0x08,
            (0, 1) => 0x02,
            (1, 1) => 0x10,
            (0, 2) => 0x04,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            _ => 0x80,
        }
    }

    /// Set a dot and color its cell; out-of-range and negative dots are ignored
    pub fn set_dot(&mut self, x: i32, y: i32, color: Rgb) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return;
        }

        let idx = cy * self.width + cx;
        self.dots[idx] |= Self::dot_bit(x, y);
        self.colors[idx] = Some(color);
    }

    /// Glyph and color of a cell, `None` when no dot is set
    pub fn cell(&self, col: usize, row: usize) -> Option<(char, Rgb)> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let idx = row * self.width + col;
        let bits = self.dots[idx];
        if bits == 0 {
            return None;
        }
        let ch = char::from_u32(0x2800 + bits as u32).unwrap_or(' ');
        Some((ch, self.colors[idx].unwrap_or((255, 255, 255))))
    }

    /// Number of cells with at least one dot
    pub fn inked_cells(&self) -> usize {
        self.dots.iter().filter(|&&b| b != 0).count()
    }

    /// The glyphs as text, one line per row
    #[cfg(test)]
    pub fn to_string(&self) -> String {
        (0..self.height)
            .map(|row| {
                (0..self.width)
                    .map(|col| self.cell(col, row).map(|(ch, _)| ch).unwrap_or('\u{2800}'))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb = (255, 255, 255);

    #[test]
    fn test_single_dot() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_dot(0, 0, WHITE);
        assert_eq!(canvas.to_string(), "⠁"); // U+2801
    }

    #[test]
    fn test_all_dots() {
        let mut canvas = BrailleCanvas::new(1, 1);
        for x in 0..2 {
            for y in 0..4 {
                canvas.set_dot(x, y, WHITE);
            }
        }
        assert_eq!(canvas.to_string(), "⣿"); // U+28FF (all dots)
    }

    #[test]
    fn test_diagonal() {
        let mut canvas = BrailleCanvas::new(2, 1);
        for i in 0..4 {
            canvas.set_dot(i, i, WHITE);
        }
        // First char: (0,0) and (1,1) = 0x01 | 0x10 = 0x11
        // Second char: (0,2) and (1,3) = 0x04 | 0x80 = 0x84
        assert_eq!(canvas.to_string(), "⠑⢄");
    }

    #[test]
    fn test_last_color_wins() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_dot(0, 0, (1, 2, 3));
        canvas.set_dot(1, 1, (4, 5, 6));
        assert_eq!(canvas.cell(0, 0).map(|(_, c)| c), Some((4, 5, 6)));
    }

    #[test]
    fn test_out_of_range_ignored() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_dot(-1, 0, WHITE);
        canvas.set_dot(2, 0, WHITE);
        canvas.set_dot(0, 4, WHITE);
        assert_eq!(canvas.inked_cells(), 0);
        assert_eq!(canvas.cell(5, 5), None);
    }
}
