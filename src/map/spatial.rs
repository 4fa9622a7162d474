use std::collections::HashMap;

/// Spatial hash over EPSG:3857 meters for point hit-testing.
/// Stores only positions; the index of a point is its insertion order,
/// which is also its draw order.
pub struct SpatialGrid {
    /// Grid cells indexed by (cell_x, cell_y)
    cells: HashMap<(i64, i64), Vec<usize>>,
    positions: Vec<(f64, f64)>,
    /// Cell size in meters
    cell_size: f64,
}

impl SpatialGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            positions: Vec::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn to_cell(&self, x: f64, y: f64) -> (i64, i64) {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }

    /// Insert a point; returns its index
    pub fn insert(&mut self, x: f64, y: f64) -> usize {
        let idx = self.positions.len();
        self.positions.push((x, y));
        let cell = self.to_cell(x, y);
        self.cells.entry(cell).or_default().push(idx);
        idx
    }

    /// Candidate indices within a radius (may include points slightly outside)
    pub fn query_radius(&self, x: f64, y: f64, radius: f64) -> Vec<usize> {
        let cell_radius = (radius / self.cell_size).ceil() as i64;

        // Scanning every cell would cost more than scanning every point
        let span = 2 * cell_radius + 1;
        if span.saturating_mul(span) as usize >= self.positions.len() {
            return (0..self.positions.len()).collect();
        }

        let center = self.to_cell(x, y);
        let mut results = Vec::new();
        for dy in -cell_radius..=cell_radius {
            for dx in -cell_radius..=cell_radius {
                if let Some(indices) = self.cells.get(&(center.0 + dx, center.1 + dy)) {
                    results.extend_from_slice(indices);
                }
            }
        }
        results
    }

    /// Last-inserted point within `radius` of (x, y)
    pub fn topmost_within(&self, x: f64, y: f64, radius: f64) -> Option<usize> {
        let r2 = radius * radius;
        self.query_radius(x, y, radius)
            .into_iter()
            .filter(|&idx| {
                let (px, py) = self.positions[idx];
                let (dx, dy) = (px - x, py - y);
                dx * dx + dy * dy <= r2
            })
            .max()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.positions.clear();
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
