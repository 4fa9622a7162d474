use crate::geo::{LonLat, HALF_WORLD};

/// Meters per CSS pixel at zoom 0 for 256px tiles
pub const RESOLUTION_Z0: f64 = 2.0 * HALF_WORLD / 256.0;

/// CSS pixels covered by one Braille dot
pub const PX_PER_DOT: f64 = 4.0;

pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 19.0;

/// Visible map area: an EPSG:3857 center, a zoom level and the canvas size
/// in Braille dots
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center easting in meters
    pub center_x: f64,
    /// Center northing in meters
    pub center_y: f64,
    /// Slippy-map zoom level (fractional allowed)
    pub zoom: f64,
    /// Canvas dot width
    pub width: usize,
    /// Canvas dot height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_x: f64, center_y: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_x,
            center_y,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    /// Meters per CSS pixel
    pub fn resolution(&self) -> f64 {
        RESOLUTION_Z0 / 2f64.powf(self.zoom)
    }

    /// Meters per Braille dot
    pub fn meters_per_dot(&self) -> f64 {
        self.resolution() * PX_PER_DOT
    }

    /// Pan the viewport by a dot delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let mpd = self.meters_per_dot();
        self.center_x += dx as f64 * mpd;
        self.center_y -= dy as f64 * mpd;

        // Wrap easting across the antimeridian
        if self.center_x > HALF_WORLD {
            self.center_x -= 2.0 * HALF_WORLD;
        } else if self.center_x < -HALF_WORLD {
            self.center_x += 2.0 * HALF_WORLD;
        }

        self.center_y = self.center_y.clamp(-HALF_WORLD, HALF_WORLD);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1.0).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - 1.0).max(MIN_ZOOM);
    }

    /// Zoom in keeping the point under a dot position fixed
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0);
    }

    /// Zoom out keeping the point under a dot position fixed
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, -1.0);
    }

    fn zoom_at(&mut self, px: i32, py: i32, delta: f64) {
        let (x, y) = self.unproject(px, py);
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);

        // Re-center so (x, y) lands back under the pointer
        let mpd = self.meters_per_dot();
        self.center_x = x - (px as f64 + 0.5 - self.width as f64 / 2.0) * mpd;
        self.center_y = y + (py as f64 + 0.5 - self.height as f64 / 2.0) * mpd;
    }

    /// Dot position -> EPSG:3857 meters at the dot's center
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let mpd = self.meters_per_dot();
        let x = self.center_x + (px as f64 + 0.5 - self.width as f64 / 2.0) * mpd;
        let y = self.center_y - (py as f64 + 0.5 - self.height as f64 / 2.0) * mpd;
        (x, y)
    }

    /// EPSG:3857 meters -> dot position
    pub fn project(&self, x: f64, y: f64) -> (i32, i32) {
        let (px, py) = self.project_exact(x, y);
        (px.floor() as i32, py.floor() as i32)
    }

    /// EPSG:3857 meters -> fractional dot coordinates, unbounded
    pub fn project_exact(&self, x: f64, y: f64) -> (f64, f64) {
        let mpd = self.meters_per_dot();
        let px = (x - self.center_x) / mpd + self.width as f64 / 2.0;
        let py = (self.center_y - y) / mpd + self.height as f64 / 2.0;
        (px, py)
    }

    /// Dot position -> geographic coordinate
    pub fn unproject_lonlat(&self, px: i32, py: i32) -> LonLat {
        let (x, y) = self.unproject(px, py);
        LonLat::from_mercator(x, y)
    }

    pub fn center_lonlat(&self) -> LonLat {
        LonLat::from_mercator(self.center_x, self.center_y)
    }

    /// Check if a projected point is visible in the viewport, with a margin
    pub fn is_visible(&self, px: i32, py: i32, margin: i32) -> bool {
        px >= -margin
            && px < self.width as i32 + margin
            && py >= -margin
            && py < self.height as i32 + margin
    }
}
