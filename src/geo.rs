use std::f64::consts::PI;

/// Earth radius used by the spherical Web Mercator projection (EPSG:3857)
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Half the width of the EPSG:3857 world square in meters
pub const HALF_WORLD: f64 = PI * EARTH_RADIUS;

/// Latitude beyond which Web Mercator is undefined
const MAX_LAT: f64 = 85.0511287798066;

/// A geographic coordinate in EPSG:4326 degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Project into EPSG:3857 meters
    pub fn to_mercator(self) -> (f64, f64) {
        lonlat_to_mercator(self.lon, self.lat)
    }

    /// Inverse of [`LonLat::to_mercator`]
    pub fn from_mercator(x: f64, y: f64) -> Self {
        let (lon, lat) = mercator_to_lonlat(x, y);
        Self { lon, lat }
    }
}

/// Same text form as a JavaScript `[lon, lat].toString()`
impl std::fmt::Display for LonLat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", js_number(self.lon), js_number(self.lat))
    }
}

/// EPSG:4326 -> EPSG:3857
#[inline(always)]
pub fn lonlat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = EARTH_RADIUS * lon.to_radians();
    let lat = lat.clamp(-MAX_LAT, MAX_LAT);
    let y = EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// EPSG:3857 -> EPSG:4326
#[inline(always)]
pub fn mercator_to_lonlat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = 360.0 * (y / EARTH_RADIUS).exp().atan() / PI - 90.0;
    (lon, lat)
}

/// Format a number the way JavaScript's `Number.prototype.toString` does.
///
/// Rust's `Display` already yields the shortest round-trip digits; JS only
/// differs in switching to exponent form outside `[1e-6, 1e21)`, the sign of
/// the exponent, negative zero and the non-finite spellings.
pub fn js_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let formatted = format!("{:e}", value);
        match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => formatted,
        }
    } else {
        format!("{}", value)
    }
}
