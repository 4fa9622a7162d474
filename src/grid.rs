//! Local grid readouts derived from a clicked geographic coordinate.
//!
//! Each axis is an independent linear fit of the form `a * value - b`,
//! snapped to the nearest multiple of five.

use crate::geo::{js_number, LonLat};

const EASTING_SCALE: f64 = 11143.9470923771;
const EASTING_OFFSET: f64 = 1154313.21445949;
const NORTHING_SCALE: f64 = 11087.0631752153;
const NORTHING_OFFSET: f64 = 11278.1652488995;

/// Grid step the fitted values are snapped to
const STEP: f64 = 5.0;

/// A derived easting/northing pair
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridRef {
    pub easting: f64,
    pub northing: f64,
}

impl GridRef {
    pub fn from_lonlat(pos: LonLat) -> Self {
        Self {
            easting: snap(EASTING_SCALE * pos.lon - EASTING_OFFSET),
            northing: snap(NORTHING_SCALE * pos.lat - NORTHING_OFFSET),
        }
    }

    pub fn easting_text(&self) -> String {
        js_number(self.easting)
    }

    pub fn northing_text(&self) -> String {
        js_number(self.northing)
    }
}

#[inline(always)]
fn snap(value: f64) -> f64 {
    STEP * js_round(value / STEP)
}

/// `Math.round`: nearest integer, halves toward positive infinity
#[inline(always)]
pub fn js_round(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_round_halves() {
        assert_eq!(js_round(2.5), 3.0);
        assert_eq!(js_round(-2.5), -2.0);
        assert_eq!(js_round(-2.6), -3.0);
        assert_eq!(js_round(0.49), 0.0);
    }

    #[test]
    fn test_known_points() {
        let g = GridRef::from_lonlat(LonLat::new(103.82, 1.35));
        assert_eq!(g.easting, 2650.0);
        assert_eq!(g.northing, 3690.0);

        let g = GridRef::from_lonlat(LonLat::new(103.6, 1.2));
        assert_eq!(g.easting, 200.0);
        assert_eq!(g.northing, 2025.0);
    }

    #[test]
    fn test_matches_formula() {
        for &(lon, lat) in &[(103.7, 1.31), (104.01, 1.44), (0.0, 0.0), (-73.9, 40.7)] {
            let g = GridRef::from_lonlat(LonLat::new(lon, lat));
            let e = 5.0 * js_round((11143.9470923771 * lon - 1154313.21445949) / 5.0);
            let n = 5.0 * js_round((11087.0631752153 * lat - 11278.1652488995) / 5.0);
            assert_eq!(g.easting, e);
            assert_eq!(g.northing, n);
            assert_eq!(g.easting % 5.0, 0.0);
        }
    }

    #[test]
    fn test_readout_text_is_integral() {
        let g = GridRef::from_lonlat(LonLat::new(103.8505, 1.29));
        assert_eq!(g.easting_text(), "2990");
        assert_eq!(g.northing_text(), "3025");
    }
}
