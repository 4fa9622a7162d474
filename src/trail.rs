//! The hand-drawn trail: an ordered list of clicked coordinates, its line
//! layer on the map and its plain-text export.

use crate::error::ExportError;
use crate::geo::LonLat;
use crate::map::MapComposition;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name the exported route is written under
pub const EXPORT_FILENAME: &str = "route.txt";

/// Ordered trail points in EPSG:4326
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trail {
    points: Vec<LonLat>,
}

impl Trail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: LonLat) {
        self.points.push(point);
    }

    /// Remove the last point; an empty trail stays empty
    pub fn pop(&mut self) -> Option<LonLat> {
        self.points.pop()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> &[LonLat] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A single-feature line layer in EPSG:3857 meters
#[derive(Clone, Debug, PartialEq)]
pub struct LineLayer {
    pub name: &'static str,
    pub coordinates: Vec<(f64, f64)>,
}

impl LineLayer {
    /// Line geometry over the trail, reprojected for display.
    /// An empty trail gives an empty geometry, which draws nothing.
    pub fn from_trail(trail: &Trail) -> Self {
        Self {
            name: "Line",
            coordinates: trail.points().iter().map(|p| p.to_mercator()).collect(),
        }
    }
}

/// Replace the map's trail layer with one built from the current trail
pub fn redraw(map: &mut MapComposition, trail: &Trail) {
    debug!(points = trail.len(), "redrawing trail");
    map.replace_trail_layer(LineLayer::from_trail(trail));
}

/// Every point as `lon,lat`, each followed by a newline
pub fn export_text(trail: &Trail) -> String {
    trail.points().iter().map(|p| format!("{}\n", p)).collect()
}

/// Write the export text to `dir/route.txt`
pub fn export_to(text: &str, dir: &Path) -> Result<PathBuf, ExportError> {
    let path = dir.join(EXPORT_FILENAME);
    fs::write(&path, text).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), bytes = text.len(), "route exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::lonlat_to_mercator;

    fn sample() -> Trail {
        let mut trail = Trail::new();
        trail.push(LonLat::new(18.65, -12.65));
        trail.push(LonLat::new(150.65, 12.65));
        trail
    }

    #[test]
    fn test_length_tracks_pushes_and_pops() {
        // (operations, expected length); `true` pushes, `false` pops
        let cases: &[(&[bool], usize)] = &[
            (&[true, true, false], 1),
            (&[false, false, true], 1),
            (&[true, false, false, false], 0),
            (&[true, true, true, false, true], 3),
        ];
        for (ops, expected) in cases {
            let mut trail = Trail::new();
            for &push in *ops {
                if push {
                    trail.push(LonLat::new(1.0, 2.0));
                } else {
                    trail.pop();
                }
            }
            assert_eq!(trail.len(), *expected, "{:?}", ops);
        }
    }

    #[test]
    fn test_pop_on_empty_is_noop() {
        let mut trail = Trail::new();
        assert_eq!(trail.pop(), None);
        assert!(trail.is_empty());
    }

    #[test]
    fn test_pop_removes_last() {
        let mut trail = sample();
        assert_eq!(trail.pop(), Some(LonLat::new(150.65, 12.65)));
        assert_eq!(trail.points(), &[LonLat::new(18.65, -12.65)]);
    }

    #[test]
    fn test_clear() {
        let mut trail = sample();
        trail.clear();
        assert!(trail.is_empty());
    }

    #[test]
    fn test_line_layer_is_reprojected() {
        let layer = LineLayer::from_trail(&sample());
        assert_eq!(layer.name, "Line");
        assert_eq!(layer.coordinates.len(), 2);
        assert_eq!(layer.coordinates[0], lonlat_to_mercator(18.65, -12.65));
    }

    #[test]
    fn test_empty_line_layer() {
        assert!(LineLayer::from_trail(&Trail::new()).coordinates.is_empty());
    }

    #[test]
    fn test_export_text_one_line_per_point() {
        let text = export_text(&sample());
        assert_eq!(text, "18.65,-12.65\n150.65,12.65\n");
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_export_empty_trail() {
        assert_eq!(export_text(&Trail::new()), "");
    }

    #[test]
    fn test_export_to_writes_route_file() {
        let dir = std::env::temp_dir().join(format!("trailmap-export-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = export_to("1,2\n", &dir).unwrap();
        assert_eq!(path.file_name().unwrap(), EXPORT_FILENAME);
        assert_eq!(fs::read_to_string(&path).unwrap(), "1,2\n");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_export_to_missing_dir_fails() {
        let err = export_to("", Path::new("/nonexistent/trailmap/dir")).unwrap_err();
        assert!(matches!(err, ExportError::Write { .. }));
    }
}
