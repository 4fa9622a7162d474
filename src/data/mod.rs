pub mod kml;

use crate::error::FeatureError;
use crate::geo::LonLat;
use geojson::{GeoJson, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use tracing::{debug, info, warn};

/// Marker category encoded in a feature name
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Category {
    /// Flag parsed as zero
    Zero,
    /// Any other numeric flag
    Nonzero(f64),
    /// No numeric prefix at the flag offset
    Unparsed,
}

/// A placemark name decoded into its fixed-offset parts.
///
/// Layout by character offset: `[2..]` starts with the numeric category
/// flag, `[4..8]` is the detail panel id and `[10..]` is the display label.
/// Short names yield empty or truncated parts rather than errors.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureName {
    pub raw: String,
    pub category: Category,
    pub id: String,
    pub label: String,
}

impl FeatureName {
    pub fn decode(raw: &str) -> Self {
        let category = match parse_float_prefix(&char_slice(raw, 2, None)) {
            Some(flag) if flag == 0.0 => Category::Zero,
            Some(flag) => Category::Nonzero(flag),
            None => Category::Unparsed,
        };

        Self {
            raw: raw.to_string(),
            category,
            id: char_slice(raw, 4, Some(8)),
            label: char_slice(raw, 10, None),
        }
    }
}

/// A point of the marker layer
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub name: FeatureName,
    pub position: LonLat,
    pub description: Option<String>,
}

impl Feature {
    pub fn new(name: &str, position: LonLat, description: Option<String>) -> Self {
        Self {
            name: FeatureName::decode(name),
            position,
            description,
        }
    }
}

/// Substring by character offsets, saturating at the end of the string
fn char_slice(s: &str, start: usize, end: Option<usize>) -> String {
    let chars = s.chars().skip(start);
    match end {
        Some(end) => chars.take(end.saturating_sub(start)).collect(),
        None => chars.collect(),
    }
}

/// Longest leading decimal literal, after leading whitespace.
/// Returns `None` where JavaScript's `parseFloat` would give `NaN`.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        return s[..end + "Infinity".len()].parse().ok();
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        // "5." is a complete literal, a lone "." is not
        if frac_end > frac_start || digits > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// Where the marker layer's features come from
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureSource {
    Url(String),
    Path(PathBuf),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Format {
    Kml,
    GeoJson,
}

impl FeatureSource {
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            FeatureSource::Url(location.to_string())
        } else {
            FeatureSource::Path(PathBuf::from(location))
        }
    }

    fn location(&self) -> String {
        match self {
            FeatureSource::Url(url) => url.clone(),
            FeatureSource::Path(path) => path.display().to_string(),
        }
    }

    /// GeoJSON by extension, KML otherwise
    fn format(&self) -> Format {
        let location = self.location().to_ascii_lowercase();
        let location = location.split(['?', '#']).next().unwrap_or_default();
        if location.ends_with(".geojson") || location.ends_with(".json") {
            Format::GeoJson
        } else {
            Format::Kml
        }
    }

    fn fetch(&self) -> Result<String, FeatureError> {
        match self {
            FeatureSource::Url(url) => reqwest::blocking::get(url)
                .and_then(|response| response.error_for_status())
                .and_then(|response| response.text())
                .map_err(|source| FeatureError::Fetch {
                    url: url.clone(),
                    source,
                }),
            FeatureSource::Path(path) => read_file(path),
        }
    }
}

fn read_file(path: &Path) -> Result<String, FeatureError> {
    fs::read_to_string(path).map_err(|source| FeatureError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Fetch and parse all point features of a source
pub fn load_features(source: &FeatureSource) -> Result<Vec<Feature>, FeatureError> {
    let content = source.fetch()?;
    debug!(bytes = content.len(), source = %source.location(), "feature document fetched");
    match source.format() {
        Format::Kml => Ok(kml::parse_placemarks(&content)?),
        Format::GeoJson => parse_geojson(&content),
    }
}

/// Load features on a background thread.
///
/// The receiver yields exactly one batch. A failed load is logged and
/// delivered as an empty batch, leaving the marker layer empty.
pub fn spawn_loader(source: FeatureSource) -> Receiver<Vec<Feature>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let features = match load_features(&source) {
            Ok(features) => {
                info!(count = features.len(), source = %source.location(), "features loaded");
                features
            }
            Err(e) => {
                warn!(error = %e, "feature layer left empty");
                Vec::new()
            }
        };
        let _ = tx.send(features);
    });
    rx
}

/// Point features of a GeoJSON document, named by their `name` property
fn parse_geojson(content: &str) -> Result<Vec<Feature>, FeatureError> {
    let geojson: GeoJson = content.parse()?;
    let mut features = Vec::new();

    let items = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => Vec::new(),
    };

    for feature in items {
        let props = feature.properties.as_ref();

        let name = props
            .and_then(|p| p.get("name"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let description = props
            .and_then(|p| p.get("description"))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        if let Some(geometry) = feature.geometry {
            if let Value::Point(coords) = geometry.value {
                if coords.len() >= 2 {
                    features.push(Feature::new(&name, LonLat::new(coords[0], coords[1]), description));
                }
            }
        }
    }

    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_well_formed_name() {
        let name = FeatureName::decode("A 0 0042: Syonan Jinja");
        assert_eq!(name.category, Category::Zero);
        assert_eq!(name.id, "0042");
        assert_eq!(name.label, "Syonan Jinja");
    }

    #[test]
    fn test_decode_nonzero_flag() {
        let name = FeatureName::decode("xx2.5 0099: Label");
        assert_eq!(name.category, Category::Nonzero(2.5));
    }

    #[test]
    fn test_decode_short_and_malformed_names() {
        let name = FeatureName::decode("ab");
        assert_eq!(name.category, Category::Unparsed);
        assert_eq!(name.id, "");
        assert_eq!(name.label, "");

        let name = FeatureName::decode("abcdef");
        assert_eq!(name.category, Category::Unparsed);
        assert_eq!(name.id, "ef");

        let name = FeatureName::decode("");
        assert_eq!(name.category, Category::Unparsed);
    }

    #[test]
    fn test_decode_counts_characters_not_bytes() {
        let name = FeatureName::decode("é 0 ñ123: Café");
        assert_eq!(name.category, Category::Zero);
        assert_eq!(name.id, "ñ123");
        assert_eq!(name.label, "Café");
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("0 0042"), Some(0.0));
        assert_eq!(parse_float_prefix("  -1.5abc"), Some(-1.5));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("5."), Some(5.0));
        assert_eq!(parse_float_prefix("1e3x"), Some(1000.0));
        assert_eq!(parse_float_prefix("1e"), Some(1.0));
        assert_eq!(parse_float_prefix("1.e5"), Some(100000.0));
        assert_eq!(parse_float_prefix("2.x"), Some(2.0));
        assert_eq!(parse_float_prefix(".e5"), None);
        assert_eq!(parse_float_prefix("-0"), Some(-0.0));
        assert_eq!(parse_float_prefix("Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_float_prefix("."), None);
        assert_eq!(parse_float_prefix("x1"), None);
        assert_eq!(parse_float_prefix(""), None);
    }

    #[test]
    fn test_negative_zero_flag_is_zero() {
        assert_eq!(FeatureName::decode("ab-0 0001: z").category, Category::Zero);
    }

    #[test]
    fn test_source_detection() {
        assert_eq!(
            FeatureSource::parse("http://example.com/places.kml"),
            FeatureSource::Url("http://example.com/places.kml".to_string())
        );
        assert_eq!(
            FeatureSource::parse("data/places.geojson"),
            FeatureSource::Path(PathBuf::from("data/places.geojson"))
        );
        assert_eq!(FeatureSource::parse("data/places.geojson").format(), Format::GeoJson);
        assert_eq!(FeatureSource::parse("https://x/p.kml?v=2").format(), Format::Kml);
        assert_eq!(FeatureSource::parse("https://x/places").format(), Format::Kml);
    }

    #[test]
    fn test_parse_geojson_points() {
        let doc = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature",
                 "properties": {"name": "A 1 0007: Pier", "description": "old pier"},
                 "geometry": {"type": "Point", "coordinates": [103.85, 1.28]}},
                {"type": "Feature",
                 "properties": {"name": "line"},
                 "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}}
            ]
        }"#;
        let features = parse_geojson(doc).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].name.id, "0007");
        assert_eq!(features[0].description.as_deref(), Some("old pier"));
        assert_eq!(features[0].position, LonLat::new(103.85, 1.28));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let source = FeatureSource::Path(PathBuf::from("/nonexistent/places.kml"));
        assert!(matches!(load_features(&source), Err(FeatureError::Read { .. })));
    }

    #[test]
    fn test_loader_delivers_empty_batch_on_failure() {
        let rx = spawn_loader(FeatureSource::Path(PathBuf::from("/nonexistent/places.kml")));
        assert!(rx.recv().unwrap().is_empty());
    }

    #[test]
    fn test_loads_local_kml() {
        let path = std::env::temp_dir().join(format!("trailmap-{}.kml", std::process::id()));
        fs::write(
            &path,
            "<kml><Placemark><name>A 0 0001: One</name><Point><coordinates>1,2</coordinates></Point></Placemark></kml>",
        )
        .unwrap();
        let features = load_features(&FeatureSource::Path(path.clone())).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].name.label, "One");
    }
}
