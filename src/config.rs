use crate::data::FeatureSource;
use crate::geo::lonlat_to_mercator;
use crate::map::tiles::{OSM_ATTRIBUTION, OSM_TEMPLATE};
use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_FEATURES: &str = "http://potatoesareawesome.x10host.com/map/places2.kml";

/// Initial view center in EPSG:3857 meters
pub const DEFAULT_CENTER: (f64, f64) = (11557246.937839996, 149893.0886866448);

pub const DEFAULT_ZOOM: f64 = 11.0;

#[derive(Parser, Debug)]
#[command(name = "trailmap", version, about = "Interactive terminal map with trail drawing")]
pub struct Cli {
    /// KML or GeoJSON document (URL or local path) with the point markers
    #[arg(long, default_value = DEFAULT_FEATURES)]
    pub features: String,

    /// Base layer tile URL template with {z}, {x} and {y} placeholders
    #[arg(long, default_value = OSM_TEMPLATE)]
    pub tiles: String,

    /// Attribution shown for the base layer
    #[arg(long, default_value = OSM_ATTRIBUTION)]
    pub attribution: String,

    /// Do not fetch base layer tiles
    #[arg(long)]
    pub no_tiles: bool,

    /// Initial center longitude (degrees)
    #[arg(long, requires = "center_lat", allow_hyphen_values = true)]
    pub center_lon: Option<f64>,

    /// Initial center latitude (degrees)
    #[arg(long, requires = "center_lon", allow_hyphen_values = true)]
    pub center_lat: Option<f64>,

    /// Initial zoom level
    #[arg(long, default_value_t = DEFAULT_ZOOM)]
    pub zoom: f64,

    /// Directory the exported route.txt is written to
    #[arg(long, default_value = ".")]
    pub export_dir: PathBuf,

    /// Log file (the terminal is owned by the map)
    #[arg(long, default_value = "trailmap.log")]
    pub log_file: PathBuf,

    /// Log filter directive, e.g. `debug` or `trailmap=trace`; overrides RUST_LOG
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub features: FeatureSource,
    pub tile_template: String,
    pub attribution: String,
    pub offline: bool,
    /// View center in EPSG:3857 meters
    pub center: (f64, f64),
    pub zoom: f64,
    pub export_dir: PathBuf,
    pub log_file: PathBuf,
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            features: FeatureSource::parse(DEFAULT_FEATURES),
            tile_template: OSM_TEMPLATE.to_string(),
            attribution: OSM_ATTRIBUTION.to_string(),
            offline: false,
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            export_dir: PathBuf::from("."),
            log_file: PathBuf::from("trailmap.log"),
            log_level: None,
        }
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        let center = match (cli.center_lon, cli.center_lat) {
            (Some(lon), Some(lat)) => lonlat_to_mercator(lon, lat),
            _ => DEFAULT_CENTER,
        };

        Config {
            features: FeatureSource::parse(&cli.features),
            tile_template: cli.tiles,
            attribution: cli.attribution,
            offline: cli.no_tiles,
            center,
            zoom: cli.zoom,
            export_dir: cli.export_dir,
            log_file: cli.log_file,
            log_level: cli.log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_match_config_defaults() {
        let config = Config::from(Cli::parse_from(["trailmap"]));
        let default = Config::default();
        assert_eq!(config.features, default.features);
        assert_eq!(config.tile_template, default.tile_template);
        assert_eq!(config.center, DEFAULT_CENTER);
        assert_eq!(config.zoom, 11.0);
        assert!(!config.offline);
    }

    #[test]
    fn test_center_override_is_projected() {
        let cli = Cli::parse_from([
            "trailmap",
            "--center-lon",
            "-73.98",
            "--center-lat",
            "40.75",
            "--no-tiles",
            "--features",
            "places.geojson",
        ]);
        let config = Config::from(cli);
        assert_eq!(config.center, lonlat_to_mercator(-73.98, 40.75));
        assert!(config.offline);
        assert_eq!(config.features, FeatureSource::Path(PathBuf::from("places.geojson")));
    }

    #[test]
    fn test_center_needs_both_axes() {
        assert!(Cli::try_parse_from(["trailmap", "--center-lon", "1"]).is_err());
    }
}
