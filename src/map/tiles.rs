//! Raster base layer: slippy-map tile addressing, background fetching and
//! an in-memory tile cache sampled per terminal cell.

use crate::error::TileError;
use crate::geo::HALF_WORLD;
use crate::map::projection::{Viewport, MAX_ZOOM, MIN_ZOOM};
use image::RgbImage;
use moka::sync::Cache;
use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

pub const TILE_SIZE: u32 = 256;

const FETCH_WORKERS: usize = 4;
const CACHE_CAPACITY: u64 = 512;
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub const OSM_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const OSM_ATTRIBUTION: &str = "© OpenStreetMap contributors";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

/// Anything that can produce a tile URL
pub trait TileSource: Send + Sync {
    fn url(&self, tile: TileId) -> String;

    fn attribution(&self) -> &str;
}

/// A `{z}/{x}/{y}` URL template
pub struct UrlTemplateSource {
    template: String,
    attribution: String,
}

impl UrlTemplateSource {
    pub fn new(template: &str, attribution: &str) -> Self {
        Self {
            template: template.to_string(),
            attribution: attribution.to_string(),
        }
    }

    pub fn openstreetmap() -> Self {
        Self::new(OSM_TEMPLATE, OSM_ATTRIBUTION)
    }
}

impl TileSource for UrlTemplateSource {
    fn url(&self, tile: TileId) -> String {
        self.template
            .replace("{z}", &tile.z.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }

    fn attribution(&self) -> &str {
        &self.attribution
    }
}

/// Tile zoom level used for a (possibly fractional) view zoom
pub fn tile_zoom(zoom: f64) -> u8 {
    zoom.round().clamp(MIN_ZOOM, MAX_ZOOM) as u8
}

/// Tile edge length in meters at a tile zoom
#[inline(always)]
fn tile_span(z: u8) -> f64 {
    2.0 * HALF_WORLD / (1u64 << z) as f64
}

/// Tile containing an EPSG:3857 point, plus the pixel within it.
/// Eastings wrap around the antimeridian; northings off the world are `None`.
pub fn tile_at(x: f64, y: f64, z: u8) -> Option<(TileId, u32, u32)> {
    let span = tile_span(z);
    let count = 1u64 << z;
    let fx = (x + HALF_WORLD).rem_euclid(2.0 * HALF_WORLD) / span;
    let fy = (HALF_WORLD - y) / span;
    if !(0.0..count as f64).contains(&fy) {
        return None;
    }

    let tx = (fx.floor() as u64).min(count - 1);
    let ty = (fy.floor() as u64).min(count - 1);
    let px = (((fx - tx as f64) * TILE_SIZE as f64) as u32).min(TILE_SIZE - 1);
    let py = (((fy - ty as f64) * TILE_SIZE as f64) as u32).min(TILE_SIZE - 1);

    Some((
        TileId {
            z,
            x: tx as u32,
            y: ty as u32,
        },
        px,
        py,
    ))
}

/// Tiles overlapping the viewport at its tile zoom
pub fn visible_tiles(viewport: &Viewport) -> Vec<TileId> {
    let z = tile_zoom(viewport.zoom);
    let span = tile_span(z);
    let count = 1i64 << z;

    let (min_x, max_y) = viewport.unproject(0, 0);
    let (max_x, min_y) = viewport.unproject(viewport.width as i32, viewport.height as i32);

    let first_col = ((min_x + HALF_WORLD) / span).floor() as i64;
    let last_col = ((max_x + HALF_WORLD) / span).floor() as i64;
    let first_row = (((HALF_WORLD - max_y) / span).floor() as i64).max(0);
    let last_row = (((HALF_WORLD - min_y) / span).floor() as i64).min(count - 1);

    let mut tiles = Vec::new();
    let mut seen = HashSet::new();
    for row in first_row..=last_row {
        for col in first_col..=last_col {
            let tile = TileId {
                z,
                x: col.rem_euclid(count) as u32,
                y: row as u32,
            };
            if seen.insert(tile) {
                tiles.push(tile);
            }
        }
    }
    tiles
}

type FetchResult = (TileId, Result<RgbImage, TileError>);

/// Base raster layer with a pool of fetch workers.
///
/// Each tile is requested at most once: successes land in the cache,
/// failures are remembered and never retried.
pub struct TileLayer {
    source: Arc<dyn TileSource>,
    cache: Cache<TileId, Arc<RgbImage>>,
    pending: HashSet<TileId>,
    failed: HashSet<TileId>,
    requests: Option<Sender<TileId>>,
    results: Option<Receiver<FetchResult>>,
}

impl TileLayer {
    /// A layer that fetches from `source` in the background
    pub fn new(source: Arc<dyn TileSource>) -> Self {
        let mut layer = Self::offline(source);

        let client = match reqwest::blocking::Client::builder()
            .user_agent(concat!("trailmap/", env!("CARGO_PKG_VERSION")))
            .timeout(FETCH_TIMEOUT)
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "HTTP client unavailable, base layer disabled");
                return layer;
            }
        };

        let (req_tx, req_rx) = mpsc::channel::<TileId>();
        let (res_tx, res_rx) = mpsc::channel::<FetchResult>();
        let req_rx = Arc::new(Mutex::new(req_rx));

        for _ in 0..FETCH_WORKERS {
            let req_rx = Arc::clone(&req_rx);
            let res_tx = res_tx.clone();
            let client = client.clone();
            let source = Arc::clone(&layer.source);
            thread::spawn(move || loop {
                let next = match req_rx.lock() {
                    Ok(rx) => rx.recv(),
                    Err(_) => break,
                };
                let Ok(tile) = next else { break };
                let result = fetch_tile(&client, &source.url(tile));
                if res_tx.send((tile, result)).is_err() {
                    break;
                }
            });
        }

        layer.requests = Some(req_tx);
        layer.results = Some(res_rx);
        layer
    }

    /// A layer that never fetches; every cell stays blank
    pub fn offline(source: Arc<dyn TileSource>) -> Self {
        Self {
            source,
            cache: Cache::new(CACHE_CAPACITY),
            pending: HashSet::new(),
            failed: HashSet::new(),
            requests: None,
            results: None,
        }
    }

    pub fn is_online(&self) -> bool {
        self.requests.is_some()
    }

    pub fn attribution(&self) -> &str {
        self.source.attribution()
    }

    /// Queue fetches for visible tiles not yet cached, pending or failed
    pub fn request_visible(&mut self, viewport: &Viewport) {
        let Some(requests) = &self.requests else {
            return;
        };
        for tile in visible_tiles(viewport) {
            if self.cache.contains_key(&tile)
                || self.pending.contains(&tile)
                || self.failed.contains(&tile)
            {
                continue;
            }
            debug!(z = tile.z, x = tile.x, y = tile.y, "requesting tile");
            if requests.send(tile).is_ok() {
                self.pending.insert(tile);
            }
        }
    }

    /// Collect finished fetches; returns true if any tile arrived
    pub fn poll(&mut self) -> bool {
        let Some(results) = &self.results else {
            return false;
        };
        let mut arrived = false;
        while let Ok((tile, result)) = results.try_recv() {
            self.pending.remove(&tile);
            match result {
                Ok(image) => {
                    self.cache.insert(tile, Arc::new(image));
                    arrived = true;
                }
                Err(e) => {
                    warn!(z = tile.z, x = tile.x, y = tile.y, error = %e, "tile unavailable");
                    self.failed.insert(tile);
                }
            }
        }
        arrived
    }

    /// Insert an already decoded tile
    pub fn insert(&mut self, tile: TileId, image: RgbImage) {
        self.pending.remove(&tile);
        self.cache.insert(tile, Arc::new(image));
    }

    /// Color of the base map at an EPSG:3857 point, if its tile is loaded
    pub fn sample(&self, x: f64, y: f64, z: u8) -> Option<(u8, u8, u8)> {
        let (tile, px, py) = tile_at(x, y, z)?;
        let image = self.cache.get(&tile)?;
        if px >= image.width() || py >= image.height() {
            return None;
        }
        let p = image.get_pixel(px, py);
        Some((p[0], p[1], p[2]))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

fn fetch_tile(client: &reqwest::blocking::Client, url: &str) -> Result<RgbImage, TileError> {
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(TileError::Status(status));
    }
    let bytes = response.bytes()?;
    Ok(image::load_from_memory(&bytes)?.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_url_template() {
        let source = UrlTemplateSource::openstreetmap();
        let url = source.url(TileId { z: 11, x: 1614, y: 1016 });
        assert_eq!(url, "https://tile.openstreetmap.org/11/1614/1016.png");
        assert_eq!(source.attribution(), OSM_ATTRIBUTION);
    }

    #[test]
    fn test_tile_at_world_corners() {
        let (tile, px, py) = tile_at(-HALF_WORLD, HALF_WORLD - 1.0, 0).unwrap();
        assert_eq!(tile, TileId { z: 0, x: 0, y: 0 });
        assert_eq!((px, py), (0, 0));

        let (tile, _, _) = tile_at(1.0, -1.0, 1).unwrap();
        assert_eq!(tile, TileId { z: 1, x: 1, y: 1 });
    }

    #[test]
    fn test_tile_at_wraps_and_rejects_poles() {
        let (tile, _, _) = tile_at(HALF_WORLD + 10.0, 0.0, 2).unwrap();
        assert_eq!(tile.x, 0);
        assert!(tile_at(0.0, HALF_WORLD + 10.0, 2).is_none());
    }

    #[test]
    fn test_singapore_tile() {
        let (tile, _, _) = tile_at(11557246.937839996, 149893.0886866448, 11).unwrap();
        assert_eq!(tile, TileId { z: 11, x: 1614, y: 1016 });
    }

    #[test]
    fn test_visible_tiles_cover_center() {
        let vp = Viewport::new(11557246.937839996, 149893.0886866448, 11.0, 160, 96);
        let tiles = visible_tiles(&vp);
        assert!(tiles.contains(&TileId { z: 11, x: 1614, y: 1016 }));
        assert!(tiles.iter().all(|t| t.z == 11));
        // 640x384 CSS px spans at most 4x3 tiles
        assert!(tiles.len() <= 12);
    }

    #[test]
    fn test_visible_tiles_at_world_zoom() {
        let vp = Viewport::new(0.0, 0.0, 0.0, 400, 400);
        assert_eq!(visible_tiles(&vp), vec![TileId { z: 0, x: 0, y: 0 }]);
    }

    #[test]
    fn test_offline_layer_samples_inserted_tiles() {
        let mut layer = TileLayer::offline(Arc::new(UrlTemplateSource::openstreetmap()));
        assert!(!layer.is_online());
        assert_eq!(layer.sample(0.0, 0.0, 0), None);

        let image = RgbImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgb([10, 20, 30]));
        layer.insert(TileId { z: 0, x: 0, y: 0 }, image);
        assert_eq!(layer.sample(0.0, 0.0, 0), Some((10, 20, 30)));

        let vp = Viewport::new(0.0, 0.0, 0.0, 10, 10);
        layer.request_visible(&vp);
        assert_eq!(layer.pending_count(), 0);
        assert!(!layer.poll());
    }
}
