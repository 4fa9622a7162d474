//! Map composition: base tile layer, styled marker layer, the trail line
//! layer and the view they are rendered through.

mod geometry;
mod projection;
mod renderer;
mod spatial;
pub mod style;
pub mod tiles;

pub use projection::{Viewport, PX_PER_DOT};
pub use renderer::{render, MapLayers, TRAIL_COLOR};
pub use spatial::SpatialGrid;

use crate::config::Config;
use crate::data::Feature;
use crate::trail::LineLayer;
use std::sync::Arc;
use style::{MarkerStyle, StyleFn, MARKER_RADIUS, STROKE_WIDTH};
use tiles::{TileLayer, UrlTemplateSource};

/// Spatial index cell size in meters
const INDEX_CELL_SIZE: f64 = 2000.0;

/// Point features drawn as styled circle markers
pub struct VectorLayer {
    features: Vec<Feature>,
    index: SpatialGrid,
    style: StyleFn,
}

impl VectorLayer {
    pub fn new(style: StyleFn) -> Self {
        Self {
            features: Vec::new(),
            index: SpatialGrid::new(INDEX_CELL_SIZE),
            style,
        }
    }

    /// Replace the layer's features, keeping their order as draw order
    pub fn set_features(&mut self, features: Vec<Feature>) {
        self.index.clear();
        for feature in &features {
            let (x, y) = feature.position.to_mercator();
            self.index.insert(x, y);
        }
        self.features = features;
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn style_of(&self, feature: &Feature) -> MarkerStyle {
        (self.style)(feature)
    }

    /// Topmost feature whose marker covers an EPSG:3857 point
    fn hit(&self, x: f64, y: f64, resolution: f64) -> Option<&Feature> {
        let reach = (MARKER_RADIUS as f64 + STROKE_WIDTH as f64 / 2.0) * resolution;
        self.index
            .topmost_within(x, y, reach)
            .and_then(|idx| self.features.get(idx))
    }
}

/// Map controls on top of pan/zoom
#[derive(Clone, Debug)]
pub struct Controls {
    /// Side pane and status bar hidden
    pub fullscreen: bool,
    pub attribution: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            fullscreen: false,
            attribution: true,
        }
    }
}

/// Everything rendered into the map container
pub struct MapComposition {
    pub view: Viewport,
    pub base: TileLayer,
    pub markers: VectorLayer,
    pub controls: Controls,
    trail_layer: Option<LineLayer>,
}

impl MapComposition {
    /// Assemble the layers and view described by `config` for a canvas of
    /// `width` x `height` dots
    pub fn compose(config: &Config, width: usize, height: usize) -> Self {
        let source = Arc::new(UrlTemplateSource::new(&config.tile_template, &config.attribution));
        let base = if config.offline {
            TileLayer::offline(source)
        } else {
            TileLayer::new(source)
        };

        Self {
            view: Viewport::new(config.center.0, config.center.1, config.zoom, width, height),
            base,
            markers: VectorLayer::new(style::feature_style),
            controls: Controls::default(),
            trail_layer: None,
        }
    }

    /// Detach the current trail layer (if any) and attach `layer`
    pub fn replace_trail_layer(&mut self, layer: LineLayer) {
        self.trail_layer = Some(layer);
    }

    pub fn trail_layer(&self) -> Option<&LineLayer> {
        self.trail_layer.as_ref()
    }

    pub fn trail_layer_count(&self) -> usize {
        usize::from(self.trail_layer.is_some())
    }

    /// Topmost marker under a dot position
    pub fn feature_at_pixel(&self, px: i32, py: i32) -> Option<&Feature> {
        let (x, y) = self.view.unproject(px, py);
        self.markers.hit(x, y, self.view.resolution())
    }

    pub fn toggle_fullscreen(&mut self) {
        self.controls.fullscreen = !self.controls.fullscreen;
    }

    pub fn attribution(&self) -> Option<&str> {
        self.controls.attribution.then(|| self.base.attribution())
    }
}
