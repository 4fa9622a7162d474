use crate::braille::{BrailleCanvas, Rgb};
use crate::map::geometry::{clip_segment, draw_disc, draw_line, draw_ring};
use crate::map::projection::{Viewport, PX_PER_DOT};
use crate::map::tiles::{tile_zoom, TileLayer};
use crate::map::MapComposition;
use crate::trail::LineLayer;

/// Trail stroke color
pub const TRAIL_COLOR: Rgb = (51, 153, 204);

/// Composite target where no tile is loaded
const BLANK: Rgb = (0, 0, 0);

/// Dots kept around the view when clipping trail segments
const CLIP_MARGIN: f64 = 2.0;

/// One rasterized frame of the map, in character cells
pub struct MapLayers {
    pub width: usize,
    pub height: usize,
    /// Base map color per cell, row-major
    pub background: Vec<Option<Rgb>>,
    pub markers: BrailleCanvas,
    pub trail: BrailleCanvas,
}

impl MapLayers {
    pub fn background_at(&self, col: usize, row: usize) -> Option<Rgb> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.background[row * self.width + col]
    }
}

/// Rasterize every layer of the map for a `width` x `height` cell area.
/// The view's dot size must already match the area.
pub fn render(map: &MapComposition, width: usize, height: usize) -> MapLayers {
    let view = &map.view;
    let background = render_background(&map.base, view, width, height);

    let mut layers = MapLayers {
        width,
        height,
        background,
        markers: BrailleCanvas::new(width, height),
        trail: BrailleCanvas::new(width, height),
    };

    render_markers(map, &mut layers);
    if let Some(line) = map.trail_layer() {
        draw_linestring(&mut layers.trail, line, view);
    }

    layers
}

/// Sample the base layer at the middle dot of every cell
fn render_background(base: &TileLayer, view: &Viewport, width: usize, height: usize) -> Vec<Option<Rgb>> {
    let z = tile_zoom(view.zoom);
    let mut cells = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let (x, y) = view.unproject(col as i32 * 2 + 1, row as i32 * 4 + 2);
            cells.push(base.sample(x, y, z));
        }
    }
    cells
}

/// Style length in CSS pixels -> whole dots, at least one
#[inline(always)]
fn to_dots(px: u32) -> i32 {
    ((px as f64 / PX_PER_DOT).round() as i32).max(1)
}

fn render_markers(map: &MapComposition, layers: &mut MapLayers) {
    let view = &map.view;
    for feature in map.markers.features() {
        let (x, y) = feature.position.to_mercator();
        let (px, py) = view.project(x, y);

        let style = map.markers.style_of(feature);
        let radius = to_dots(style.radius);
        let stroke = to_dots(style.stroke_width);
        if !view.is_visible(px, py, radius + stroke) {
            continue;
        }

        let under = layers
            .background_at((px.max(0) / 2) as usize, (py.max(0) / 4) as usize)
            .unwrap_or(BLANK);
        draw_disc(&mut layers.markers, px, py, radius, style.fill.over(under));
        draw_ring(&mut layers.markers, px, py, radius, stroke, style.stroke.over(under));
    }
}

/// Draw a linestring, each segment clipped to the view plus a margin
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineLayer, view: &Viewport) {
    if line.coordinates.len() < 2 {
        return;
    }

    let min = (-CLIP_MARGIN, -CLIP_MARGIN);
    let max = (view.width as f64 + CLIP_MARGIN, view.height as f64 + CLIP_MARGIN);

    for pair in line.coordinates.windows(2) {
        let from = view.project_exact(pair[0].0, pair[0].1);
        let to = view.project_exact(pair[1].0, pair[1].1);
        if let Some((a, b)) = clip_segment(from, to, min, max) {
            draw_line(
                canvas,
                a.0.floor() as i32,
                a.1.floor() as i32,
                b.0.floor() as i32,
                b.1.floor() as i32,
                TRAIL_COLOR,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Feature;
    use crate::geo::LonLat;
    use crate::map::tests::offline_map;
    use crate::map::tiles::{TileId, TILE_SIZE};
    use crate::trail::{redraw, Trail};
    use image::{Rgb as Pixel, RgbImage};

    #[test]
    fn test_empty_map_renders_nothing() {
        let map = offline_map();
        let layers = render(&map, 100, 30);
        assert_eq!(layers.markers.inked_cells(), 0);
        assert_eq!(layers.trail.inked_cells(), 0);
        assert!(layers.background.iter().all(Option::is_none));
    }

    #[test]
    fn test_marker_is_drawn_at_feature() {
        let mut map = offline_map();
        let c = map.view.unproject_lonlat(100, 60);
        map.markers
            .set_features(vec![Feature::new("A 1 0001: x", c, None)]);
        let layers = render(&map, 100, 30);
        assert!(layers.markers.cell(50, 15).is_some());
        assert!(layers.markers.cell(0, 0).is_none());
    }

    #[test]
    fn test_trail_drawn_only_with_two_points() {
        let mut map = offline_map();
        let c = map.view.unproject_lonlat(100, 60);
        let mut trail = Trail::new();
        trail.push(c);
        redraw(&mut map, &trail);
        assert_eq!(render(&map, 100, 30).trail.inked_cells(), 0);

        trail.push(LonLat::new(c.lon + 0.05, c.lat));
        redraw(&mut map, &trail);
        let layers = render(&map, 100, 30);
        assert!(layers.trail.inked_cells() > 1);
        assert_eq!(layers.trail.cell(50, 15).map(|(_, color)| color), Some(TRAIL_COLOR));
    }

    #[test]
    fn test_long_segment_is_clipped_at_max_zoom() {
        let mut map = offline_map();
        map.view.zoom = 19.0;
        let c = map.view.unproject_lonlat(100, 60);

        // Millions of dots long at this zoom; only the visible part is drawn
        let mut trail = Trail::new();
        trail.push(LonLat::new(c.lon - 60.0, c.lat));
        trail.push(LonLat::new(c.lon + 60.0, c.lat));
        redraw(&mut map, &trail);

        let layers = render(&map, 100, 30);
        assert_eq!(layers.trail.inked_cells(), 100);
        assert!(layers.trail.cell(0, 15).is_some());
        assert!(layers.trail.cell(99, 15).is_some());
    }

    #[test]
    fn test_background_comes_from_loaded_tiles() {
        let mut map = offline_map();
        map.view.zoom = 0.0;
        map.view.center_x = 0.0;
        map.view.center_y = 0.0;
        let image = RgbImage::from_pixel(TILE_SIZE, TILE_SIZE, Pixel([200, 220, 240]));
        map.base.insert(TileId { z: 0, x: 0, y: 0 }, image);

        let layers = render(&map, 100, 30);
        assert_eq!(layers.background_at(50, 15), Some((200, 220, 240)));
    }
}
