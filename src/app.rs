use crate::config::Config;
use crate::data::{self, Feature};
use crate::interaction::{ButtonAction, MapEvent, Outcome, Session};
use crate::map::{tiles::tile_zoom, MapComposition};
use crate::trail::{self, redraw};
use crate::ui;
use ratatui::layout::Rect;
use std::sync::mpsc::Receiver;
use tracing::{info, warn};

/// Application state
pub struct App {
    pub config: Config,
    pub map: MapComposition,
    pub session: Session,
    pub should_quit: bool,
    /// Command line is capturing keystrokes
    pub command_mode: bool,
    /// Terminal size in cells
    size: (u16, u16),
    /// Pending feature load, until its single batch arrives
    loader: Option<Receiver<Vec<Feature>>>,
    /// Last mouse position for drag tracking
    last_mouse: Option<(u16, u16)>,
    /// Left button moved since it went down
    dragged: bool,
}

impl App {
    pub fn new(config: Config, width: u16, height: u16) -> Self {
        let inner = ui::map_area(Rect::new(0, 0, width, height), false);
        let mut map = MapComposition::compose(
            &config,
            inner.width as usize * 2,
            inner.height as usize * 4,
        );
        let session = Session::new();
        // The trail layer exists from the first frame, empty
        redraw(&mut map, &session.trail);

        Self {
            config,
            map,
            session,
            should_quit: false,
            command_mode: false,
            size: (width, height),
            loader: None,
            last_mouse: None,
            dragged: false,
        }
    }

    /// Start loading the marker layer in the background
    pub fn load_features(&mut self) {
        info!(source = ?self.config.features, "loading features");
        self.loader = Some(data::spawn_loader(self.config.features.clone()));
    }

    /// Inner map area for the current terminal size and control state
    pub fn map_area(&self) -> Rect {
        ui::map_area(
            Rect::new(0, 0, self.size.0, self.size.1),
            self.map.controls.fullscreen,
        )
    }

    /// Update viewport size when the terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.size = (width, height);
        self.sync_view_size();
    }

    fn sync_view_size(&mut self) {
        let inner = self.map_area();
        self.map.view.width = inner.width as usize * 2;
        self.map.view.height = inner.height as usize * 4;
    }

    /// Collect background work and queue tile fetches for the current view
    pub fn tick(&mut self) {
        if let Some(rx) = &self.loader {
            if let Ok(features) = rx.try_recv() {
                self.map.markers.set_features(features);
                self.loader = None;
            }
        }
        self.map.base.poll();
        self.map.base.request_visible(&self.map.view);
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_some()
    }

    /// Terminal cell -> map dot, `None` outside the map area
    fn to_dots(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let inner = self.map_area();
        if col < inner.x || row < inner.y || col >= inner.right() || row >= inner.bottom() {
            return None;
        }
        // Middle dot of the cell
        let px = (col - inner.x) as i32 * 2 + 1;
        let py = (row - inner.y) as i32 * 4 + 2;
        Some((px, py))
    }

    /// Apply an event to the session and carry out its outcome
    pub fn dispatch(&mut self, event: MapEvent) {
        match self.session.dispatch(&mut self.map, event) {
            Outcome::Nothing => {}
            Outcome::Export { text, points } => self.export(&text, points),
        }
    }

    pub fn press(&mut self, action: ButtonAction) {
        self.dispatch(MapEvent::Button(action));
    }

    fn export(&mut self, text: &str, points: usize) {
        self.session.route_label = match trail::export_to(text, &self.config.export_dir) {
            Ok(path) => format!("saved {} points to {}", points, path.display()),
            Err(e) => {
                warn!(error = %e, "route export failed");
                format!("export failed: {}", e)
            }
        };
    }

    pub fn pointer_moved(&mut self, col: u16, row: u16) {
        match self.to_dots(col, row) {
            Some((px, py)) => self.dispatch(MapEvent::PointerMove {
                px,
                py,
                dragging: false,
            }),
            None => self.session.tooltip = None,
        }
    }

    /// Left button down: start tracking a possible click or drag
    pub fn press_at(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Left button drag pans the map
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_col, last_row)) = self.last_mouse {
            let dx = (last_col as i32 - col as i32) * 2;
            let dy = (last_row as i32 - row as i32) * 4;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                self.map.view.pan(dx, dy);
            }
        }
        self.last_mouse = Some((col, row));
        if let Some((px, py)) = self.to_dots(col, row) {
            self.dispatch(MapEvent::PointerMove {
                px,
                py,
                dragging: true,
            });
        }
    }

    /// Left button up: a click unless the pointer dragged
    pub fn release_at(&mut self, col: u16, row: u16) {
        let was_press = self.last_mouse.is_some();
        let dragged = self.dragged;
        self.end_drag();
        if was_press && !dragged {
            if let Some((px, py)) = self.to_dots(col, row) {
                self.dispatch(MapEvent::Click { px, py });
            }
        }
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
        self.dragged = false;
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.map.view.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.map.view.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.map.view.zoom_out();
    }

    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        match self.to_dots(col, row) {
            Some((px, py)) => self.map.view.zoom_in_at(px, py),
            None => self.zoom_in(),
        }
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        match self.to_dots(col, row) {
            Some((px, py)) => self.map.view.zoom_out_at(px, py),
            None => self.zoom_out(),
        }
    }

    /// Back to the configured center and zoom
    pub fn reset_view(&mut self) {
        self.map.view.center_x = self.config.center.0;
        self.map.view.center_y = self.config.center.1;
        self.map.view.zoom = self.config.zoom;
    }

    pub fn toggle_fullscreen(&mut self) {
        self.map.toggle_fullscreen();
        self.sync_view_size();
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("z{:.1} (tiles z{})", self.map.view.zoom, tile_zoom(self.map.view.zoom))
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        let center = self.map.view.center_lonlat();
        format!(
            "{:.4}°{}, {:.4}°{}",
            center.lat.abs(),
            if center.lat >= 0.0 { "N" } else { "S" },
            center.lon.abs(),
            if center.lon >= 0.0 { "E" } else { "W" }
        )
    }
}
