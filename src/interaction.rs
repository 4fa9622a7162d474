//! Pointer and button handling over the session state.
//!
//! Every input is turned into a [`MapEvent`] and applied with
//! [`Session::dispatch`], which mutates the session and the map's trail
//! layer and reports anything the host has to carry out as an [`Outcome`].

use crate::geo::{js_number, LonLat};
use crate::grid::GridRef;
use crate::map::{MapComposition, PX_PER_DOT};
use crate::trail::{export_text, redraw, Trail};
use std::collections::BTreeSet;
use tracing::debug;

/// Class of the panel shown before any feature was clicked
pub const DEFAULT_PANEL: &str = "default";

/// Tooltip offset above the pointer, in CSS pixels
const TOOLTIP_LIFT_PX: f64 = 15.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    StartDrawing,
    StopDrawing,
    Undo,
    Clear,
    ShowPoints,
}

/// Inputs, positioned in map dots
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapEvent {
    PointerMove { px: i32, py: i32, dragging: bool },
    Click { px: i32, py: i32 },
    Button(ButtonAction),
}

/// Work left to the host after an event
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Nothing,
    /// Save this text as the route file
    Export { text: String, points: usize },
}

/// Which detail panel was shown last
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum InfoSelector {
    #[default]
    Default,
    Id(String),
}

impl InfoSelector {
    pub fn class(&self) -> &str {
        match self {
            InfoSelector::Default => DEFAULT_PANEL,
            InfoSelector::Id(id) => id,
        }
    }
}

/// Visibility of detail panels, keyed by class
#[derive(Clone, Debug, PartialEq)]
pub struct DetailPanels {
    visible: BTreeSet<String>,
}

impl Default for DetailPanels {
    fn default() -> Self {
        Self {
            visible: BTreeSet::from([DEFAULT_PANEL.to_string()]),
        }
    }
}

impl DetailPanels {
    pub fn hide(&mut self, class: &str) {
        self.visible.remove(class);
    }

    pub fn show(&mut self, class: &str) {
        self.visible.insert(class.to_string());
    }

    pub fn is_visible(&self, class: &str) -> bool {
        self.visible.contains(class)
    }

    pub fn visible(&self) -> impl Iterator<Item = &str> {
        self.visible.iter().map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
    pub px: i32,
    pub py: i32,
    pub title: String,
}

/// Coordinate readouts of the last click; empty until the first one
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Readouts {
    pub lon: String,
    pub lat: String,
    pub easting: String,
    pub northing: String,
}

/// All mutable state of one map session
#[derive(Debug, Default)]
pub struct Session {
    pub trail: Trail,
    pub drawing: bool,
    pub current_info: InfoSelector,
    pub panels: DetailPanels,
    pub tooltip: Option<Tooltip>,
    pub readouts: Readouts,
    pub route_label: String,
    /// Free-text command line; recorded with each click, not interpreted
    pub command: String,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, map: &mut MapComposition, event: MapEvent) -> Outcome {
        match event {
            MapEvent::PointerMove { px, py, dragging } => {
                self.on_pointer_move(map, px, py, dragging);
                Outcome::Nothing
            }
            MapEvent::Click { px, py } => {
                self.on_click(map, px, py);
                Outcome::Nothing
            }
            MapEvent::Button(action) => self.on_button(map, action),
        }
    }

    fn on_pointer_move(&mut self, map: &MapComposition, px: i32, py: i32, dragging: bool) {
        if dragging {
            self.tooltip = None;
            return;
        }

        self.tooltip = map.feature_at_pixel(px, py).map(|feature| Tooltip {
            px,
            py: py - (TOOLTIP_LIFT_PX / PX_PER_DOT).round() as i32,
            title: feature.name.label.clone(),
        });
    }

    fn on_click(&mut self, map: &mut MapComposition, px: i32, py: i32) {
        if let Some(feature) = map.feature_at_pixel(px, py) {
            let id = feature.name.id.clone();
            self.panels.hide(self.current_info.class());
            self.panels.show(&id);
            debug!(hidden = self.current_info.class(), shown = %id, "detail panel switched");
            self.current_info = InfoSelector::Id(id);
        }

        let position = map.view.unproject_lonlat(px, py);
        self.update_readouts(position);
        debug!(lon = position.lon, lat = position.lat, command = %self.command, "map clicked");

        if self.drawing {
            self.trail.push(position);
            redraw(map, &self.trail);
        }
    }

    fn update_readouts(&mut self, position: LonLat) {
        let grid = GridRef::from_lonlat(position);
        self.readouts = Readouts {
            lon: js_number(position.lon),
            lat: js_number(position.lat),
            easting: grid.easting_text(),
            northing: grid.northing_text(),
        };
    }

    fn on_button(&mut self, map: &mut MapComposition, action: ButtonAction) -> Outcome {
        debug!(?action, "button");
        match action {
            ButtonAction::StartDrawing => self.drawing = true,
            ButtonAction::StopDrawing => self.drawing = false,
            ButtonAction::Undo => {
                self.trail.pop();
                redraw(map, &self.trail);
            }
            ButtonAction::Clear => {
                self.trail.clear();
                redraw(map, &self.trail);
                self.route_label.clear();
            }
            ButtonAction::ShowPoints => {
                return Outcome::Export {
                    text: export_text(&self.trail),
                    points: self.trail.len(),
                };
            }
        }
        Outcome::Nothing
    }
}
