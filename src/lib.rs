//! Interactive terminal map: a raster tile base layer, point markers from
//! a KML or GeoJSON document, hand-drawn trails with undo/clear/export, and
//! local grid readouts for clicked coordinates.

pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod geo;
pub mod grid;
pub mod interaction;
pub mod logging;
pub mod map;
pub mod trail;
pub mod ui;
