//! Streaming KML reader for point placemarks.
//!
//! Only `<name>`, `<description>` and the first `<Point><coordinates>` tuple
//! of each `<Placemark>` are read. Embedded `<Style>` elements are ignored;
//! the marker layer styles every feature itself.

use quick_xml::events::Event;
use quick_xml::Reader;

use super::Feature;
use crate::geo::LonLat;

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Name,
    Description,
    Coordinates,
}

#[derive(Default)]
struct Pending {
    depth: usize,
    name: String,
    description: String,
    coordinates: String,
    in_point: bool,
}

/// Parse every point placemark in a KML document, in document order
pub fn parse_placemarks(xml: &str) -> Result<Vec<Feature>, quick_xml::Error> {
    // Names are decoded by character offset, so their text stays untrimmed
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut features = Vec::new();
    let mut depth = 0usize;
    let mut placemark: Option<Pending> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                let local = e.local_name();
                if placemark.is_none() {
                    if local.as_ref() == b"Placemark" {
                        placemark = Some(Pending {
                            depth,
                            ..Pending::default()
                        });
                    }
                } else if let Some(p) = placemark.as_mut() {
                    let direct_child = depth == p.depth + 1;
                    match local.as_ref() {
                        b"name" if direct_child => field = Some(Field::Name),
                        b"description" if direct_child => field = Some(Field::Description),
                        b"Point" => p.in_point = true,
                        b"coordinates" if p.in_point && p.coordinates.is_empty() => {
                            field = Some(Field::Coordinates)
                        }
                        _ => {}
                    }
                }
            }
            Event::End(e) => {
                let local = e.local_name();
                match local.as_ref() {
                    b"Placemark" => {
                        if let Some(p) = placemark.take() {
                            if let Some(feature) = finish(p) {
                                features.push(feature);
                            }
                        }
                    }
                    b"Point" => {
                        if let Some(p) = placemark.as_mut() {
                            p.in_point = false;
                        }
                    }
                    b"name" | b"description" | b"coordinates" => field = None,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(t) => {
                if let (Some(f), Some(p)) = (field, placemark.as_mut()) {
                    push_text(p, f, &t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let (Some(f), Some(p)) = (field, placemark.as_mut()) {
                    push_text(p, f, &String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(features)
}

fn push_text(p: &mut Pending, field: Field, text: &str) {
    let target = match field {
        Field::Name => &mut p.name,
        Field::Description => &mut p.description,
        Field::Coordinates => &mut p.coordinates,
    };
    target.push_str(text);
}

fn finish(p: Pending) -> Option<Feature> {
    let position = parse_coordinates(&p.coordinates)?;
    let description = if p.description.is_empty() {
        None
    } else {
        Some(p.description)
    };
    Some(Feature::new(&p.name, position, description))
}

/// First `lon,lat[,alt]` tuple of a KML coordinates string
fn parse_coordinates(text: &str) -> Option<LonLat> {
    let tuple = text.split_whitespace().next()?;
    let mut parts = tuple.split(',');
    let lon = parts.next()?.trim().parse::<f64>().ok()?;
    let lat = parts.next()?.trim().parse::<f64>().ok()?;
    Some(LonLat::new(lon, lat))
}
