use crate::app::App;
use crate::braille::{BrailleCanvas, Rgb};
use crate::data::Feature;
use crate::interaction::{Session, DEFAULT_PANEL};
use crate::map::{render, MapLayers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};

/// Width of the readout/detail pane
const SIDE_WIDTH: u16 = 38;

struct Areas {
    map: Rect,
    side: Option<Rect>,
    status: Option<Rect>,
}

fn split(area: Rect, fullscreen: bool) -> Areas {
    if fullscreen {
        return Areas {
            map: area,
            side: None,
            status: None,
        };
    }

    // Split into main area and status bar
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(SIDE_WIDTH)])
        .split(rows[0]);

    Areas {
        map: cols[0],
        side: Some(cols[1]),
        status: Some(rows[1]),
    }
}

fn map_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

/// Inner (drawable) area of the map for a terminal area
pub fn map_area(area: Rect, fullscreen: bool) -> Rect {
    map_block().inner(split(area, fullscreen).map)
}

/// Render the UI
pub fn render_app(frame: &mut Frame, app: &App) {
    let areas = split(frame.area(), app.map.controls.fullscreen);

    render_map(frame, app, areas.map);
    if let Some(side) = areas.side {
        render_side(frame, app, side);
    }
    if let Some(status) = areas.status {
        if app.command_mode {
            render_command_line(frame, &app.session, status);
        } else {
            render_status_bar(frame, app, status);
        }
    }
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let mut block = map_block().title(Span::styled(
        " Trail Map ",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ));
    if let Some(attribution) = app.map.attribution() {
        block = block.title_bottom(Line::from(format!(" {} ", attribution)).right_aligned());
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Tooltip position in cells, lifted above the pointer
    let tooltip = app.session.tooltip.as_ref().map(|t| {
        let col = (t.px.max(0) / 2) as u16;
        let row = (t.py.max(0) / 4) as u16;
        (col, row, t.title.clone())
    });

    let map_widget = MapWidget {
        layers: render(&app.map, inner.width as usize, inner.height as usize),
        tooltip,
    };
    frame.render_widget(map_widget, inner);
}

/// Custom widget that renders the tile background, markers, the trail and
/// the tooltip
struct MapWidget {
    layers: MapLayers,
    tooltip: Option<(u16, u16, String)>,
}

fn rgb(color: Rgb) -> Color {
    Color::Rgb(color.0, color.1, color.2)
}

impl MapWidget {
    /// Render a braille canvas layer using each cell's own color
    fn render_layer(&self, canvas: &BrailleCanvas, area: Rect, buf: &mut Buffer) {
        for row in 0..canvas.height().min(area.height as usize) {
            for col in 0..canvas.width().min(area.width as usize) {
                if let Some((ch, color)) = canvas.cell(col, row) {
                    let cell = &mut buf[(area.x + col as u16, area.y + row as u16)];
                    cell.set_char(ch).set_fg(rgb(color));
                }
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // 1. Base tiles as cell backgrounds
        for row in 0..self.layers.height.min(area.height as usize) {
            for col in 0..self.layers.width.min(area.width as usize) {
                if let Some(color) = self.layers.background_at(col, row) {
                    buf[(area.x + col as u16, area.y + row as u16)].set_bg(rgb(color));
                }
            }
        }

        // 2. Markers, 3. trail on top
        self.render_layer(&self.layers.markers, area, buf);
        self.render_layer(&self.layers.trail, area, buf);

        // 4. Tooltip
        if let Some((col, row, title)) = &self.tooltip {
            if title.is_empty() || *row >= area.height {
                return;
            }
            let text = format!(" {} ", title);
            let width = text.chars().count() as u16;
            let x = area.x + (*col).min(area.width.saturating_sub(width));
            let max_width = (area.right().saturating_sub(x)) as usize;
            buf.set_stringn(
                x,
                area.y + *row,
                &text,
                max_width,
                Style::default().fg(Color::White).bg(Color::Black),
            );
        }
    }
}

fn render_side(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(3)])
        .split(area);

    render_readouts(frame, &app.session, chunks[0]);
    render_panels(frame, app, chunks[1]);
}

fn readout_line(name: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<10}", name), Style::default().fg(Color::DarkGray)),
        Span::styled(value.to_string(), Style::default().fg(Color::Yellow)),
    ])
}

fn render_readouts(frame: &mut Frame, session: &Session, area: Rect) {
    let readouts = &session.readouts;
    let lines = vec![
        readout_line("Longitude", &readouts.lon),
        readout_line("Latitude", &readouts.lat),
        readout_line("Easting", &readouts.easting),
        readout_line("Northing", &readouts.northing),
        Line::from(""),
        readout_line("Route", &session.route_label),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Position ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn help_lines() -> Vec<Line<'static>> {
    [
        "Click a marker to see its details.",
        "",
        "s  start drawing    x  stop drawing",
        "u  undo point       c  clear trail",
        "p  save route.txt   f  fullscreen",
        ":  command line     r  reset view",
        "hjkl/arrows pan, +/- or wheel zoom",
    ]
    .into_iter()
    .map(Line::from)
    .collect()
}

fn feature_lines(feature: &Feature) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            feature.name.label.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("{}", feature.position),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    if let Some(description) = &feature.description {
        lines.extend(description.lines().map(|l| Line::from(l.to_string())));
    }
    lines.push(Line::from(""));
    lines
}

fn render_panels(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();
    for class in app.session.panels.visible() {
        if class == DEFAULT_PANEL {
            lines.extend(help_lines());
            continue;
        }
        for feature in app.map.markers.features().iter().filter(|f| f.name.id == class) {
            lines.extend(feature_lines(feature));
        }
    }

    let title = if app.is_loading() {
        " Details (loading…) ".to_string()
    } else {
        format!(" Details ({} places) ", app.map.markers.features().len())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_command_line(frame: &mut Frame, session: &Session, area: Rect) {
    let line = Line::from(vec![
        Span::styled(":", Style::default().fg(Color::Yellow)),
        Span::raw(session.command.clone()),
        Span::styled("█", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let session = &app.session;
    let (mode, mode_color) = if session.drawing {
        ("[DRAWING]", Color::Green)
    } else {
        ("[viewing]", Color::DarkGray)
    };

    let mut spans = vec![
        Span::styled(format!(" {} ", mode), Style::default().fg(mode_color)),
        Span::styled(format!("{} pts ", session.trail.len()), Style::default().fg(Color::Cyan)),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
    ];
    let pending = app.map.base.pending_count();
    if pending > 0 {
        spans.push(Span::styled(
            format!(" | {} tiles loading", pending),
            Style::default().fg(Color::Magenta),
        ));
    }
    spans.push(Span::styled(
        " | s/x:draw u:undo c:clear p:save q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_area_leaves_room_for_side_pane() {
        let area = Rect::new(0, 0, 120, 40);
        let inner = map_area(area, false);
        assert_eq!(inner.x, 1);
        assert_eq!(inner.y, 1);
        assert_eq!(inner.width, 120 - SIDE_WIDTH - 2);
        assert_eq!(inner.height, 40 - 1 - 2);
    }

    #[test]
    fn test_fullscreen_map_area() {
        let inner = map_area(Rect::new(0, 0, 120, 40), true);
        assert_eq!((inner.width, inner.height), (118, 38));
    }

    #[test]
    fn test_help_panel_mentions_keys() {
        let text: String = help_lines()
            .iter()
            .flat_map(|l| l.spans.iter().map(|s| s.content.to_string()))
            .collect();
        assert!(text.contains("start drawing"));
        assert!(text.contains("route.txt"));
    }
}
