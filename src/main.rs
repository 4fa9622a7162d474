use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::time::Duration;
use trailmap::app::App;
use trailmap::config::{Cli, Config};
use trailmap::interaction::ButtonAction;
use trailmap::{logging, ui};

fn main() -> Result<()> {
    let config = Config::from(Cli::parse());
    logging::init(&config)?;
    tracing::info!(?config, "starting");

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, config);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        tracing::error!(error = %e, "exiting with error");
    }
    result
}

/// Handle mouse events for hovering, clicking, panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Moved => app.pointer_moved(mouse.column, mouse.row),
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Press/release without movement is a click; with movement a drag
        MouseEventKind::Down(MouseButton::Left) => app.press_at(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.release_at(mouse.column, mouse.row),
        _ => {}
    }
}

/// Keystrokes while the command line is open
fn handle_command_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => app.command_mode = false,
        KeyCode::Backspace => {
            app.session.command.pop();
        }
        KeyCode::Char(c) => app.session.command.push(c),
        _ => {}
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -8),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 8),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        // Trail buttons
        KeyCode::Char('s') => app.press(ButtonAction::StartDrawing),
        KeyCode::Char('x') => app.press(ButtonAction::StopDrawing),
        KeyCode::Char('u') => app.press(ButtonAction::Undo),
        KeyCode::Char('c') => app.press(ButtonAction::Clear),
        KeyCode::Char('p') => app.press(ButtonAction::ShowPoints),

        KeyCode::Char('f') => app.toggle_fullscreen(),
        KeyCode::Char(':') => app.command_mode = true,
        KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, config: Config) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(config, size.width, size.height);
    app.load_features();

    // Main loop
    loop {
        // Collect loaded features and tiles before drawing
        app.tick();

        terminal.draw(|frame| ui::render_app(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.command_mode {
                        handle_command_key(&mut app, key);
                    } else {
                        handle_key(&mut app, key);
                    }
                }
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
